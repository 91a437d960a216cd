//! Gas profiles and forward-model containers for exoplanet atmospheric retrievals.
//!
//! The crate re-exports the two workspace members. With the `python` feature it
//! also builds the `_lib` extension module.

pub use taurex_components;
pub use taurex_core;

#[cfg(feature = "python")]
mod python;
