//! Concrete gas profiles, opacities, contributions and forward models.

pub mod config;
pub mod contributions;
pub mod models;
pub mod opacity;
pub mod profiles;

#[cfg(feature = "python")]
pub mod python;
