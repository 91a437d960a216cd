//! Core traits for modelling the composition of planetary atmospheres and
//! aggregating it into forward models for spectral retrievals.

pub mod chemistry;
pub mod contribution;
pub mod errors;
pub mod fittable;
pub mod model;
pub mod molecules;
pub mod opacity;
pub mod output;
pub mod profile;

#[cfg(feature = "python")]
pub mod python;
