//! Optical depth contributions

mod absorption;

pub use absorption::AbsorptionContribution;
