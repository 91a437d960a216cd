//! Forward models

mod simple;

pub use simple::{AtmosphereParameters, SimpleForwardModel};
