//! Opacity sources

mod constant;

pub use constant::{ConstantOpacity, ConstantOpacityParameters};
