//! Gas profiles

mod taurex_profile;

pub use taurex_profile::{TaurexGasProfile, TaurexGasProfileParameters, INACTIVE_GASES};
