//! Contributions turn an atmosphere into optical depths.
//!
//! A forward model evaluates each registered contribution on the same
//! wavenumber grid and sums their optical depths. Keeping the contributions
//! separate allows the model to report a per-source breakdown of the spectrum.

use crate::chemistry::Chemistry;
use crate::errors::{TaurexError, TaurexResult};
use crate::opacity::Opacity;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Opacities keyed by molecule formula
pub type OpacitySet = BTreeMap<String, Arc<dyn Opacity>>;

/// Everything a contribution can read about the atmosphere being modelled
#[derive(Clone, Copy)]
pub struct AtmosphereView<'a> {
    pub chemistry: &'a dyn Chemistry,
    pub temperature: &'a Array1<f64>,
    pub pressure: &'a Array1<f64>,
    pub altitude: &'a Array1<f64>,
    pub opacities: &'a OpacitySet,
}

impl<'a> AtmosphereView<'a> {
    pub fn nlayers(&self) -> usize {
        self.temperature.len()
    }
}

/// A source of optical depth
#[typetag::serde(tag = "type")]
pub trait Contribution: Debug + Send + Sync {
    /// Name used to label this contribution in model output
    fn name(&self) -> &str;

    /// Optical depth with shape `(nlayers, wngrid.len())`
    fn contribute(
        &self,
        atmosphere: &AtmosphereView<'_>,
        wngrid: &Array1<f64>,
    ) -> TaurexResult<Array2<f64>>;
}

/// Build a contribution from a configuration table
///
/// Tables that do not describe a known contribution fail with
/// [`TaurexError::TypeMismatch`].
pub fn contribution_from_config(value: toml::Value) -> TaurexResult<Arc<dyn Contribution>> {
    let contribution: Box<dyn Contribution> = value
        .try_into()
        .map_err(|e: toml::de::Error| TaurexError::TypeMismatch(e.to_string()))?;
    Ok(Arc::from(contribution))
}
