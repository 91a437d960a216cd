//! Sources of absorption cross-sections.

use crate::errors::{TaurexError, TaurexResult};
use ndarray::Array1;
use std::fmt::Debug;
use std::sync::Arc;

/// Cross-sections of a single molecule
///
/// Opacities are serialised with a `type` tag so that they can be declared in
/// model configuration files.
#[typetag::serde(tag = "type")]
pub trait Opacity: Debug + Send + Sync {
    /// Formula of the molecule this opacity describes
    fn molecule_name(&self) -> &str;

    /// Wavenumbers (cm^-1) at which the opacity is natively tabulated
    fn wavenumber_grid(&self) -> &Array1<f64>;

    /// Cross-section (cm^2/molecule) at each wavenumber of `wngrid`
    fn opacity(
        &self,
        temperature: f64,
        pressure: f64,
        wngrid: &Array1<f64>,
    ) -> TaurexResult<Array1<f64>>;
}

/// Build an opacity from a configuration table
///
/// Tables that do not describe a known opacity fail with [`TaurexError::TypeMismatch`].
pub fn opacity_from_config(value: toml::Value) -> TaurexResult<Arc<dyn Opacity>> {
    let opacity: Box<dyn Opacity> = value
        .try_into()
        .map_err(|e: toml::de::Error| TaurexError::TypeMismatch(e.to_string()))?;
    Ok(Arc::from(opacity))
}
