//! Flat cross-section over a wavenumber band.
//!
//! Useful for testing forward models and for grey absorbers.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use taurex_core::errors::{TaurexError, TaurexResult};
use taurex_core::opacity::Opacity;

/// Parameters for [`ConstantOpacity`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantOpacityParameters {
    pub molecule: String,
    /// Cross-section inside the band
    /// unit: cm^2 / molecule
    pub cross_section: f64,
    /// unit: cm^-1
    pub wn_min: f64,
    /// unit: cm^-1
    pub wn_max: f64,
    /// Number of points on the native grid
    pub npoints: usize,
}

/// A molecule with the same cross-section at every wavenumber inside its band
///
/// Outside the band the cross-section is zero. Temperature and pressure are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ConstantOpacityParameters", into = "ConstantOpacityParameters")]
pub struct ConstantOpacity {
    parameters: ConstantOpacityParameters,
    wngrid: Array1<f64>,
}

impl ConstantOpacity {
    pub fn from_parameters(parameters: ConstantOpacityParameters) -> TaurexResult<Self> {
        if parameters.npoints < 2 || parameters.wn_min >= parameters.wn_max {
            return Err(TaurexError::InvalidConfiguration(format!(
                "opacity band for {} needs wn_min < wn_max and at least 2 points",
                parameters.molecule
            )));
        }
        let wngrid = Array1::linspace(parameters.wn_min, parameters.wn_max, parameters.npoints);
        Ok(Self { parameters, wngrid })
    }

    pub fn cross_section(&self) -> f64 {
        self.parameters.cross_section
    }

    fn in_band(&self, wn: f64) -> bool {
        wn >= self.parameters.wn_min && wn <= self.parameters.wn_max
    }
}

impl TryFrom<ConstantOpacityParameters> for ConstantOpacity {
    type Error = TaurexError;

    fn try_from(value: ConstantOpacityParameters) -> Result<Self, Self::Error> {
        Self::from_parameters(value)
    }
}

impl From<ConstantOpacity> for ConstantOpacityParameters {
    fn from(value: ConstantOpacity) -> Self {
        value.parameters
    }
}

#[typetag::serde]
impl Opacity for ConstantOpacity {
    fn molecule_name(&self) -> &str {
        &self.parameters.molecule
    }

    fn wavenumber_grid(&self) -> &Array1<f64> {
        &self.wngrid
    }

    fn opacity(
        &self,
        _temperature: f64,
        _pressure: f64,
        wngrid: &Array1<f64>,
    ) -> TaurexResult<Array1<f64>> {
        Ok(wngrid.mapv(|wn| {
            if self.in_band(wn) {
                self.parameters.cross_section
            } else {
                0.0
            }
        }))
    }
}
