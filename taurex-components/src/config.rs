//! Model configuration files.
//!
//! A model is described by a TOML document:
//!
//! ```toml
//! [atmosphere]
//! nlayers = 50
//!
//! [gas_profile]
//! active_gases = ["H2O"]
//! active_gas_mix_ratio = [1e-4]
//! mode = "log"
//!
//! [[opacities]]
//! type = "ConstantOpacity"
//! molecule = "H2O"
//! cross_section = 1e-22
//! wn_min = 1000.0
//! wn_max = 2000.0
//! npoints = 100
//!
//! [[contributions]]
//! type = "AbsorptionContribution"
//!
//! [fitting.log_H2O]
//! fit = true
//! bounds = [-8.0, -2.0]
//! ```
//!
//! Opacities and contributions are resolved by their `type` tag. Fitting overrides
//! are applied once the model has been built.

use crate::models::{AtmosphereParameters, SimpleForwardModel};
use crate::profiles::{TaurexGasProfile, TaurexGasProfileParameters};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use taurex_core::contribution::contribution_from_config;
use taurex_core::errors::TaurexResult;
use taurex_core::fittable::{FitSettings, Fittable};
use taurex_core::model::ForwardModel;
use taurex_core::opacity::opacity_from_config;

fn default_name() -> String {
    "SimpleForwardModel".to_string()
}

/// Everything needed to build a [`SimpleForwardModel`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub atmosphere: AtmosphereParameters,
    pub gas_profile: TaurexGasProfileParameters,
    pub opacities: Vec<toml::Value>,
    pub contributions: Vec<toml::Value>,
    pub fitting: HashMap<String, FitSettings>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            atmosphere: AtmosphereParameters::default(),
            gas_profile: TaurexGasProfileParameters::default(),
            opacities: vec![],
            contributions: vec![],
            fitting: HashMap::new(),
        }
    }
}

impl ModelConfig {
    pub fn from_toml_str(contents: &str) -> TaurexResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> TaurexResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Read model configuration from {}", path.as_ref().display());
        Self::from_toml_str(&contents)
    }

    /// Construct and build the described model
    pub fn build_model(&self) -> TaurexResult<SimpleForwardModel> {
        let profile = TaurexGasProfile::from_parameters(self.gas_profile.clone())?;
        let mut model = SimpleForwardModel::from_atmosphere(&self.name, profile, &self.atmosphere)?;

        for opacity in &self.opacities {
            model.add_opacity(opacity_from_config(opacity.clone())?)?;
        }
        for contribution in &self.contributions {
            model.add_contribution(contribution_from_config(contribution.clone())?)?;
        }

        model.build()?;
        model.apply_fit_settings(&self.fitting)?;
        Ok(model)
    }
}
