//! Gas profiles describe the chemical composition of an atmosphere layer by layer.
//!
//! A profile tracks two groups of gases:
//!
//! - *active* gases whose absorption is modelled explicitly, and
//! - *inactive* gases that fill the remainder of the atmosphere.
//!
//! Calling [`GasProfile::initialize`] computes, in order, the active mixing ratios,
//! the inactive mixing ratios (which close the mass balance using the active
//! result) and finally the mean molecular weight of every layer:
//!
//! $$ \mu_j = \sum_i x_{ij} \, w_i $$
//!
//! where $x_{ij}$ is the mixing ratio of gas $i$ in layer $j$ and $w_i$ its molecular weight.

use crate::errors::{TaurexError, TaurexResult};
use crate::fittable::{Fittable, FittingParameters};
use crate::molecules::molecular_weight;
use crate::output::Output;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Space in which fitting parameters are exposed to an optimizer
///
/// Values are always stored linearly; in [`ValueMode::Log`] they are read as
/// `log10(x)` and written back as `10^x`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueMode {
    #[default]
    Linear,
    Log,
}

impl ValueMode {
    /// Convert a stored (linear) value into the exposed space
    pub fn readable_value(&self, value: f64) -> f64 {
        match self {
            ValueMode::Linear => value,
            ValueMode::Log => value.log10(),
        }
    }

    /// Convert an exposed value back into linear space
    pub fn writeable_value(&self, value: f64) -> f64 {
        match self {
            ValueMode::Linear => value,
            ValueMode::Log => 10f64.powf(value),
        }
    }

    pub fn is_log(&self) -> bool {
        matches!(self, ValueMode::Log)
    }
}

impl FromStr for ValueMode {
    type Err = TaurexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(ValueMode::Linear),
            "log" => Ok(ValueMode::Log),
            _ => Err(TaurexError::InvalidConfiguration(format!(
                "Linear/Log mode must be either 'linear' or 'log', got '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ValueMode {
    type Error = TaurexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueMode> for String {
    fn from(value: ValueMode) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ValueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMode::Linear => write!(f, "linear"),
            ValueMode::Log => write!(f, "log"),
        }
    }
}

/// Layer-resolved composition shared by every gas profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GasProfileState {
    pub name: String,
    pub active_gases: Vec<String>,
    pub inactive_gases: Vec<String>,
    /// Shape `(active_gases.len(), nlayers)`
    pub active_mix_profile: Option<Array2<f64>>,
    /// Shape `(inactive_gases.len(), nlayers)`
    pub inactive_mix_profile: Option<Array2<f64>>,
    pub mu_profile: Option<Array1<f64>>,
    pub mode: ValueMode,
    pub nlayers: usize,
    pub nlevels: usize,
    pub temperature_profile: Option<Array1<f64>>,
    pub pressure_profile: Option<Array1<f64>>,
    pub altitude_profile: Option<Array1<f64>>,
}

impl GasProfileState {
    pub fn new(name: &str, mode: ValueMode) -> Self {
        Self {
            name: name.to_string(),
            mode,
            ..Default::default()
        }
    }

    /// Build a state from a mode string such as `"linear"` or `"LOG"`
    pub fn with_mode_str(name: &str, mode: &str) -> TaurexResult<Self> {
        Ok(Self::new(name, mode.parse()?))
    }

    pub fn is_in_log_mode(&self) -> bool {
        self.mode.is_log()
    }

    pub fn readable_value(&self, value: f64) -> f64 {
        self.mode.readable_value(value)
    }

    pub fn writeable_value(&self, value: f64) -> f64 {
        self.mode.writeable_value(value)
    }

    /// Accumulate the mean molecular weight of each layer from the mixing ratios
    ///
    /// Profiles that have not been computed are skipped. Fails if any gas has no
    /// known molecular weight.
    pub fn compute_mu_profile(&mut self) -> TaurexResult<()> {
        let mut mu = Array1::<f64>::zeros(self.nlayers);

        let groups = [
            (&self.active_gases, &self.active_mix_profile),
            (&self.inactive_gases, &self.inactive_mix_profile),
        ];
        for (gases, profile) in groups {
            if let Some(profile) = profile {
                for (idx, gas) in gases.iter().enumerate() {
                    let weight = molecular_weight(gas)?;
                    mu.scaled_add(weight, &profile.row(idx));
                }
            }
        }

        self.mu_profile = Some(mu);
        Ok(())
    }

    /// Sum of all mixing ratios in every layer
    ///
    /// Equal to one in every layer for a closed profile.
    pub fn total_mix_ratio(&self) -> Option<Array1<f64>> {
        let active = self.active_mix_profile.as_ref()?;
        let inactive = self.inactive_mix_profile.as_ref()?;
        Some(active.sum_axis(ndarray::Axis(0)) + inactive.sum_axis(ndarray::Axis(0)))
    }
}

fn check_layers(name: &str, values: &Array1<f64>, nlayers: usize) -> TaurexResult<()> {
    if values.len() != nlayers {
        return Err(TaurexError::ShapeMismatch {
            name: name.to_string(),
            expected: nlayers,
            got: values.len(),
        });
    }
    Ok(())
}

/// A gas profile computes active and inactive mixing ratios for a layered atmosphere
///
/// Implementers supply the two composition stages. The mean molecular weight stage
/// is shared and lives on [`GasProfileState`]. Read access to the computed profiles
/// goes through the [`Chemistry`](crate::chemistry::Chemistry) capability, which every
/// gas profile provides.
pub trait GasProfile: Fittable {
    fn state(&self) -> &GasProfileState;

    fn state_mut(&mut self) -> &mut GasProfileState;

    /// Fill `active_mix_profile`
    fn compute_active_gas_profile(&mut self) -> TaurexResult<()>;

    /// Fill `inactive_mix_profile`; runs after the active profile is available
    fn compute_inactive_gas_profile(&mut self) -> TaurexResult<()>;

    /// Store the layering and compute active, inactive and mean molecular weight profiles
    fn initialize(
        &mut self,
        nlayers: usize,
        temperature_profile: &Array1<f64>,
        pressure_profile: &Array1<f64>,
        altitude_profile: &Array1<f64>,
    ) -> TaurexResult<()> {
        if nlayers == 0 {
            return Err(TaurexError::InvalidConfiguration(
                "number of layers must be greater than zero".to_string(),
            ));
        }
        check_layers("temperature profile", temperature_profile, nlayers)?;
        check_layers("pressure profile", pressure_profile, nlayers)?;
        check_layers("altitude profile", altitude_profile, nlayers)?;

        {
            let state = self.state_mut();
            log::debug!("Initialising gas profile {} with {} layers", state.name, nlayers);
            state.nlayers = nlayers;
            state.nlevels = nlayers + 1;
            state.temperature_profile = Some(temperature_profile.clone());
            state.pressure_profile = Some(pressure_profile.clone());
            state.altitude_profile = Some(altitude_profile.clone());
        }

        self.compute_active_gas_profile()?;
        self.compute_inactive_gas_profile()?;
        self.state_mut().compute_mu_profile()
    }

    /// Type tag written alongside the profile
    fn profile_type(&self) -> &'static str;

    /// Describe the profile in `output`
    fn write(&self, output: &mut dyn Output) {
        let state = self.state();
        let group = output.create_group("Gas");
        group.write_string("gas_profile_type", self.profile_type());
        group.write_string("mode", &state.mode.to_string());
        group.write_string("active_gases", &state.active_gases.join(","));
        group.write_string("inactive_gases", &state.inactive_gases.join(","));
        if let Some(mu) = &state.mu_profile {
            group.write_array("mu_profile", &mu.to_vec());
        }
        for (gases, profile) in [
            (&state.active_gases, &state.active_mix_profile),
            (&state.inactive_gases, &state.inactive_mix_profile),
        ] {
            if let Some(profile) = profile {
                for (idx, gas) in gases.iter().enumerate() {
                    group.write_array(gas, &profile.row(idx).to_vec());
                }
            }
        }
    }
}

/// A gas profile without a composition law
///
/// Both composition stages fail with [`TaurexError::UnsupportedOperation`].
#[derive(Debug, Clone, Default)]
pub struct NullGasProfile {
    state: GasProfileState,
    params: FittingParameters<NullGasProfile>,
}

impl NullGasProfile {
    pub fn new(name: &str, mode: &str) -> TaurexResult<Self> {
        Ok(Self {
            state: GasProfileState::with_mode_str(name, mode)?,
            params: FittingParameters::new(),
        })
    }
}

impl Fittable for NullGasProfile {
    fn fitting_parameters(&self) -> &FittingParameters<Self> {
        &self.params
    }

    fn fitting_parameters_mut(&mut self) -> &mut FittingParameters<Self> {
        &mut self.params
    }
}

impl GasProfile for NullGasProfile {
    fn state(&self) -> &GasProfileState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut GasProfileState {
        &mut self.state
    }

    fn compute_active_gas_profile(&mut self) -> TaurexResult<()> {
        Err(TaurexError::UnsupportedOperation(format!(
            "{} does not define an active gas profile",
            self.state.name
        )))
    }

    fn compute_inactive_gas_profile(&mut self) -> TaurexResult<()> {
        Err(TaurexError::UnsupportedOperation(format!(
            "{} does not define an inactive gas profile",
            self.state.name
        )))
    }

    fn profile_type(&self) -> &'static str {
        "NullGasProfile"
    }
}
