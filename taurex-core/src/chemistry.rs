//! The chemistry capability consumed by forward models.
//!
//! Forward models never depend on a concrete gas profile. They only need the
//! gas lists, the computed mixing-ratio matrices, the mean molecular weight
//! profile and access to the fitting parameters. Equilibrium-chemistry backends
//! provide the same surface, so either can drive a model.

use crate::errors::TaurexResult;
use crate::output::Output;
use crate::profile::GasProfile;
use ndarray::{Array1, Array2};

/// Layer-resolved atmospheric composition
///
/// The profiles are `None` until [`Chemistry::initialize_chemistry`] has been called.
pub trait Chemistry: Send + Sync {
    fn active_gases(&self) -> &[String];

    fn inactive_gases(&self) -> &[String];

    fn active_gas_mix_profile(&self) -> Option<&Array2<f64>>;

    fn inactive_gas_mix_profile(&self) -> Option<&Array2<f64>>;

    fn mu_profile(&self) -> Option<&Array1<f64>>;

    fn initialize_chemistry(
        &mut self,
        nlayers: usize,
        temperature_profile: &Array1<f64>,
        pressure_profile: &Array1<f64>,
        altitude_profile: &Array1<f64>,
    ) -> TaurexResult<()>;

    fn fitting_parameter_names(&self) -> Vec<String>;

    /// Value of a fitting parameter as seen by an optimizer
    fn parameter_value(&self, name: &str) -> TaurexResult<f64>;

    fn set_parameter_value(&mut self, name: &str, value: f64) -> TaurexResult<()>;

    /// Index of `gas` in the active gas list
    fn active_gas_index(&self, gas: &str) -> Option<usize> {
        self.active_gases().iter().position(|g| g == gas)
    }

    /// Describe the composition in a `"Chemistry"` group of `output`
    fn write_composition(&self, output: &mut dyn Output) {
        let group = output.create_group("Chemistry");
        group.write_string("active_gases", &self.active_gases().join(","));
        group.write_string("inactive_gases", &self.inactive_gases().join(","));
        if let Some(mu) = self.mu_profile() {
            group.write_array("mu_profile", &mu.to_vec());
        }
        for (gases, profile) in [
            (self.active_gases(), self.active_gas_mix_profile()),
            (self.inactive_gases(), self.inactive_gas_mix_profile()),
        ] {
            if let Some(profile) = profile {
                for (idx, gas) in gases.iter().enumerate() {
                    group.write_array(gas, &profile.row(idx).to_vec());
                }
            }
        }
    }
}

impl<P> Chemistry for P
where
    P: GasProfile + Send + Sync,
{
    fn active_gases(&self) -> &[String] {
        &self.state().active_gases
    }

    fn inactive_gases(&self) -> &[String] {
        &self.state().inactive_gases
    }

    fn active_gas_mix_profile(&self) -> Option<&Array2<f64>> {
        self.state().active_mix_profile.as_ref()
    }

    fn inactive_gas_mix_profile(&self) -> Option<&Array2<f64>> {
        self.state().inactive_mix_profile.as_ref()
    }

    fn mu_profile(&self) -> Option<&Array1<f64>> {
        self.state().mu_profile.as_ref()
    }

    fn initialize_chemistry(
        &mut self,
        nlayers: usize,
        temperature_profile: &Array1<f64>,
        pressure_profile: &Array1<f64>,
        altitude_profile: &Array1<f64>,
    ) -> TaurexResult<()> {
        self.initialize(nlayers, temperature_profile, pressure_profile, altitude_profile)
    }

    fn fitting_parameter_names(&self) -> Vec<String> {
        self.fitting_parameters().names()
    }

    fn parameter_value(&self, name: &str) -> TaurexResult<f64> {
        self.get_parameter(name)
    }

    fn set_parameter_value(&mut self, name: &str, value: f64) -> TaurexResult<()> {
        self.set_parameter(name, value)
    }

    fn write_composition(&self, output: &mut dyn Output) {
        self.write(output)
    }
}
