//! Vertically constant gas profile closed by a hydrogen/helium background.
//!
//! Every active gas has a single mixing ratio applied to all layers. Nitrogen is
//! held at a fixed trace ratio and whatever remains is split between molecular
//! hydrogen and helium using a fixed He/H2 ratio $r$:
//!
//! $$ x_{H_2} = \frac{1 - \sum_i x_i - x_{N_2}}{1 + r}, \qquad x_{He} = r \, x_{H_2} $$
//!
//! so that the mixing ratios of every layer sum to one.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use taurex_core::errors::{TaurexError, TaurexResult};
use taurex_core::fittable::{Fittable, FittingParameters};
use taurex_core::molecules::molecule_texlabel;
use taurex_core::profile::{GasProfile, GasProfileState, ValueMode};

/// Background gases, in the row order of the inactive profile
pub const INACTIVE_GASES: [&str; 3] = ["H2", "HE", "N2"];

const H2_INDEX: usize = 0;
const HE_INDEX: usize = 1;
const N2_INDEX: usize = 2;

/// Parameters for [`TaurexGasProfile`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaurexGasProfileParameters {
    /// Gases whose absorption is modelled, in the row order of the active profile
    pub active_gases: Vec<String>,

    /// Mixing ratio of each active gas, applied to every layer
    pub active_gas_mix_ratio: Vec<f64>,

    /// Mixing ratio of nitrogen
    ///
    /// Default: 0.0
    pub n2_mix_ratio: f64,

    /// Ratio of helium to molecular hydrogen
    ///
    /// Default: 0.17647 (solar)
    pub he_h2_ratio: f64,

    /// Space in which fitting parameters are exposed
    ///
    /// Default: linear
    pub mode: ValueMode,
}

impl Default for TaurexGasProfileParameters {
    fn default() -> Self {
        Self {
            active_gases: vec!["H2O".to_string(), "CH4".to_string()],
            active_gas_mix_ratio: vec![1e-5, 1e-6],
            n2_mix_ratio: 0.0,
            he_h2_ratio: 0.17647,
            mode: ValueMode::Linear,
        }
    }
}

/// Constant-with-altitude gas profile with an H2/He/N2 background
#[derive(Debug, Clone)]
pub struct TaurexGasProfile {
    state: GasProfileState,
    params: FittingParameters<TaurexGasProfile>,
    active_gas_mix_ratio: Vec<f64>,
    n2_mix_ratio: f64,
    he_h2_ratio: f64,
}

impl TaurexGasProfile {
    /// Create a profile and register its fitting parameters
    ///
    /// `mode` is matched case-insensitively against `"linear"` and `"log"`.
    pub fn new(
        name: &str,
        active_gases: Vec<String>,
        active_gas_mix_ratio: Vec<f64>,
        n2_mix_ratio: f64,
        he_h2_ratio: f64,
        mode: &str,
    ) -> TaurexResult<Self> {
        Self::with_mode(
            name,
            active_gases,
            active_gas_mix_ratio,
            n2_mix_ratio,
            he_h2_ratio,
            mode.parse()?,
        )
    }

    pub fn from_parameters(parameters: TaurexGasProfileParameters) -> TaurexResult<Self> {
        Self::with_mode(
            "TaurexGasProfile",
            parameters.active_gases,
            parameters.active_gas_mix_ratio,
            parameters.n2_mix_ratio,
            parameters.he_h2_ratio,
            parameters.mode,
        )
    }

    fn with_mode(
        name: &str,
        active_gases: Vec<String>,
        active_gas_mix_ratio: Vec<f64>,
        n2_mix_ratio: f64,
        he_h2_ratio: f64,
        mode: ValueMode,
    ) -> TaurexResult<Self> {
        if active_gases.len() != active_gas_mix_ratio.len() {
            return Err(TaurexError::InvalidConfiguration(format!(
                "{} active gases but {} mixing ratios",
                active_gases.len(),
                active_gas_mix_ratio.len()
            )));
        }

        let mut state = GasProfileState::new(name, mode);
        state.active_gases = active_gases;
        state.inactive_gases = INACTIVE_GASES.iter().map(|g| g.to_string()).collect();

        let mut profile = Self {
            state,
            params: FittingParameters::new(),
            active_gas_mix_ratio,
            n2_mix_ratio,
            he_h2_ratio,
        };
        profile.register_fitting_parameters()?;
        Ok(profile)
    }

    fn register_fitting_parameters(&mut self) -> TaurexResult<()> {
        self.params.add_fittable_param(
            "N2",
            &molecule_texlabel("N2"),
            |p: &Self| p.state.readable_value(p.n2_mix_ratio),
            |p: &mut Self, value| p.n2_mix_ratio = p.state.writeable_value(value),
            false,
            [1e-12, 1.0],
        )?;
        self.params.add_fittable_param(
            "H2_He",
            "H$_2$/He",
            |p: &Self| p.state.readable_value(p.he_h2_ratio),
            |p: &mut Self, value| p.he_h2_ratio = p.state.writeable_value(value),
            false,
            [1e-12, 1.0],
        )?;
        for idx in 0..self.state.active_gases.len() {
            self.add_active_gas_param(idx)?;
        }
        Ok(())
    }

    /// Register the mixing ratio of the active gas at `idx` as a fitting parameter
    fn add_active_gas_param(&mut self, idx: usize) -> TaurexResult<()> {
        let mol_name = &self.state.active_gases[idx];
        let texlabel = molecule_texlabel(mol_name);

        let (param_name, param_tex, bounds) = if self.state.is_in_log_mode() {
            (
                format!("log_{}", mol_name),
                format!("log({})", texlabel),
                [-12.0, -1.0],
            )
        } else {
            (mol_name.clone(), texlabel, [1.0e-12, 0.1])
        };

        // Each closure owns its own copy of `idx`
        self.params.add_fittable_param(
            &param_name,
            &param_tex,
            move |p: &Self| p.state.readable_value(p.active_gas_mix_ratio[idx]),
            move |p: &mut Self, value| {
                p.active_gas_mix_ratio[idx] = p.state.writeable_value(value);
            },
            false,
            bounds,
        )
    }

    pub fn active_gas_mix_ratio(&self) -> &[f64] {
        &self.active_gas_mix_ratio
    }

    pub fn n2_mix_ratio(&self) -> f64 {
        self.n2_mix_ratio
    }

    pub fn he_h2_ratio(&self) -> f64 {
        self.he_h2_ratio
    }
}

impl Fittable for TaurexGasProfile {
    fn fitting_parameters(&self) -> &FittingParameters<Self> {
        &self.params
    }

    fn fitting_parameters_mut(&mut self) -> &mut FittingParameters<Self> {
        &mut self.params
    }
}

impl GasProfile for TaurexGasProfile {
    fn state(&self) -> &GasProfileState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut GasProfileState {
        &mut self.state
    }

    fn compute_active_gas_profile(&mut self) -> TaurexResult<()> {
        let nlayers = self.state.nlayers;
        let mut profile = Array2::<f64>::zeros((self.state.active_gases.len(), nlayers));
        for (idx, ratio) in self.active_gas_mix_ratio.iter().enumerate() {
            profile.row_mut(idx).fill(*ratio);
        }
        self.state.active_mix_profile = Some(profile);
        Ok(())
    }

    fn compute_inactive_gas_profile(&mut self) -> TaurexResult<()> {
        let nlayers = self.state.nlayers;
        let active = self.state.active_mix_profile.as_ref().ok_or_else(|| {
            TaurexError::UnsupportedOperation(
                "the active gas profile must be computed before the inactive profile".to_string(),
            )
        })?;

        let mut inactive = Array2::<f64>::zeros((INACTIVE_GASES.len(), nlayers));
        inactive.row_mut(N2_INDEX).fill(self.n2_mix_ratio);

        // Zero active gases give a row of zeros, one gives that gas' row
        let mut total = active.sum_axis(Axis(0));
        total += &inactive.row(N2_INDEX);

        let remainder = total.mapv(|t| 1.0 - t);
        if remainder.iter().any(|r| *r < 0.0) {
            log::warn!(
                "{}: active gases and N2 exceed a mixing ratio of one; background is negative",
                self.state.name
            );
        }

        let h2 = &remainder / (1.0 + self.he_h2_ratio);
        let he = &h2 * self.he_h2_ratio;
        inactive.row_mut(H2_INDEX).assign(&h2);
        inactive.row_mut(HE_INDEX).assign(&he);

        log::debug!(
            "{}: background H2 ratio {:?} in the first layer",
            self.state.name,
            h2.get(0)
        );
        self.state.inactive_mix_profile = Some(inactive);
        Ok(())
    }

    fn profile_type(&self) -> &'static str {
        "TaurexGasProfile"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use is_close::is_close;
    use ndarray::{Array, Array1};
    use taurex_core::chemistry::Chemistry;
    use taurex_core::molecules::molecular_weight;

    fn profile(gases: &[&str], ratios: &[f64], mode: &str) -> TaurexGasProfile {
        TaurexGasProfile::new(
            "test",
            gases.iter().map(|g| g.to_string()).collect(),
            ratios.to_vec(),
            0.0,
            0.17647,
            mode,
        )
        .unwrap()
    }

    fn initialize(profile: &mut TaurexGasProfile, nlayers: usize) {
        let layers: Array1<f64> = Array::linspace(1.0, 2.0, nlayers);
        profile
            .initialize(nlayers, &layers, &layers, &layers)
            .unwrap();
    }

    #[test]
    fn test_single_active_gas() {
        let mut profile = profile(&["H2O"], &[0.001], "linear");
        initialize(&mut profile, 5);

        let inactive = profile.inactive_gas_mix_profile().unwrap();
        assert_eq!(inactive.dim(), (3, 5));
        let expected_h2 = (1.0 - 0.001) / 1.17647;
        for layer in 0..5 {
            assert_relative_eq!(inactive[[0, layer]], expected_h2, max_relative = 1e-12);
            assert_relative_eq!(
                inactive[[1, layer]],
                0.17647 * expected_h2,
                max_relative = 1e-12
            );
            assert_eq!(inactive[[2, layer]], 0.0);
        }
    }

    #[test]
    fn test_no_active_gases() {
        let mut profile = profile(&[], &[], "linear");
        initialize(&mut profile, 3);

        assert_eq!(profile.active_gas_mix_profile().unwrap().dim(), (0, 3));
        let inactive = profile.inactive_gas_mix_profile().unwrap();
        let total = inactive.sum_axis(Axis(0));
        for value in total.iter() {
            assert_relative_eq!(*value, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_multiple_active_gases_with_nitrogen() {
        let mut profile = TaurexGasProfile::new(
            "test",
            vec!["H2O".to_string(), "CH4".to_string(), "CO2".to_string()],
            vec![1e-3, 5e-4, 2e-5],
            0.05,
            0.2,
            "linear",
        )
        .unwrap();
        initialize(&mut profile, 10);

        let active = profile.active_gas_mix_profile().unwrap();
        assert_eq!(active.dim(), (3, 10));
        assert!(active.row(1).iter().all(|v| *v == 5e-4));

        let inactive = profile.inactive_gas_mix_profile().unwrap();
        let remainder = 1.0 - 1e-3 - 5e-4 - 2e-5 - 0.05;
        assert_relative_eq!(inactive[[0, 4]], remainder / 1.2, max_relative = 1e-12);
        assert_relative_eq!(inactive[[1, 4]], 0.2 * remainder / 1.2, max_relative = 1e-12);
        assert_relative_eq!(inactive[[2, 4]], 0.05);

        for total in profile.state().total_mix_ratio().unwrap().iter() {
            assert!(is_close!(*total, 1.0), "Expected 1.0, got {}", total);
        }
    }

    #[test]
    fn test_mu_profile() {
        let mut profile = profile(&["H2O"], &[0.01], "linear");
        initialize(&mut profile, 2);

        let h2 = 0.99 / 1.17647;
        let he = 0.17647 * h2;
        let expected = 0.01 * molecular_weight("H2O").unwrap()
            + h2 * molecular_weight("H2").unwrap()
            + he * molecular_weight("HE").unwrap();
        let mu = profile.mu_profile().unwrap();
        assert_eq!(mu.len(), 2);
        assert_relative_eq!(mu[0], expected, max_relative = 1e-12);
        assert_relative_eq!(mu[1], expected, max_relative = 1e-12);
    }

    #[test]
    fn test_unknown_active_gas_fails_mu() {
        let mut profile = profile(&["XeF6"], &[0.01], "linear");
        let layers: Array1<f64> = Array::linspace(1.0, 2.0, 2);
        let result = profile.initialize(2, &layers, &layers, &layers);
        assert!(matches!(result, Err(TaurexError::LookupFailure { .. })));
    }

    #[test]
    fn test_mismatched_ratios() {
        let result = TaurexGasProfile::new(
            "test",
            vec!["H2O".to_string(), "CH4".to_string()],
            vec![1e-3],
            0.0,
            0.17647,
            "linear",
        );
        assert!(matches!(result, Err(TaurexError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_invalid_mode() {
        let result = TaurexGasProfile::new("test", vec![], vec![], 0.0, 0.17647, "ln");
        assert!(matches!(result, Err(TaurexError::InvalidConfiguration(_))));
        assert!(TaurexGasProfile::new("test", vec![], vec![], 0.0, 0.17647, "LoG").is_ok());
    }

    #[test]
    fn test_linear_parameter_names_and_bounds() {
        let profile = profile(&["H2O", "CH4"], &[1e-3, 1e-4], "linear");
        assert_eq!(
            profile.fitting_parameters().names(),
            vec!["N2", "H2_He", "H2O", "CH4"]
        );

        let h2o = profile.fitting_parameters().get("H2O").unwrap();
        assert_eq!(h2o.bounds, [1e-12, 0.1]);
        assert_eq!(h2o.latex, "H$_2$O");
        assert!(!h2o.fit);

        let n2 = profile.fitting_parameters().get("N2").unwrap();
        assert_eq!(n2.bounds, [1e-12, 1.0]);
        assert_eq!(n2.latex, "N$_2$");
    }

    #[test]
    fn test_log_parameter_names_and_bounds() {
        let profile = profile(&["H2O", "CH4"], &[1e-3, 1e-4], "log");
        assert_eq!(
            profile.fitting_parameters().names(),
            vec!["N2", "H2_He", "log_H2O", "log_CH4"]
        );

        let ch4 = profile.fitting_parameters().get("log_CH4").unwrap();
        assert_eq!(ch4.bounds, [-12.0, -1.0]);
        assert_eq!(ch4.latex, "log(CH$_4$)");
        assert!(profile.fitting_parameters().get("CH4").is_none());
    }

    #[test]
    fn test_log_mode_reads_and_writes_log10() {
        let mut profile = profile(&["H2O"], &[1e-3], "log");
        assert_relative_eq!(
            profile.get_parameter("log_H2O").unwrap(),
            -3.0,
            epsilon = 1e-12
        );

        profile.set_parameter("log_H2O", -5.0).unwrap();
        assert_relative_eq!(
            profile.active_gas_mix_ratio()[0],
            1e-5,
            max_relative = 1e-12
        );

        profile.set_parameter("H2_He", (0.2f64).log10()).unwrap();
        assert_relative_eq!(profile.he_h2_ratio(), 0.2, max_relative = 1e-12);
    }

    #[test]
    fn test_per_gas_closures_bound_to_own_index() {
        let gases = ["H2O", "CH4", "CO", "CO2", "NH3"];
        let ratios = [1e-3, 2e-3, 3e-3, 4e-3, 5e-3];
        let mut profile = profile(&gases, &ratios, "linear");

        for (gas, ratio) in gases.iter().zip(ratios.iter()) {
            assert_eq!(profile.get_parameter(gas).unwrap(), *ratio);
        }

        profile.set_parameter("CH4", 0.05).unwrap();
        profile.set_parameter("H2O", 0.01).unwrap();
        assert_eq!(
            profile.active_gas_mix_ratio(),
            &[0.01, 0.05, 3e-3, 4e-3, 5e-3]
        );
        assert_eq!(profile.get_parameter("NH3").unwrap(), 5e-3);
    }

    #[test]
    fn test_parameter_update_reflected_after_initialize() {
        let mut profile = profile(&["H2O"], &[1e-3], "linear");
        initialize(&mut profile, 4);
        profile.set_parameter("N2", 0.1).unwrap();
        initialize(&mut profile, 4);

        let inactive = profile.inactive_gas_mix_profile().unwrap();
        assert_relative_eq!(inactive[[2, 0]], 0.1);
        assert_relative_eq!(
            inactive[[0, 0]],
            (1.0 - 1e-3 - 0.1) / 1.17647,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_parameters_from_json() {
        let parameters: TaurexGasProfileParameters =
            serde_json::from_str(r#"{"active_gases": ["CO"], "active_gas_mix_ratio": [1e-4], "mode": "LOG"}"#)
                .unwrap();
        assert_eq!(parameters.n2_mix_ratio, 0.0);
        assert_eq!(parameters.he_h2_ratio, 0.17647);
        assert_eq!(parameters.mode, ValueMode::Log);

        let profile = TaurexGasProfile::from_parameters(parameters).unwrap();
        assert!(profile.state().is_in_log_mode());
        assert_eq!(profile.active_gases(), &["CO".to_string()]);
    }
}
