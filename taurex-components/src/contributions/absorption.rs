//! Molecular absorption by the active gases.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use taurex_core::contribution::{AtmosphereView, Contribution};
use taurex_core::errors::{TaurexError, TaurexResult};

/// Molecular absorption from the active gases
///
/// The optical depth of a layer is the sum over active gases of the mixing ratio
/// times the cross-section, scaled by `column_scale`:
///
/// $$ \tau_{l,\nu} = s \sum_g x_{g,l} \, \sigma_g(T_l, P_l, \nu) $$
///
/// Active gases without a registered opacity contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsorptionContribution {
    pub name: String,
    /// Column density multiplied into every layer
    /// unit: molecules / cm^2
    /// default: 1.0
    pub column_scale: f64,
}

impl Default for AbsorptionContribution {
    fn default() -> Self {
        Self {
            name: "Absorption".to_string(),
            column_scale: 1.0,
        }
    }
}

impl AbsorptionContribution {
    pub fn new(name: &str, column_scale: f64) -> Self {
        Self {
            name: name.to_string(),
            column_scale,
        }
    }
}

#[typetag::serde]
impl Contribution for AbsorptionContribution {
    fn name(&self) -> &str {
        &self.name
    }

    fn contribute(
        &self,
        atmosphere: &AtmosphereView<'_>,
        wngrid: &Array1<f64>,
    ) -> TaurexResult<Array2<f64>> {
        let chemistry = atmosphere.chemistry;
        let mix = chemistry.active_gas_mix_profile().ok_or_else(|| {
            TaurexError::UnsupportedOperation(format!(
                "{} requires an initialized chemistry",
                self.name
            ))
        })?;

        let nlayers = atmosphere.nlayers();
        let mut tau = Array2::zeros((nlayers, wngrid.len()));

        for (gas_idx, gas) in chemistry.active_gases().iter().enumerate() {
            let Some(opacity) = atmosphere.opacities.get(gas) else {
                log::warn!("{}: no opacity for active gas {}, skipping", self.name, gas);
                continue;
            };
            for layer in 0..nlayers {
                let sigma = opacity.opacity(
                    atmosphere.temperature[layer],
                    atmosphere.pressure[layer],
                    wngrid,
                )?;
                if sigma.len() != wngrid.len() {
                    return Err(TaurexError::ShapeMismatch {
                        name: format!("cross-section of {}", gas),
                        expected: wngrid.len(),
                        got: sigma.len(),
                    });
                }
                let mut row = tau.row_mut(layer);
                row.scaled_add(mix[[gas_idx, layer]] * self.column_scale, &sigma);
            }
        }

        Ok(tau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opacity::{ConstantOpacity, ConstantOpacityParameters};
    use crate::profiles::{TaurexGasProfile, TaurexGasProfileParameters};
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::sync::Arc;
    use taurex_core::chemistry::Chemistry;
    use taurex_core::contribution::OpacitySet;
    use taurex_core::opacity::Opacity;

    fn opacity(molecule: &str, cross_section: f64) -> Arc<dyn Opacity> {
        Arc::new(
            ConstantOpacity::from_parameters(ConstantOpacityParameters {
                molecule: molecule.to_string(),
                cross_section,
                wn_min: 1000.0,
                wn_max: 2000.0,
                npoints: 3,
            })
            .unwrap(),
        )
    }

    fn profile() -> TaurexGasProfile {
        TaurexGasProfile::from_parameters(TaurexGasProfileParameters {
            active_gases: vec!["H2O".to_string(), "CH4".to_string()],
            active_gas_mix_ratio: vec![1e-3, 1e-4],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_sum_over_gases() {
        let nlayers = 2;
        let temperature = Array1::from_elem(nlayers, 1000.0);
        let pressure = array![1e5, 1e3];
        let altitude = array![0.0, 1e6];
        let mut chemistry = profile();
        chemistry
            .initialize_chemistry(nlayers, &temperature, &pressure, &altitude)
            .unwrap();

        let mut opacities = OpacitySet::new();
        opacities.insert("H2O".to_string(), opacity("H2O", 2.0));
        opacities.insert("CH4".to_string(), opacity("CH4", 10.0));

        let view = AtmosphereView {
            chemistry: &chemistry,
            temperature: &temperature,
            pressure: &pressure,
            altitude: &altitude,
            opacities: &opacities,
        };
        let contribution = AbsorptionContribution::new("Absorption", 100.0);
        let tau = contribution
            .contribute(&view, &array![500.0, 1500.0])
            .unwrap();

        assert_eq!(tau.dim(), (2, 2));
        assert_eq!(tau[[0, 0]], 0.0);
        // 100 * (1e-3 * 2 + 1e-4 * 10)
        assert_relative_eq!(tau[[0, 1]], 0.3, epsilon = 1e-12);
        assert_relative_eq!(tau[[1, 1]], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_opacity_is_skipped() {
        let nlayers = 1;
        let temperature = array![1000.0];
        let pressure = array![1e5];
        let altitude = array![0.0];
        let mut chemistry = profile();
        chemistry
            .initialize_chemistry(nlayers, &temperature, &pressure, &altitude)
            .unwrap();

        let mut opacities = OpacitySet::new();
        opacities.insert("H2O".to_string(), opacity("H2O", 1.0));
        let view = AtmosphereView {
            chemistry: &chemistry,
            temperature: &temperature,
            pressure: &pressure,
            altitude: &altitude,
            opacities: &opacities,
        };
        let tau = AbsorptionContribution::default()
            .contribute(&view, &array![1500.0])
            .unwrap();
        assert_relative_eq!(tau[[0, 0]], 1e-3, epsilon = 1e-15);
    }

    /// Returns its native table whatever grid is asked for
    #[derive(Debug, Serialize, Deserialize)]
    struct TabulatedOpacity {
        molecule: String,
        wngrid: Array1<f64>,
    }

    #[typetag::serde]
    impl Opacity for TabulatedOpacity {
        fn molecule_name(&self) -> &str {
            &self.molecule
        }

        fn wavenumber_grid(&self) -> &Array1<f64> {
            &self.wngrid
        }

        fn opacity(
            &self,
            _temperature: f64,
            _pressure: f64,
            _wngrid: &Array1<f64>,
        ) -> TaurexResult<Array1<f64>> {
            Ok(Array1::ones(self.wngrid.len()))
        }
    }

    #[test]
    fn test_cross_section_length_mismatch() {
        let temperature = array![1000.0];
        let pressure = array![1e5];
        let altitude = array![0.0];
        let mut chemistry = profile();
        chemistry
            .initialize_chemistry(1, &temperature, &pressure, &altitude)
            .unwrap();

        let mut opacities = OpacitySet::new();
        opacities.insert(
            "H2O".to_string(),
            Arc::new(TabulatedOpacity {
                molecule: "H2O".to_string(),
                wngrid: array![1000.0, 1500.0, 2000.0],
            }) as Arc<dyn Opacity>,
        );
        let view = AtmosphereView {
            chemistry: &chemistry,
            temperature: &temperature,
            pressure: &pressure,
            altitude: &altitude,
            opacities: &opacities,
        };

        let result = AbsorptionContribution::default().contribute(&view, &array![1200.0, 1800.0]);
        match result {
            Err(TaurexError::ShapeMismatch {
                name,
                expected,
                got,
            }) => {
                assert_eq!(name, "cross-section of H2O");
                assert_eq!(expected, 2);
                assert_eq!(got, 3);
            }
            other => panic!("expected a shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_requires_initialized_chemistry() {
        let chemistry = profile();
        let temperature = array![1000.0];
        let pressure = array![1e5];
        let altitude = array![0.0];
        let opacities = OpacitySet::new();
        let view = AtmosphereView {
            chemistry: &chemistry,
            temperature: &temperature,
            pressure: &pressure,
            altitude: &altitude,
            opacities: &opacities,
        };
        assert!(matches!(
            AbsorptionContribution::default().contribute(&view, &array![1500.0]),
            Err(TaurexError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_defaults_from_config() {
        let value: toml::Value = toml::from_str(r#"type = "AbsorptionContribution""#).unwrap();
        let contribution = taurex_core::contribution::contribution_from_config(value).unwrap();
        assert_eq!(contribution.name(), "Absorption");
    }
}
