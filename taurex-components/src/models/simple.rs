//! Forward model over a fixed layered atmosphere.
//!
//! The model owns a chemistry (a [`TaurexGasProfile`] by default) and the
//! temperature, pressure and altitude of every layer. Evaluation sums the
//! optical depth of each registered contribution and reports the absorbed
//! fraction of light per wavenumber:
//!
//! $$ A_\nu = 1 - \exp\left(-\sum_l \tau_{l,\nu}\right) $$

use crate::profiles::TaurexGasProfile;
use ndarray::{Array, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taurex_core::chemistry::Chemistry;
use taurex_core::contribution::AtmosphereView;
use taurex_core::errors::{TaurexError, TaurexResult};
use taurex_core::fittable::{Fittable, FittingParameters};
use taurex_core::model::{ForwardModel, ForwardModelBase, ModelOutput};
use taurex_core::opacity::Opacity;
use taurex_core::output::Output;

/// Layering of an isothermal atmosphere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereParameters {
    /// Number of layers
    /// default: 100
    pub nlayers: usize,
    /// Temperature of every layer
    /// unit: K
    /// default: 1500
    pub temperature: f64,
    /// Pressure at the top of the atmosphere
    /// unit: Pa
    /// default: 1e-4
    pub atm_min_pressure: f64,
    /// Pressure at the bottom of the atmosphere
    /// unit: Pa
    /// default: 1e6
    pub atm_max_pressure: f64,
    /// unit: m
    /// default: 5e5
    pub scale_height: f64,
}

impl Default for AtmosphereParameters {
    fn default() -> Self {
        Self {
            nlayers: 100,
            temperature: 1500.0,
            atm_min_pressure: 1e-4,
            atm_max_pressure: 1e6,
            scale_height: 5e5,
        }
    }
}

impl AtmosphereParameters {
    /// Temperature, pressure and altitude of each layer, ordered from the bottom up
    ///
    /// Pressures are log-spaced between the two bounds and altitudes follow the
    /// hydrostatic relation $z = H \ln(P_{max} / P)$.
    pub fn layers(&self) -> TaurexResult<(Array1<f64>, Array1<f64>, Array1<f64>)> {
        if self.nlayers == 0 {
            return Err(TaurexError::InvalidConfiguration(
                "an atmosphere needs at least one layer".to_string(),
            ));
        }
        if !(self.atm_min_pressure > 0.0 && self.atm_min_pressure < self.atm_max_pressure) {
            return Err(TaurexError::InvalidConfiguration(format!(
                "pressure bounds must satisfy 0 < min < max, got [{}, {}]",
                self.atm_min_pressure, self.atm_max_pressure
            )));
        }

        let pressure = Array::logspace(
            10.0,
            self.atm_max_pressure.log10(),
            self.atm_min_pressure.log10(),
            self.nlayers,
        );
        let temperature = Array1::from_elem(self.nlayers, self.temperature);
        let p_max = self.atm_max_pressure;
        let altitude = pressure.mapv(|p| self.scale_height * (p_max / p).ln());
        Ok((temperature, pressure, altitude))
    }
}

/// Forward model over a fixed layered atmosphere
///
/// The composition comes from any [`Chemistry`] that also exposes fitting
/// parameters, by default a [`TaurexGasProfile`]. Fitting parameters of the
/// chemistry are exposed on the model under the same names once the model is
/// built, and setting one through [`Fittable::set_parameter`] recomputes the
/// composition.
#[derive(Debug)]
pub struct SimpleForwardModel<C = TaurexGasProfile> {
    base: ForwardModelBase,
    chemistry: C,
    temperature: Array1<f64>,
    pressure: Array1<f64>,
    altitude: Array1<f64>,
    params: FittingParameters<SimpleForwardModel<C>>,
    built: bool,
}

impl<C> SimpleForwardModel<C>
where
    C: Chemistry + Fittable + 'static,
{
    pub fn new(
        name: &str,
        chemistry: C,
        temperature: Array1<f64>,
        pressure: Array1<f64>,
        altitude: Array1<f64>,
    ) -> TaurexResult<Self> {
        let nlayers = temperature.len();
        if nlayers == 0 {
            return Err(TaurexError::InvalidConfiguration(
                "an atmosphere needs at least one layer".to_string(),
            ));
        }
        for (label, values) in [("pressure profile", &pressure), ("altitude profile", &altitude)] {
            if values.len() != nlayers {
                return Err(TaurexError::ShapeMismatch {
                    name: label.to_string(),
                    expected: nlayers,
                    got: values.len(),
                });
            }
        }

        Ok(Self {
            base: ForwardModelBase::new(name),
            chemistry,
            temperature,
            pressure,
            altitude,
            params: FittingParameters::new(),
            built: false,
        })
    }

    pub fn from_atmosphere(
        name: &str,
        chemistry: C,
        atmosphere: &AtmosphereParameters,
    ) -> TaurexResult<Self> {
        let (temperature, pressure, altitude) = atmosphere.layers()?;
        Self::new(name, chemistry, temperature, pressure, altitude)
    }

    pub fn nlayers(&self) -> usize {
        self.temperature.len()
    }

    pub fn chemistry(&self) -> &C {
        &self.chemistry
    }

    pub fn pressure_profile(&self) -> &Array1<f64> {
        &self.pressure
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Register an opacity
    ///
    /// The native grid depends on the opacities so the model must be rebuilt.
    pub fn add_opacity(&mut self, opacity: Arc<dyn Opacity>) -> TaurexResult<()> {
        self.base.add_opacity(opacity)?;
        self.built = false;
        Ok(())
    }

    /// Recompute the composition from the current parameter values
    fn refresh_chemistry(&mut self) -> TaurexResult<()> {
        let nlayers = self.nlayers();
        self.chemistry.initialize_chemistry(
            nlayers,
            &self.temperature,
            &self.pressure,
            &self.altitude,
        )
    }

    /// Expose every fitting parameter of the chemistry on the model
    ///
    /// Fit flags and bounds set on a previous build are kept.
    fn register_chemistry_parameters(&mut self) -> TaurexResult<()> {
        let previous = std::mem::take(&mut self.params);

        for param in self.chemistry.fitting_parameters().iter() {
            let getter = Arc::clone(&param.getter);
            let setter = Arc::clone(&param.setter);
            let (fit, bounds) = match previous.get(&param.name) {
                Some(existing) => (existing.fit, existing.bounds),
                None => (param.fit, param.bounds),
            };
            self.params.add_fittable_param(
                &param.name,
                &param.latex,
                move |m: &Self| getter(&m.chemistry),
                move |m: &mut Self, value| setter(&mut m.chemistry, value),
                fit,
                bounds,
            )?;
        }
        Ok(())
    }
}

/// Fraction of light absorbed along the full column
fn absorption(tau: &Array2<f64>) -> Array1<f64> {
    tau.sum_axis(Axis(0)).mapv(|t| 1.0 - (-t).exp())
}

impl<C> Fittable for SimpleForwardModel<C>
where
    C: Chemistry + Fittable + 'static,
{
    fn fitting_parameters(&self) -> &FittingParameters<Self> {
        &self.params
    }

    fn fitting_parameters_mut(&mut self) -> &mut FittingParameters<Self> {
        &mut self.params
    }

    fn on_parameter_changed(&mut self) -> TaurexResult<()> {
        if self.built {
            self.refresh_chemistry()?;
        }
        Ok(())
    }
}

impl<C> ForwardModel for SimpleForwardModel<C>
where
    C: Chemistry + Fittable + 'static,
{
    fn base(&self) -> &ForwardModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ForwardModelBase {
        &mut self.base
    }

    fn build(&mut self) -> TaurexResult<()> {
        self.refresh_chemistry()?;

        if let Some(grid) = self.base.compute_native_grid() {
            self.base.set_native_grid(grid);
        }
        self.register_chemistry_parameters()?;
        self.built = true;

        log::info!(
            "Built {} with {} layers, {} contributions and {} fitting parameters",
            self.base.name(),
            self.nlayers(),
            self.base.contributions().len(),
            self.params.len()
        );
        Ok(())
    }

    /// Evaluate the model
    ///
    /// Reads the composition computed by the last build or parameter update, so
    /// repeated calls give identical results.
    fn model(
        &self,
        wngrid: Option<&Array1<f64>>,
        return_contrib: bool,
    ) -> TaurexResult<ModelOutput> {
        if !self.built {
            return Err(TaurexError::UnsupportedOperation(format!(
                "{} must be built before it is evaluated",
                self.base.name()
            )));
        }
        let grid = self.base.resolve_grid(wngrid)?;
        let nlayers = self.nlayers();

        let view = AtmosphereView {
            chemistry: &self.chemistry,
            temperature: &self.temperature,
            pressure: &self.pressure,
            altitude: &self.altitude,
            opacities: self.base.opacities(),
        };

        let mut tau = Array2::zeros((nlayers, grid.len()));
        let mut contributions = Vec::new();
        for contribution in self.base.contributions() {
            let contrib_tau = contribution.contribute(&view, &grid)?;
            if contrib_tau.dim() != tau.dim() {
                return Err(TaurexError::ShapeMismatch {
                    name: format!("optical depth of {}", contribution.name()),
                    expected: tau.len(),
                    got: contrib_tau.len(),
                });
            }
            if return_contrib {
                contributions.push((contribution.name().to_string(), absorption(&contrib_tau)));
            }
            tau += &contrib_tau;
        }

        Ok(ModelOutput {
            spectrum: absorption(&tau),
            wngrid: grid,
            tau,
            contributions,
        })
    }

    fn model_type(&self) -> &'static str {
        "SimpleForwardModel"
    }

    fn write_chemistry(&self, group: &mut dyn Output) {
        self.chemistry.write_composition(group);
    }
}
