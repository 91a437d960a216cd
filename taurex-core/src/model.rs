//! Forward models turn an atmosphere into a spectrum.
//!
//! A forward model combines a chemistry, a set of opacities and a list of
//! contributions. [`ForwardModelBase`] holds the parts every model shares; concrete
//! models embed it and implement [`ForwardModel`] to wire a specific atmosphere.
//!
//! The model lifecycle is:
//!
//! 1. construct the model and register contributions and opacities,
//! 2. call [`ForwardModel::build`] to initialise the chemistry and the native grid,
//! 3. call [`ForwardModel::model`] as often as needed, typically after an optimizer
//!    has updated the fitting parameters.

use crate::contribution::{Contribution, OpacitySet};
use crate::errors::{TaurexError, TaurexResult};
use crate::fittable::Fittable;
use crate::opacity::Opacity;
use crate::output::Output;
use ndarray::{Array1, Array2};
use std::sync::Arc;

/// Result of a forward model evaluation
#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// Wavenumbers the model was evaluated on
    pub wngrid: Array1<f64>,
    /// Absorption at each wavenumber
    pub spectrum: Array1<f64>,
    /// Total optical depth with shape `(nlayers, wngrid.len())`
    pub tau: Array2<f64>,
    /// Absorption of each contribution on its own, in registration order
    pub contributions: Vec<(String, Array1<f64>)>,
}

/// State shared by every forward model
#[derive(Debug, Default)]
pub struct ForwardModelBase {
    name: String,
    contributions: Vec<Arc<dyn Contribution>>,
    opacities: OpacitySet,
    native_grid: Option<Array1<f64>>,
}

fn same_instance(a: &Arc<dyn Contribution>, b: &Arc<dyn Contribution>) -> bool {
    // Compare data pointers only; vtable pointers are not unique per type
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl ForwardModelBase {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a contribution
    ///
    /// Registering the same instance twice fails with [`TaurexError::DuplicateEntry`].
    /// Two distinct instances with identical settings are both accepted.
    pub fn add_contribution(&mut self, contribution: Arc<dyn Contribution>) -> TaurexResult<()> {
        if self
            .contributions
            .iter()
            .any(|existing| same_instance(existing, &contribution))
        {
            return Err(TaurexError::DuplicateEntry(format!(
                "contribution '{}' already exists in {}",
                contribution.name(),
                self.name
            )));
        }
        log::debug!("Adding contribution {} to {}", contribution.name(), self.name);
        self.contributions.push(contribution);
        Ok(())
    }

    pub fn contributions(&self) -> &[Arc<dyn Contribution>] {
        &self.contributions
    }

    /// Register the opacity of a molecule
    pub fn add_opacity(&mut self, opacity: Arc<dyn Opacity>) -> TaurexResult<()> {
        let molecule = opacity.molecule_name().to_string();
        if self.opacities.contains_key(&molecule) {
            return Err(TaurexError::DuplicateEntry(format!(
                "opacity for '{}' already exists in {}",
                molecule, self.name
            )));
        }
        self.opacities.insert(molecule, opacity);
        Ok(())
    }

    pub fn opacities(&self) -> &OpacitySet {
        &self.opacities
    }

    pub fn native_grid(&self) -> Option<&Array1<f64>> {
        self.native_grid.as_ref()
    }

    pub fn set_native_grid(&mut self, grid: Array1<f64>) {
        self.native_grid = Some(grid);
    }

    /// Sorted union of the wavenumber grids of every registered opacity
    ///
    /// Returns `None` when no opacities are registered.
    pub fn compute_native_grid(&self) -> Option<Array1<f64>> {
        if self.opacities.is_empty() {
            return None;
        }
        let mut values: Vec<f64> = self
            .opacities
            .values()
            .flat_map(|o| o.wavenumber_grid().iter().copied())
            .filter(|v| v.is_finite())
            .collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        Some(Array1::from(values))
    }

    /// The grid to evaluate on: `wngrid` if given, the native grid otherwise
    pub fn resolve_grid(&self, wngrid: Option<&Array1<f64>>) -> TaurexResult<Array1<f64>> {
        match wngrid.or(self.native_grid.as_ref()) {
            Some(grid) => Ok(grid.clone()),
            None => Err(TaurexError::UnsupportedOperation(format!(
                "{} has no native wavenumber grid; build the model first",
                self.name
            ))),
        }
    }
}

/// A model producing a spectrum from an atmosphere
///
/// Fitting parameters of the model (including those it exposes from its
/// chemistry) are read and written by name through [`Fittable`].
pub trait ForwardModel: Fittable {
    fn base(&self) -> &ForwardModelBase;

    fn base_mut(&mut self) -> &mut ForwardModelBase;

    /// Prepare the model for evaluation
    fn build(&mut self) -> TaurexResult<()>;

    /// Evaluate the model on `wngrid`, or on the native grid if `None`
    ///
    /// When `return_contrib` is false the per-contribution breakdown is left empty.
    /// Evaluating does not modify the model.
    fn model(&self, wngrid: Option<&Array1<f64>>, return_contrib: bool)
        -> TaurexResult<ModelOutput>;

    /// Type tag written alongside the model
    fn model_type(&self) -> &'static str;

    fn add_contribution(&mut self, contribution: Arc<dyn Contribution>) -> TaurexResult<()> {
        self.base_mut().add_contribution(contribution)
    }

    fn native_wavenumber_grid(&self) -> Option<&Array1<f64>> {
        self.base().native_grid()
    }

    /// Names of every fitting parameter, in registration order
    fn parameter_names(&self) -> Vec<String> {
        self.fitting_parameters().names()
    }

    /// Describe the model in `output`
    fn write(&self, output: &mut dyn Output) {
        let group = output.create_group("Model");
        group.write_string("model_type", self.model_type());
        let contributions: Vec<&str> = self
            .base()
            .contributions()
            .iter()
            .map(|c| c.name())
            .collect();
        group.write_string("contributions", &contributions.join(","));
        self.write_chemistry(group);
    }

    /// Describe the chemistry of the model inside the `"Model"` group
    fn write_chemistry(&self, _group: &mut dyn Output) {}
}
