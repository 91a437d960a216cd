//! Named scalar parameters that an optimizer can read and write.
//!
//! Every object that exposes retrievable quantities owns a [`FittingParameters`]
//! registry. Each entry pairs a name with a getter/setter closure over the owning
//! type, a LaTeX label used for presentation, default bounds and a flag that marks
//! whether the parameter takes part in a fit.
//!
//! Closures receive the owner explicitly rather than capturing it, so a registry
//! can be stored on the very object it describes:
//!
//! ```rust
//! use taurex_core::fittable::{Fittable, FittingParameters};
//!
//! struct Planet {
//!     radius: f64,
//!     params: FittingParameters<Planet>,
//! }
//!
//! impl Fittable for Planet {
//!     fn fitting_parameters(&self) -> &FittingParameters<Self> {
//!         &self.params
//!     }
//!     fn fitting_parameters_mut(&mut self) -> &mut FittingParameters<Self> {
//!         &mut self.params
//!     }
//! }
//!
//! let mut planet = Planet { radius: 1.0, params: FittingParameters::new() };
//! planet
//!     .params
//!     .add_fittable_param("radius", "$R_p$", |p: &Planet| p.radius, |p: &mut Planet, v| p.radius = v, true, [0.5, 2.0])
//!     .unwrap();
//!
//! planet.set_parameter("radius", 1.5).unwrap();
//! assert_eq!(planet.get_parameter("radius").unwrap(), 1.5);
//! ```

use crate::errors::{TaurexError, TaurexResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Reads the current value of a parameter from its owner
pub type ParamGetter<T> = Arc<dyn Fn(&T) -> f64 + Send + Sync>;
/// Writes a new value of a parameter into its owner
pub type ParamSetter<T> = Arc<dyn Fn(&mut T, f64) + Send + Sync>;

/// A single fittable parameter
pub struct FittingParameter<T> {
    /// Name used to look the parameter up
    pub name: String,
    /// Label used when presenting the parameter
    pub latex: String,
    pub getter: ParamGetter<T>,
    pub setter: ParamSetter<T>,
    /// Whether the parameter is fitted by default
    pub fit: bool,
    /// Lower and upper bound used by the optimizer
    pub bounds: [f64; 2],
}

impl<T> Clone for FittingParameter<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            latex: self.latex.clone(),
            getter: Arc::clone(&self.getter),
            setter: Arc::clone(&self.setter),
            fit: self.fit,
            bounds: self.bounds,
        }
    }
}

impl<T> fmt::Debug for FittingParameter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittingParameter")
            .field("name", &self.name)
            .field("latex", &self.latex)
            .field("fit", &self.fit)
            .field("bounds", &self.bounds)
            .finish()
    }
}

/// Fit overrides for a single parameter, typically read from a configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    pub fit: Option<bool>,
    pub bounds: Option<[f64; 2]>,
}

/// Insertion-ordered registry of fitting parameters for an owner of type `T`
///
/// The order of registration is preserved since optimizers map parameter vectors
/// onto the registry positionally.
pub struct FittingParameters<T> {
    params: Vec<FittingParameter<T>>,
}

impl<T> Default for FittingParameters<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for FittingParameters<T> {
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
        }
    }
}

impl<T> fmt::Debug for FittingParameters<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.params.iter()).finish()
    }
}

impl<T> FittingParameters<T> {
    pub fn new() -> Self {
        Self { params: vec![] }
    }

    /// Register a new parameter
    ///
    /// Fails with [`TaurexError::DuplicateEntry`] if the name is already taken.
    pub fn add_fittable_param<G, S>(
        &mut self,
        name: &str,
        latex: &str,
        getter: G,
        setter: S,
        default_fit: bool,
        bounds: [f64; 2],
    ) -> TaurexResult<()>
    where
        G: Fn(&T) -> f64 + Send + Sync + 'static,
        S: Fn(&mut T, f64) + Send + Sync + 'static,
    {
        if self.contains(name) {
            return Err(TaurexError::DuplicateEntry(format!(
                "fitting parameter '{}' is already registered",
                name
            )));
        }
        log::debug!("Registering fitting parameter {} with bounds {:?}", name, bounds);
        self.params.push(FittingParameter {
            name: name.to_string(),
            latex: latex.to_string(),
            getter: Arc::new(getter),
            setter: Arc::new(setter),
            fit: default_fit,
            bounds,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FittingParameter<T>> {
        self.params.iter().find(|p| p.name == name)
    }

    fn get_mut(&mut self, name: &str) -> TaurexResult<&mut FittingParameter<T>> {
        self.params
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| TaurexError::lookup("fitting parameter", name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FittingParameter<T>> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn enable_fit(&mut self, name: &str) -> TaurexResult<()> {
        self.get_mut(name)?.fit = true;
        Ok(())
    }

    pub fn disable_fit(&mut self, name: &str) -> TaurexResult<()> {
        self.get_mut(name)?.fit = false;
        Ok(())
    }

    pub fn set_bounds(&mut self, name: &str, bounds: [f64; 2]) -> TaurexResult<()> {
        self.get_mut(name)?.bounds = bounds;
        Ok(())
    }

    /// Parameters currently enabled for fitting, in registration order
    pub fn fitted(&self) -> impl Iterator<Item = &FittingParameter<T>> {
        self.params.iter().filter(|p| p.fit)
    }

    /// Bounds of the fitted parameters, in the same order as [`Self::fitted`]
    pub fn fit_boundaries(&self) -> Vec<[f64; 2]> {
        self.fitted().map(|p| p.bounds).collect()
    }

    /// Read the value of `name` from `owner`
    pub fn read(&self, owner: &T, name: &str) -> TaurexResult<f64> {
        let param = self
            .get(name)
            .ok_or_else(|| TaurexError::lookup("fitting parameter", name))?;
        Ok((param.getter)(owner))
    }

    /// Apply fit flags and bounds from a set of overrides
    pub fn apply_settings(&mut self, settings: &HashMap<String, FitSettings>) -> TaurexResult<()> {
        for (name, setting) in settings {
            let param = self.get_mut(name)?;
            if let Some(fit) = setting.fit {
                param.fit = fit;
            }
            if let Some(bounds) = setting.bounds {
                param.bounds = bounds;
            }
        }
        Ok(())
    }
}

/// An object that exposes fitting parameters over itself
pub trait Fittable: Sized {
    fn fitting_parameters(&self) -> &FittingParameters<Self>;

    fn fitting_parameters_mut(&mut self) -> &mut FittingParameters<Self>;

    /// Read a parameter by name through its registered getter
    fn get_parameter(&self, name: &str) -> TaurexResult<f64> {
        self.fitting_parameters().read(self, name)
    }

    /// Write a parameter by name through its registered setter
    fn set_parameter(&mut self, name: &str, value: f64) -> TaurexResult<()> {
        // The setter needs `&mut self`, so release the registry borrow first
        let setter = self
            .fitting_parameters()
            .get(name)
            .map(|p| Arc::clone(&p.setter))
            .ok_or_else(|| TaurexError::lookup("fitting parameter", name))?;
        setter(self, value);
        self.on_parameter_changed()
    }

    /// Called after [`Fittable::set_parameter`] has written a new value
    ///
    /// Owners that cache values derived from their parameters refresh them here.
    fn on_parameter_changed(&mut self) -> TaurexResult<()> {
        Ok(())
    }

    fn apply_fit_settings(&mut self, settings: &HashMap<String, FitSettings>) -> TaurexResult<()> {
        self.fitting_parameters_mut().apply_settings(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Owner {
        values: Vec<f64>,
        params: FittingParameters<Owner>,
    }

    impl Fittable for Owner {
        fn fitting_parameters(&self) -> &FittingParameters<Self> {
            &self.params
        }
        fn fitting_parameters_mut(&mut self) -> &mut FittingParameters<Self> {
            &mut self.params
        }
    }

    fn owner() -> Owner {
        let mut owner = Owner {
            values: vec![1.0, 2.0],
            params: FittingParameters::new(),
        };
        for idx in 0..2 {
            owner
                .params
                .add_fittable_param(
                    &format!("v{}", idx),
                    &format!("v_{}", idx),
                    move |o: &Owner| o.values[idx],
                    move |o: &mut Owner, v| o.values[idx] = v,
                    false,
                    [0.0, 10.0],
                )
                .unwrap();
        }
        owner
    }

    #[test]
    fn read_and_write_by_name() {
        let mut owner = owner();
        assert_eq!(owner.get_parameter("v1").unwrap(), 2.0);
        owner.set_parameter("v0", 5.0).unwrap();
        assert_eq!(owner.values, vec![5.0, 2.0]);
    }

    #[test]
    fn unknown_name_is_lookup_failure() {
        let mut owner = owner();
        assert!(matches!(
            owner.get_parameter("missing"),
            Err(TaurexError::LookupFailure { .. })
        ));
        assert!(matches!(
            owner.set_parameter("missing", 1.0),
            Err(TaurexError::LookupFailure { .. })
        ));
        assert!(matches!(
            owner.params.enable_fit("missing"),
            Err(TaurexError::LookupFailure { .. })
        ));
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut owner = owner();
        let result = owner.params.add_fittable_param(
            "v0",
            "v_0",
            |o: &Owner| o.values[0],
            |o: &mut Owner, v| o.values[0] = v,
            false,
            [0.0, 1.0],
        );
        assert!(matches!(result, Err(TaurexError::DuplicateEntry(_))));
        assert_eq!(owner.params.len(), 2);
    }

    #[test]
    fn fitted_preserves_registration_order() {
        let mut owner = owner();
        assert_eq!(owner.params.fitted().count(), 0);

        owner.params.enable_fit("v1").unwrap();
        owner.params.enable_fit("v0").unwrap();
        owner.params.set_bounds("v1", [1.0, 3.0]).unwrap();

        let names: Vec<&str> = owner.params.fitted().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["v0", "v1"]);
        assert_eq!(owner.params.fit_boundaries(), vec![[0.0, 10.0], [1.0, 3.0]]);

        owner.params.disable_fit("v0").unwrap();
        assert_eq!(owner.params.names(), vec!["v0", "v1"]);
        assert_eq!(owner.params.fitted().count(), 1);
    }

    #[test]
    fn apply_settings_overrides() {
        let mut owner = owner();
        let settings: HashMap<String, FitSettings> =
            serde_json::from_str(r#"{"v0": {"fit": true, "bounds": [0.5, 1.5]}, "v1": {}}"#)
                .unwrap();
        owner.apply_fit_settings(&settings).unwrap();

        let v0 = owner.params.get("v0").unwrap();
        assert!(v0.fit);
        assert_eq!(v0.bounds, [0.5, 1.5]);
        let v1 = owner.params.get("v1").unwrap();
        assert!(!v1.fit);
        assert_eq!(v1.bounds, [0.0, 10.0]);
    }
}
