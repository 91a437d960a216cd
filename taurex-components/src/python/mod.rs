use crate::config::ModelConfig;
use crate::models::SimpleForwardModel;
use crate::profiles::{TaurexGasProfile, TaurexGasProfileParameters};
use numpy::{PyArray1, PyArray2, PyReadonlyArray1, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use taurex_core::chemistry::Chemistry;
use taurex_core::fittable::Fittable;
use taurex_core::model::ForwardModel;
use taurex_core::output::MemoryOutput;
use taurex_core::profile::GasProfile;

/// Python wrapper for [`TaurexGasProfile`]
#[derive(Debug, Clone)]
#[pyclass]
#[pyo3(name = "TaurexGasProfile")]
pub struct PyTaurexGasProfile(pub TaurexGasProfile);

#[pymethods]
impl PyTaurexGasProfile {
    #[staticmethod]
    pub fn from_parameters(parameters: Bound<PyAny>) -> PyResult<Self> {
        let parameters = pythonize::depythonize_bound::<TaurexGasProfileParameters>(parameters)
            .map_err(|e| PyValueError::new_err(format!("{}", e)))?;
        Ok(Self(TaurexGasProfile::from_parameters(parameters)?))
    }

    pub fn initialize(
        &mut self,
        nlayers: usize,
        temperature: PyReadonlyArray1<f64>,
        pressure: PyReadonlyArray1<f64>,
        altitude: PyReadonlyArray1<f64>,
    ) -> PyResult<()> {
        self.0.initialize(
            nlayers,
            &temperature.as_array().to_owned(),
            &pressure.as_array().to_owned(),
            &altitude.as_array().to_owned(),
        )?;
        Ok(())
    }

    #[getter]
    pub fn active_gases(&self) -> Vec<String> {
        Chemistry::active_gases(&self.0).to_vec()
    }

    #[getter]
    pub fn inactive_gases(&self) -> Vec<String> {
        Chemistry::inactive_gases(&self.0).to_vec()
    }

    #[getter]
    pub fn active_gas_mix_profile<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray2<f64>>> {
        self.0
            .active_gas_mix_profile()
            .map(|profile| profile.to_pyarray_bound(py))
    }

    #[getter]
    pub fn inactive_gas_mix_profile<'py>(
        &self,
        py: Python<'py>,
    ) -> Option<Bound<'py, PyArray2<f64>>> {
        self.0
            .inactive_gas_mix_profile()
            .map(|profile| profile.to_pyarray_bound(py))
    }

    #[getter]
    pub fn mu_profile<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray1<f64>>> {
        self.0.mu_profile().map(|mu| mu.to_pyarray_bound(py))
    }

    pub fn fitting_parameter_names(&self) -> Vec<String> {
        self.0.fitting_parameters().names()
    }

    pub fn get_parameter(&self, name: &str) -> PyResult<f64> {
        Ok(self.0.get_parameter(name)?)
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> PyResult<()> {
        Ok(self.0.set_parameter(name, value)?)
    }
}

/// Python wrapper for [`SimpleForwardModel`]
///
/// Models are built from the same TOML documents as [`ModelConfig`].
#[derive(Debug)]
#[pyclass]
#[pyo3(name = "SimpleForwardModel")]
pub struct PySimpleForwardModel(pub SimpleForwardModel);

#[pymethods]
impl PySimpleForwardModel {
    #[staticmethod]
    pub fn from_toml(contents: &str) -> PyResult<Self> {
        let config = ModelConfig::from_toml_str(contents)?;
        Ok(Self(config.build_model()?))
    }

    #[staticmethod]
    pub fn from_file(path: &str) -> PyResult<Self> {
        let config = ModelConfig::from_file(path)?;
        Ok(Self(config.build_model()?))
    }

    pub fn fitting_parameter_names(&self) -> Vec<String> {
        self.0.parameter_names()
    }

    pub fn get_parameter(&self, name: &str) -> PyResult<f64> {
        Ok(self.0.get_parameter(name)?)
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> PyResult<()> {
        Ok(self.0.set_parameter(name, value)?)
    }

    pub fn native_wavenumber_grid<'py>(
        &self,
        py: Python<'py>,
    ) -> Option<Bound<'py, PyArray1<f64>>> {
        self.0
            .native_wavenumber_grid()
            .map(|grid| grid.to_pyarray_bound(py))
    }

    /// Evaluate the model, returning the wavenumber grid, the spectrum and the optical depth
    #[pyo3(signature = (wngrid=None))]
    #[allow(clippy::type_complexity)]
    pub fn model<'py>(
        &self,
        py: Python<'py>,
        wngrid: Option<PyReadonlyArray1<f64>>,
    ) -> PyResult<(
        Bound<'py, PyArray1<f64>>,
        Bound<'py, PyArray1<f64>>,
        Bound<'py, PyArray2<f64>>,
    )> {
        let wngrid = wngrid.map(|grid| grid.as_array().to_owned());
        let output = self.0.model(wngrid.as_ref(), false)?;
        Ok((
            output.wngrid.to_pyarray_bound(py),
            output.spectrum.to_pyarray_bound(py),
            output.tau.to_pyarray_bound(py),
        ))
    }

    /// Description of the model as nested dictionaries
    pub fn write(&self, py: Python<'_>) -> PyResult<PyObject> {
        let mut output = MemoryOutput::new();
        self.0.write(&mut output);
        pythonize::pythonize(py, &output).map_err(|e| PyValueError::new_err(format!("{}", e)))
    }
}

#[pymodule]
pub fn components(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTaurexGasProfile>()?;
    m.add_class::<PySimpleForwardModel>()?;
    Ok(())
}
