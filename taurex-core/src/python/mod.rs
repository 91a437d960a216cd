//! Python bindings for the core types
use crate::errors::TaurexError;
use crate::molecules;
use pyo3::exceptions::{PyKeyError, PyNotImplementedError, PyTypeError, PyValueError};
use pyo3::prelude::*;

impl From<TaurexError> for PyErr {
    fn from(err: TaurexError) -> PyErr {
        let message = err.to_string();
        match err {
            TaurexError::LookupFailure { .. } => PyKeyError::new_err(message),
            TaurexError::UnsupportedOperation(_) => PyNotImplementedError::new_err(message),
            TaurexError::TypeMismatch(_) => PyTypeError::new_err(message),
            _ => PyValueError::new_err(message),
        }
    }
}

/// Molecular weight of a gas in atomic mass units
#[pyfunction]
pub fn molecular_weight(gas: &str) -> PyResult<f64> {
    Ok(molecules::molecular_weight(gas)?)
}

/// LaTeX label of a gas
#[pyfunction]
pub fn molecule_texlabel(gas: &str) -> String {
    molecules::molecule_texlabel(gas)
}

#[pymodule]
pub fn core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(molecular_weight, m)?)?;
    m.add_function(wrap_pyfunction!(molecule_texlabel, m)?)?;
    Ok(())
}
