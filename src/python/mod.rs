use pyo3::prelude::*;
use pyo3::wrap_pymodule;
use taurex_components::python::components;
use taurex_core::python::core;

#[pymodule]
#[pyo3(name = "_lib")]
fn taurex(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_wrapped(wrap_pymodule!(core))?;
    m.add_wrapped(wrap_pymodule!(components))?;

    set_path(m, "taurex._lib.core", "core")?;
    set_path(m, "taurex._lib.components", "components")?;

    Ok(())
}

fn set_path(m: &Bound<'_, PyModule>, path: &str, module: &str) -> PyResult<()> {
    let code = format!(
        "\
import sys
sys.modules['{path}'] = {module}
    "
    );
    m.py().run_bound(&code, None, Some(&m.dict()))
}
