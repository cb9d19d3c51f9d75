//! PyO3 bindings for Python integration

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::SpectralError;

mod format_bindings;
mod spectrum_bindings;

pub(crate) fn to_py_err(err: SpectralError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Python module definition
#[pymodule]
fn spectral_stream(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<spectrum_bindings::PyStft>()?;
    m.add_class::<spectrum_bindings::PySlidingDft>()?;

    m.add_class::<format_bindings::PyWindowType>()?;
    m.add_class::<format_bindings::PySpectralFormat>()?;

    Ok(())
}
