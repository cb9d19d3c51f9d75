//! Python enums for window shapes and spectral formats

use pyo3::prelude::*;

use crate::spectrum::{SpectralFormat, WindowType};

/// Window type enum exposed to Python
#[pyclass(name = "WindowType")]
#[derive(Clone)]
pub enum PyWindowType {
    Rectangular,
    Bartlett,
    Hann,
    Hamming,
    Blackman,
    BlackmanHarris,
    Welch,
}

impl From<PyWindowType> for WindowType {
    fn from(py_win: PyWindowType) -> Self {
        match py_win {
            PyWindowType::Rectangular => WindowType::Rectangular,
            PyWindowType::Bartlett => WindowType::Bartlett,
            PyWindowType::Hann => WindowType::Hann,
            PyWindowType::Hamming => WindowType::Hamming,
            PyWindowType::Blackman => WindowType::Blackman,
            PyWindowType::BlackmanHarris => WindowType::BlackmanHarris,
            PyWindowType::Welch => WindowType::Welch,
        }
    }
}

/// Spectral format enum exposed to Python
#[pyclass(name = "SpectralFormat")]
#[derive(Clone)]
pub enum PySpectralFormat {
    Complex,
    MagPhase,
    MagFreq,
}

impl From<PySpectralFormat> for SpectralFormat {
    fn from(py_format: PySpectralFormat) -> Self {
        match py_format {
            PySpectralFormat::Complex => SpectralFormat::Complex,
            PySpectralFormat::MagPhase => SpectralFormat::MagPhase,
            PySpectralFormat::MagFreq => SpectralFormat::MagFreq,
        }
    }
}
