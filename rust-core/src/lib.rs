//! Spectral Stream - streaming spectral analysis and resynthesis core
//!
//! Sliding sample windows, a frame DFT with zero-padded overlap-add, an STFT
//! with phase-vocoder (magnitude/frequency) frames, and a per-sample sliding
//! DFT. Optional Python bindings behind the `python` feature.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod audio;
pub mod domain;
pub mod error;
pub mod spectrum;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use audio::{DelayLine, SlidingWindow};
pub use domain::{Domain, DomainObserver};
pub use error::SpectralError;
pub use spectrum::{
    Dft, DftConfig, SlidingDft, SlidingDftConfig, SpectralFormat, SpectralFrame,
    SpectralTransform, Stft, StftConfig, WindowType,
};
