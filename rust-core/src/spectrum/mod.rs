//! Spectral analysis and resynthesis

pub mod dft;
pub mod fft;
pub mod format;
pub mod frame;
pub mod sliding_dft;
pub mod stft;
pub mod windowing;
pub mod windows;

pub use dft::{Dft, DftConfig, SpectralTransform};
pub use fft::{RealFftKernel, TransformKernel};
pub use format::SpectralFormat;
pub use frame::{Real, SpectralFrame};
pub use sliding_dft::{SlidingDft, SlidingDftConfig};
pub use stft::{Stft, StftConfig};
pub use windows::{generate_window, WindowType};
