//! Python bindings for the streaming transforms

use numpy::{Complex32, Complex64, PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use super::format_bindings::{PySpectralFormat, PyWindowType};
use super::to_py_err;
use crate::spectrum::{SlidingDft, SlidingDftConfig, SpectralTransform, Stft, StftConfig};

fn contiguous<'a, T: numpy::Element>(array: &'a PyReadonlyArray1<T>) -> PyResult<&'a [T]> {
    array
        .as_slice()
        .map_err(|_| PyValueError::new_err("array must be contiguous"))
}

/// Short-time Fourier transform exposed to Python
#[pyclass(name = "Stft")]
pub struct PyStft {
    stft: Stft,
}

#[pymethods]
impl PyStft {
    /// Create a new STFT
    ///
    /// Args:
    ///     window_size: Samples per analysis window
    ///     hop_size: Samples between successive windows
    ///     pad_size: Zeros appended to each window
    ///     window_type: Analysis window shape
    ///     format: Spectral format of the frames
    ///     precise: Exact polar conversion
    ///     rotate_forward: Zero-phase windowing
    ///     inverse_window: Apply the window again before overlap-add
    ///     sample_rate: Sample rate in Hz
    #[new]
    #[pyo3(signature = (
        window_size=1024,
        hop_size=256,
        pad_size=0,
        window_type=PyWindowType::Rectangular,
        format=PySpectralFormat::Complex,
        precise=false,
        rotate_forward=false,
        inverse_window=false,
        sample_rate=48000.0
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        window_size: usize,
        hop_size: usize,
        pad_size: usize,
        window_type: PyWindowType,
        format: PySpectralFormat,
        precise: bool,
        rotate_forward: bool,
        inverse_window: bool,
        sample_rate: f64,
    ) -> PyResult<Self> {
        let config = StftConfig {
            window_size,
            hop_size,
            pad_size,
            window_type: window_type.into(),
            format: format.into(),
            num_aux: 0,
            precise,
            rotate_forward,
            inverse_window,
            sample_rate,
        };

        Ok(Self {
            stft: Stft::new(config).map_err(to_py_err)?,
        })
    }

    /// Stream a block through analysis and resynthesis
    ///
    /// Returns:
    ///     Output samples, delayed by one window
    fn process<'py>(
        &mut self,
        py: Python<'py>,
        signal: PyReadonlyArray1<f32>,
    ) -> PyResult<&'py PyArray1<f32>> {
        let input = contiguous(&signal)?;
        let output: Vec<f32> = input
            .iter()
            .map(|&x| {
                let y = self.stft.read_next();
                self.stft.feed(x);
                y
            })
            .collect();

        Ok(PyArray1::from_vec(py, output))
    }

    /// Push one sample; returns True when a new frame is ready
    fn feed(&mut self, sample: f32) -> bool {
        self.stft.feed(sample)
    }

    /// Pull one resynthesized sample
    fn read_next(&mut self) -> f32 {
        self.stft.read_next()
    }

    /// Whether the next read_next() resynthesizes the current frame
    fn inverse_on_next(&self) -> bool {
        self.stft.inverse_on_next()
    }

    /// Analyze one window of samples
    fn forward(&mut self, signal: PyReadonlyArray1<f32>) -> PyResult<()> {
        let input = contiguous(&signal)?;
        self.stft.forward(input);
        Ok(())
    }

    /// Resynthesize one hop from the current frame
    fn inverse<'py>(&mut self, py: Python<'py>) -> PyResult<&'py PyArray1<f32>> {
        let mut output = vec![0.0f32; self.stft.size_hop()];
        self.stft.inverse(Some(&mut output));
        Ok(PyArray1::from_vec(py, output))
    }

    /// Current bins as complex values (slot meaning depends on the format)
    fn bins<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray1<Complex32>> {
        Ok(PyArray1::from_slice(py, self.stft.bins()))
    }

    /// Overwrite the bins
    fn set_bins(&mut self, bins: PyReadonlyArray1<Complex32>) -> PyResult<()> {
        let bins = contiguous(&bins)?;
        let dst = self.stft.bins_mut();
        if bins.len() != dst.len() {
            return Err(PyValueError::new_err(format!(
                "expected {} bins, got {}",
                dst.len(),
                bins.len()
            )));
        }
        dst.copy_from_slice(bins);
        Ok(())
    }

    /// Zero the phase-vocoder state
    fn reset_phases(&mut self) {
        self.stft.reset_phases();
    }

    fn set_hop(&mut self, hop_size: usize) {
        self.stft.set_hop(hop_size);
    }

    fn set_window_type(&mut self, window_type: PyWindowType) {
        self.stft.set_window_type(window_type.into());
    }

    fn set_format(&mut self, format: PySpectralFormat) {
        self.stft.set_format(format.into());
    }

    fn resize(&mut self, window_size: usize, pad_size: usize) -> PyResult<()> {
        self.stft.resize(window_size, pad_size).map_err(to_py_err)
    }

    fn num_bins(&self) -> usize {
        self.stft.num_bins()
    }

    fn size_hop(&self) -> usize {
        self.stft.size_hop()
    }

    fn size_win(&self) -> usize {
        self.stft.size_win()
    }

    fn size_dft(&self) -> usize {
        self.stft.size_dft()
    }

    fn bin_freq(&self) -> f64 {
        self.stft.frame().bin_freq()
    }

    fn __repr__(&self) -> String {
        self.stft.to_string()
    }
}

/// Sliding DFT exposed to Python
#[pyclass(name = "SlidingDft")]
pub struct PySlidingDft {
    sdft: SlidingDft<f64>,
}

#[pymethods]
impl PySlidingDft {
    /// Create a new sliding DFT
    ///
    /// Args:
    ///     size_dft: Transform size
    ///     bin_lo: Lowest retained bin
    ///     bin_hi: One past the highest retained bin
    ///     sample_rate: Sample rate in Hz
    ///     resync_period: Exact recomputation period in samples (None: never)
    #[new]
    #[pyo3(signature = (size_dft=1024, bin_lo=0, bin_hi=513, sample_rate=48000.0, resync_period=None))]
    fn new(
        size_dft: usize,
        bin_lo: usize,
        bin_hi: usize,
        sample_rate: f64,
        resync_period: Option<usize>,
    ) -> PyResult<Self> {
        let config = SlidingDftConfig {
            size_dft,
            bin_lo,
            bin_hi,
            sample_rate,
            resync_period,
        };

        Ok(Self {
            sdft: SlidingDft::new(config).map_err(to_py_err)?,
        })
    }

    /// Push a block of samples
    fn process(&mut self, signal: PyReadonlyArray1<f64>) -> PyResult<()> {
        for &x in contiguous(&signal)? {
            self.sdft.forward(x);
        }
        Ok(())
    }

    /// Push one sample
    fn forward(&mut self, sample: f64) {
        self.sdft.forward(sample);
    }

    /// Current bins
    fn bins<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray1<Complex64>> {
        Ok(PyArray1::from_slice(py, self.sdft.bins()))
    }

    /// Bin magnitudes
    fn magnitudes<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray1<f64>> {
        let mags: Vec<f64> = self.sdft.bins().iter().map(|b| b.norm()).collect();
        Ok(PyArray1::from_vec(py, mags))
    }

    /// Set the retained bins [bin_lo, bin_hi)
    fn interval(&mut self, bin_lo: usize, bin_hi: usize) {
        self.sdft.interval(bin_lo, bin_hi);
    }

    /// Recompute the retained bins exactly
    fn resync(&mut self) {
        self.sdft.resync();
    }

    fn resize(&mut self, size_dft: usize, bin_lo: usize, bin_hi: usize) -> PyResult<()> {
        self.sdft.resize(size_dft, bin_lo, bin_hi).map_err(to_py_err)
    }

    fn reset(&mut self) {
        self.sdft.reset();
    }

    fn bin_lo(&self) -> usize {
        self.sdft.bin_lo()
    }

    fn bin_hi(&self) -> usize {
        self.sdft.bin_hi()
    }

    fn bin_freq(&self) -> f64 {
        self.sdft.bin_freq()
    }

    fn __repr__(&self) -> String {
        self.sdft.to_string()
    }
}
