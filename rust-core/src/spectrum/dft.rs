//! Frame-based discrete Fourier transform with overlap-add resynthesis
//!
//! A `Dft` collects `window` samples, transforms them (zero-padded to
//! `window + pad`) into a [`SpectralFrame`], and resynthesizes one window of
//! samples per inverse. Energy that an edited spectrum spreads into the
//! padded region is carried over and added to the next output block.
//!
//! When `read_next` is called before `feed` for every sample, output sample
//! `t` is input sample `t - window`.

use std::fmt;

use num_complex::Complex;

use super::fft::{RealFftKernel, TransformKernel};
use super::format::{self, SpectralFormat};
use super::frame::SpectralFrame;
use crate::audio::buffer;
use crate::domain::{check_sample_rate, DomainObserver};
use crate::error::SpectralError;

/// Forward/inverse pair shared by the frame and streaming transforms
pub trait SpectralTransform {
    /// Transform one window of samples into the spectral frame
    ///
    /// Missing samples (short `samples`) are treated as zeros.
    fn forward(&mut self, samples: &[f32]);

    /// Resynthesize samples from the current spectral frame
    ///
    /// With `dst` absent the result stays in the internal output buffer
    /// (read it with `read_next`).
    fn inverse(&mut self, dst: Option<&mut [f32]>);
}

/// DFT configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DftConfig {
    /// Samples per analysis window
    pub window_size: usize,

    /// Zeros appended to each window
    pub pad_size: usize,

    /// Format of the spectral frame after `forward`
    pub format: SpectralFormat,

    /// Auxiliary per-bin buffers to allocate
    pub num_aux: usize,

    /// Exact polar conversion (slower)
    pub precise: bool,

    /// Sample rate in Hz
    pub sample_rate: f64,
}

impl Default for DftConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            pad_size: 0,
            format: SpectralFormat::Complex,
            num_aux: 0,
            precise: false,
            sample_rate: 48000.0,
        }
    }
}

/// Discrete Fourier transform of non-overlapping windows
pub struct Dft<K: TransformKernel = RealFftKernel> {
    kernel: K,
    frame: SpectralFrame<f32>,
    format: SpectralFormat,
    precise: bool,

    /// Samples collected by `feed`, one window
    input: Vec<f32>,

    /// Kernel input/output, `size_dft` samples
    time: Vec<f32>,

    /// Rectangular copy of the bins for the inverse
    scratch: Vec<Complex<f32>>,

    /// Spill of the zero-padded region, `pad` samples
    pad_ola: Vec<f32>,

    /// Last resynthesized window
    output: Vec<f32>,

    tap_w: usize,
    tap_r: usize,
}

impl Dft<RealFftKernel> {
    /// Create a transform using the `realfft` kernel
    pub fn new(config: DftConfig) -> Result<Self, SpectralError> {
        let size_dft = config.window_size.max(1) + config.pad_size;
        let kernel = RealFftKernel::new(size_dft)?;
        Self::with_kernel(config, kernel)
    }
}

impl<K: TransformKernel> Dft<K> {
    /// Create a transform driving a custom kernel
    ///
    /// The kernel is re-planned to `window_size + pad_size`.
    pub fn with_kernel(config: DftConfig, kernel: K) -> Result<Self, SpectralError> {
        let sample_rate = check_sample_rate(config.sample_rate)?;
        let mut dft = Self {
            kernel,
            frame: SpectralFrame::new(1, config.num_aux, sample_rate)?,
            format: config.format,
            precise: config.precise,
            input: Vec::new(),
            time: Vec::new(),
            scratch: Vec::new(),
            pad_ola: Vec::new(),
            output: Vec::new(),
            tap_w: 0,
            tap_r: 0,
        };
        dft.resize(config.window_size, config.pad_size)?;
        Ok(dft)
    }

    /// Set window and zero-padding size, in samples
    ///
    /// Reallocates every buffer and discards all frame state. A window of 0
    /// is clamped to 1.
    pub fn resize(&mut self, window: usize, pad: usize) -> Result<(), SpectralError> {
        let window = if window == 0 {
            log::warn!("DFT window size 0 clamped to 1");
            1
        } else {
            window
        };
        let size_dft = window + pad;

        if self.kernel.size() != size_dft {
            self.kernel.resize(size_dft)?;
        }
        self.frame.resize(size_dft)?;
        let num_bins = self.frame.num_bins();

        buffer::refill(&mut self.input, window, 0.0, "DFT input")?;
        buffer::refill(&mut self.time, size_dft, 0.0, "DFT transform buffer")?;
        buffer::refill(&mut self.scratch, num_bins, Complex::new(0.0, 0.0), "DFT inverse bins")?;
        buffer::refill(&mut self.pad_ola, pad, 0.0, "DFT padding overlap-add")?;
        buffer::refill(&mut self.output, window, 0.0, "DFT output")?;

        self.tap_w = 0;
        self.tap_r = window - 1;

        log::debug!(
            "DFT resized: window={} pad={} size={} bins={}",
            window,
            pad,
            size_dft,
            num_bins
        );
        Ok(())
    }

    /// Apply a new configuration
    ///
    /// Buffers are only reallocated (and state discarded) when the window or
    /// padding size changes.
    pub fn update_config(&mut self, config: DftConfig) -> Result<(), SpectralError> {
        let sample_rate = check_sample_rate(config.sample_rate)?;
        if config.window_size.max(1) != self.size_win() || config.pad_size != self.size_pad() {
            self.resize(config.window_size, config.pad_size)?;
        }
        if config.num_aux != self.frame.num_aux() {
            self.frame.set_num_aux(config.num_aux)?;
        }
        self.set_format(config.format);
        self.set_precise(config.precise);
        self.frame.on_domain_change(sample_rate);
        Ok(())
    }

    /// Current configuration
    pub fn config(&self) -> DftConfig {
        DftConfig {
            window_size: self.size_win(),
            pad_size: self.size_pad(),
            format: self.format,
            num_aux: self.frame.num_aux(),
            precise: self.precise,
            sample_rate: self.frame.sample_rate(),
        }
    }

    /// Set the format of spectra produced by subsequent forward transforms
    ///
    /// Bins already in the frame are not converted.
    pub fn set_format(&mut self, format: SpectralFormat) {
        if format != self.format {
            log::debug!("DFT spectral format: {} -> {}", self.format, format);
        }
        self.format = format;
    }

    /// Use exact (slower) polar conversion
    pub fn set_precise(&mut self, precise: bool) {
        self.precise = precise;
    }

    /// Push one sample
    ///
    /// # Returns
    /// `true` when a window was completed and transformed
    pub fn feed(&mut self, input: f32) -> bool {
        self.input[self.tap_w] = input;
        self.tap_w += 1;

        if self.tap_w == self.input.len() {
            self.tap_w = 0;
            self.forward_input();
            return true;
        }
        false
    }

    /// Pull one resynthesized sample
    ///
    /// An inverse transform of the current frame runs on the first call and
    /// then once every hop.
    pub fn read_next(&mut self) -> f32 {
        self.tap_r += 1;
        if self.tap_r == self.output.len() {
            self.tap_r = 0;
            self.inverse(None);
        }
        self.output[self.tap_r]
    }

    /// Whether the next `read_next` runs the inverse transform
    ///
    /// Bins written now are the ones resynthesized next.
    pub fn inverse_on_next(&self) -> bool {
        self.tap_r + 1 == self.output.len()
    }

    /// Convert the frame to rectangular form in place
    pub fn to_rect(&mut self) {
        let last_is_real = self.last_is_real();
        format::to_rect(self.frame.bins_mut(), last_is_real);
    }

    /// Convert the frame to (magnitude, phase) in place
    pub fn to_polar(&mut self) {
        let last_is_real = self.last_is_real();
        format::to_polar(self.frame.bins_mut(), last_is_real, self.precise);
    }

    /// Spectral frame
    pub fn frame(&self) -> &SpectralFrame<f32> {
        &self.frame
    }

    /// Spectral frame, mutable
    pub fn frame_mut(&mut self) -> &mut SpectralFrame<f32> {
        &mut self.frame
    }

    /// Read bin `k` (see [`SpectralFrame::bin`])
    pub fn bin(&self, k: usize) -> Complex<f32> {
        self.frame.bin(k)
    }

    pub fn bins(&self) -> &[Complex<f32>] {
        self.frame.bins()
    }

    pub fn bins_mut(&mut self) -> &mut [Complex<f32>] {
        self.frame.bins_mut()
    }

    pub fn num_bins(&self) -> usize {
        self.frame.num_bins()
    }

    /// Last resynthesized window
    pub fn output(&self) -> &[f32] {
        &self.output
    }

    pub fn format(&self) -> SpectralFormat {
        self.format
    }

    pub fn precise(&self) -> bool {
        self.precise
    }

    /// Frequency resolution of the analysis, `sample_rate / window` Hz
    pub fn freq_res(&self) -> f64 {
        self.frame.sample_rate() / self.size_win() as f64
    }

    /// Window-to-hop ratio (always 1 for a plain DFT)
    pub fn overlap(&self) -> f64 {
        1.0
    }

    /// Whether successive windows overlap
    pub fn overlapping(&self) -> bool {
        false
    }

    /// Samples between forward transforms (the window size)
    pub fn size_hop(&self) -> usize {
        self.size_win()
    }

    pub fn size_pad(&self) -> usize {
        self.pad_ola.len()
    }

    pub fn size_win(&self) -> usize {
        self.input.len()
    }

    pub fn size_dft(&self) -> usize {
        self.time.len()
    }

    /// Forward transforms per second
    pub fn hop_rate(&self) -> f64 {
        self.frame.sample_rate() / self.size_hop() as f64
    }

    pub fn sample_rate(&self) -> f64 {
        self.frame.sample_rate()
    }

    fn last_is_real(&self) -> bool {
        self.time.len() % 2 == 0
    }

    fn forward_input(&mut self) {
        self.load_input();
        self.transform_time();
    }

    /// Copy back the padded overlap-add spill and store the new one
    fn fold_padding(&mut self) {
        let pad = self.pad_ola.len();
        if pad == 0 {
            return;
        }
        let window = self.output.len();

        let head = pad.min(window);
        for (t, &p) in self.time[..head].iter_mut().zip(&self.pad_ola[..head]) {
            *t += p;
        }

        // Spill reaching past the next block moves up by one block
        if pad > window {
            self.pad_ola.copy_within(window.., 0);
            self.pad_ola[pad - window..].fill(0.0);
        } else {
            self.pad_ola.fill(0.0);
        }

        for (p, &t) in self.pad_ola.iter_mut().zip(&self.time[window..]) {
            *p += t;
        }
    }

    // Stages shared with `Stft`, which windows and overlap-adds on its own

    /// Window buffer filled by the streaming front end
    pub(crate) fn input_mut(&mut self) -> &mut [f32] {
        &mut self.input
    }

    /// Copy the collected window into the kernel buffer, zero-padded
    pub(crate) fn load_input(&mut self) {
        load_window(&mut self.time, &self.input);
    }

    /// Kernel buffer, `size_dft` samples
    pub(crate) fn time_mut(&mut self) -> &mut [f32] {
        &mut self.time
    }

    /// Run the kernel on the time buffer and convert to a polar format if
    /// one is configured
    pub(crate) fn transform_time(&mut self) {
        self.kernel.forward(&mut self.time, self.frame.bins_mut());
        if self.format.is_polar() {
            let last_is_real = self.last_is_real();
            format::to_polar(self.frame.bins_mut(), last_is_real, self.precise);
        }
    }

    /// Copy the bins into the inverse scratch, in rectangular form
    pub(crate) fn load_scratch(&mut self) {
        self.scratch.copy_from_slice(self.frame.bins());
        if self.format.is_polar() {
            let last_is_real = self.last_is_real();
            format::to_rect(&mut self.scratch, last_is_real);
        }
    }

    /// Frame bins and inverse scratch, for custom synthesis
    pub(crate) fn bins_and_scratch(&mut self) -> (&[Complex<f32>], &mut [Complex<f32>]) {
        (self.frame.bins(), &mut self.scratch)
    }

    /// Scale the scratch by 2/N and synthesize into the time buffer
    pub(crate) fn inverse_kernel(&mut self) {
        let norm = 2.0 / self.time.len() as f32;
        for bin in self.scratch.iter_mut() {
            *bin *= norm;
        }
        self.kernel.inverse(&mut self.scratch, &mut self.time);
    }
}

impl<K: TransformKernel> SpectralTransform for Dft<K> {
    fn forward(&mut self, samples: &[f32]) {
        load_window(&mut self.time, samples);
        self.transform_time();
    }

    fn inverse(&mut self, dst: Option<&mut [f32]>) {
        self.load_scratch();
        self.inverse_kernel();
        self.fold_padding();

        let window = self.output.len();
        self.output.copy_from_slice(&self.time[..window]);
        if let Some(dst) = dst {
            let n = dst.len().min(window);
            dst[..n].copy_from_slice(&self.output[..n]);
        }
    }
}

impl<K: TransformKernel> DomainObserver for Dft<K> {
    fn on_domain_change(&mut self, sample_rate: f64) {
        self.frame.on_domain_change(sample_rate);
    }
}

impl<K: TransformKernel> fmt::Display for Dft<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DFT: window {}, pad {}, size {}, {} bins, {:.3} Hz/bin, {}",
            self.size_win(),
            self.size_pad(),
            self.size_dft(),
            self.num_bins(),
            self.frame.bin_freq(),
            self.format
        )
    }
}

/// Copy up to `time.len()` samples and zero the rest
pub(crate) fn load_window(time: &mut [f32], samples: &[f32]) {
    let n = samples.len().min(time.len());
    time[..n].copy_from_slice(&samples[..n]);
    time[n..].fill(0.0);
}
