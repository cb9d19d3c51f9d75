//! Short-time Fourier transform
//!
//! Windows of `window` samples are taken every `hop` samples, weighted by an
//! analysis window and transformed by an inner [`Dft`]. Resynthesized frames
//! are overlap-added at hop granularity. Reading before feeding,
//!
//! ```text
//! let y = stft.read_next();
//! stft.feed(x);
//! ```
//!
//! the output lags the input by exactly one window.
//!
//! In [`SpectralFormat::MagFreq`] the phase slot of each interior bin holds
//! the deviation, in Hz, of the bin's instantaneous frequency from its
//! center frequency (phase vocoder). Synthesis integrates those
//! frequencies back into per-bin phase accumulators.

use std::f64::consts::{PI, TAU};
use std::fmt;

use num_complex::Complex;

use super::dft::{load_window, Dft, DftConfig, SpectralTransform};
use super::fft::{RealFftKernel, TransformKernel};
use super::format::{wrap_phase, SpectralFormat};
use super::frame::SpectralFrame;
use super::windowing::{apply_window_inplace, overlap_add_gain, window_correction_factor};
use super::windows::{fill_window, WindowType};
use crate::audio::{buffer, SlidingWindow};
use crate::domain::{check_sample_rate, DomainObserver};
use crate::error::SpectralError;

/// STFT configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StftConfig {
    /// Samples per analysis window
    pub window_size: usize,

    /// Samples between successive windows (clamped into `[1, window_size]`)
    pub hop_size: usize,

    /// Zeros appended to each window
    pub pad_size: usize,

    /// Analysis window shape
    pub window_type: WindowType,

    /// Format of the spectral frame after `forward`
    pub format: SpectralFormat,

    /// Auxiliary per-bin buffers to allocate
    pub num_aux: usize,

    /// Exact polar conversion (slower)
    pub precise: bool,

    /// Circularly shift windowed samples by half a window (zero-phase)
    pub rotate_forward: bool,

    /// Apply the analysis window again before overlap-add
    pub inverse_window: bool,

    /// Sample rate in Hz
    pub sample_rate: f64,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            hop_size: 256,
            pad_size: 0,
            window_type: WindowType::Rectangular,
            format: SpectralFormat::Complex,
            num_aux: 0,
            precise: false,
            rotate_forward: false,
            inverse_window: false,
            sample_rate: 48000.0,
        }
    }
}

/// Short-time Fourier transform with overlap-add resynthesis
pub struct Stft<K: TransformKernel = RealFftKernel> {
    dft: Dft<K>,
    slide: SlidingWindow,

    window_type: WindowType,

    /// Analysis window table, `window` samples
    fwd_win: Vec<f32>,

    /// Analysis gain correction, `window / Σw`
    fwd_mul: f32,

    /// Overlap-add normalization
    inv_mul: f32,

    inverse_window: bool,
    rotate_forward: bool,

    /// Last analysis phase per bin (MagFreq)
    phases: Vec<f32>,

    /// Synthesis phase accumulator per bin (MagFreq)
    accums: Vec<f64>,

    /// A frame was analyzed since the phase state was last cleared
    primed: bool,

    /// Overlap-add accumulator, `size_dft` samples
    ola: Vec<f32>,

    /// Completed output; the first `hop` samples are valid
    output: Vec<f32>,

    tap_r: usize,
}

impl Stft<RealFftKernel> {
    /// Create an STFT using the `realfft` kernel
    pub fn new(config: StftConfig) -> Result<Self, SpectralError> {
        let size_dft = config.window_size.max(1) + config.pad_size;
        let kernel = RealFftKernel::new(size_dft)?;
        Self::with_kernel(config, kernel)
    }
}

impl<K: TransformKernel> Stft<K> {
    /// Create an STFT driving a custom kernel
    pub fn with_kernel(config: StftConfig, kernel: K) -> Result<Self, SpectralError> {
        let dft = Dft::with_kernel(
            DftConfig {
                window_size: config.window_size,
                pad_size: config.pad_size,
                format: config.format,
                num_aux: config.num_aux,
                precise: config.precise,
                sample_rate: config.sample_rate,
            },
            kernel,
        )?;
        let slide = SlidingWindow::new(dft.size_win(), config.hop_size)?;

        let mut stft = Self {
            dft,
            slide,
            window_type: config.window_type,
            fwd_win: Vec::new(),
            fwd_mul: 1.0,
            inv_mul: 1.0,
            inverse_window: config.inverse_window,
            rotate_forward: config.rotate_forward,
            phases: Vec::new(),
            accums: Vec::new(),
            primed: false,
            ola: Vec::new(),
            output: Vec::new(),
            tap_r: 0,
        };
        stft.allocate()?;
        Ok(stft)
    }

    /// Set window and zero-padding size, in samples
    ///
    /// The hop is kept (clamped to the new window). All window, phase and
    /// overlap-add state is discarded.
    pub fn resize(&mut self, window: usize, pad: usize) -> Result<(), SpectralError> {
        self.dft.resize(window, pad)?;
        let hop = self.slide.size_hop();
        self.slide.resize(self.dft.size_win(), hop)?;
        self.allocate()
    }

    /// (Re)allocate the buffers sized by the inner transform
    fn allocate(&mut self) -> Result<(), SpectralError> {
        let window = self.dft.size_win();
        let num_bins = self.dft.num_bins();

        buffer::refill(&mut self.fwd_win, window, 0.0, "STFT analysis window")?;
        fill_window(self.window_type, &mut self.fwd_win);
        buffer::refill(&mut self.phases, num_bins, 0.0, "STFT analysis phases")?;
        buffer::refill(&mut self.accums, num_bins, 0.0, "STFT phase accumulators")?;
        self.primed = false;
        buffer::refill(&mut self.ola, self.dft.size_dft(), 0.0, "STFT overlap-add")?;
        buffer::refill(&mut self.output, window, 0.0, "STFT output")?;

        self.tap_r = self.slide.size_hop() - 1;
        self.update_gains();

        log::debug!(
            "STFT resized: window={} hop={} pad={} window_type={}",
            window,
            self.slide.size_hop(),
            self.dft.size_pad(),
            self.window_type
        );
        Ok(())
    }

    /// Recompute the analysis and overlap-add gains
    fn update_gains(&mut self) {
        let fwd_mul = window_correction_factor(&self.fwd_win);
        let synthesis = if self.inverse_window {
            Some(&self.fwd_win[..])
        } else {
            None
        };
        let gain = fwd_mul * overlap_add_gain(&self.fwd_win, synthesis, self.slide.size_hop());

        self.fwd_mul = fwd_mul as f32;
        self.inv_mul = if gain > 0.0 { (1.0 / gain) as f32 } else { 1.0 };
    }

    /// Apply a new configuration
    ///
    /// Only a change of window or padding size discards state.
    pub fn update_config(&mut self, config: StftConfig) -> Result<(), SpectralError> {
        let sample_rate = check_sample_rate(config.sample_rate)?;
        if config.window_size.max(1) != self.size_win() || config.pad_size != self.size_pad() {
            self.resize(config.window_size, config.pad_size)?;
        }
        if config.num_aux != self.dft.frame().num_aux() {
            self.dft.frame_mut().set_num_aux(config.num_aux)?;
        }
        if config.hop_size != self.size_hop() {
            self.set_hop(config.hop_size);
        }
        self.window_type = config.window_type;
        fill_window(self.window_type, &mut self.fwd_win);
        self.inverse_window = config.inverse_window;
        self.rotate_forward = config.rotate_forward;
        self.update_gains();

        self.dft.set_format(config.format);
        self.dft.set_precise(config.precise);
        self.on_domain_change(sample_rate);
        Ok(())
    }

    /// Current configuration
    pub fn config(&self) -> StftConfig {
        StftConfig {
            window_size: self.size_win(),
            hop_size: self.size_hop(),
            pad_size: self.size_pad(),
            window_type: self.window_type,
            format: self.dft.format(),
            num_aux: self.dft.frame().num_aux(),
            precise: self.dft.precise(),
            rotate_forward: self.rotate_forward,
            inverse_window: self.inverse_window,
            sample_rate: self.dft.sample_rate(),
        }
    }

    /// Set hop size, in samples (clamped into `[1, window]`)
    ///
    /// Window contents are kept; hop counting and the output restart.
    pub fn set_hop(&mut self, hop: usize) {
        self.slide.set_hop(hop);
        self.tap_r = self.slide.size_hop() - 1;
        self.update_gains();
        log::debug!("STFT hop set to {}", self.slide.size_hop());
    }

    /// Set the analysis window shape
    pub fn set_window_type(&mut self, window_type: WindowType) {
        self.window_type = window_type;
        fill_window(window_type, &mut self.fwd_win);
        self.update_gains();
        log::debug!("STFT window type set to {}", window_type);
    }

    /// Whether to apply the analysis window to resynthesized frames
    ///
    /// The synthesis window has the analysis shape (not a fixed triangle),
    /// and the overlap-add gain is recomputed for the product of the two.
    pub fn set_inverse_windowing(&mut self, enabled: bool) {
        self.inverse_window = enabled;
        self.update_gains();
    }

    /// Whether to rotate windowed samples by half a window before the
    /// forward transform
    pub fn set_rotate_forward(&mut self, enabled: bool) {
        self.rotate_forward = enabled;
    }

    pub fn set_format(&mut self, format: SpectralFormat) {
        self.dft.set_format(format);
    }

    pub fn set_precise(&mut self, precise: bool) {
        self.dft.set_precise(precise);
    }

    /// Push one sample
    ///
    /// # Returns
    /// `true` when a hop completed and a new frame was analyzed
    pub fn feed(&mut self, input: f32) -> bool {
        if self.slide.feed_into(self.dft.input_mut(), input) {
            self.dft.load_input();
            self.analyze();
            return true;
        }
        false
    }

    /// Pull one resynthesized sample
    ///
    /// The inverse runs on the first call and then once every hop.
    pub fn read_next(&mut self) -> f32 {
        self.tap_r += 1;
        if self.tap_r >= self.slide.size_hop() {
            self.tap_r = 0;
            self.inverse(None);
        }
        self.output[self.tap_r]
    }

    /// Whether the next `read_next` runs the inverse transform
    pub fn inverse_on_next(&self) -> bool {
        self.tap_r + 1 >= self.slide.size_hop()
    }

    /// Zero the analysis phases and synthesis accumulators
    pub fn reset_phases(&mut self) {
        self.phases.fill(0.0);
        self.accums.fill(0.0);
        self.primed = false;
    }

    /// Analysis phases of the last frame (MagFreq only)
    pub fn phases(&self) -> &[f32] {
        &self.phases
    }

    /// Synthesis phase accumulators (MagFreq only)
    pub fn accum_phases(&self) -> &[f64] {
        &self.accums
    }

    /// Window the kernel buffer, transform it, then derive frequencies
    fn analyze(&mut self) {
        let window = self.fwd_win.len();
        let fwd_mul = self.fwd_mul;
        let time = self.dft.time_mut();

        for (t, &w) in time[..window].iter_mut().zip(&self.fwd_win) {
            *t *= w * fwd_mul;
        }
        if self.rotate_forward {
            time[..window].rotate_left(window / 2);
        }

        self.dft.transform_time();

        if self.dft.format() == SpectralFormat::MagFreq {
            self.analyze_frequencies();
        }
    }

    /// Replace each interior bin's phase by its frequency deviation in Hz
    fn analyze_frequencies(&mut self) {
        let size_dft = self.dft.size_dft();
        let hop = self.slide.size_hop();
        let to_hz = self.dft.sample_rate() / (TAU * hop as f64);
        let interior = interior_bins(size_dft);

        // Accumulators start at the first analyzed frame
        if !self.primed {
            self.accums.fill(0.0);
            self.primed = true;
        }

        let bins = self.dft.frame_mut().bins_mut();
        for k in interior {
            let phase = bins[k].im;
            let expected = expected_advance(k, hop, size_dft) as f32;
            let deviation = wrap_phase(phase - self.phases[k] - expected);
            self.phases[k] = phase;
            bins[k].im = (deviation as f64 * to_hz) as f32;
        }
    }

    /// Integrate bin frequencies into the accumulators and write
    /// rectangular bins into the inverse scratch
    fn synthesize_frequencies(&mut self) {
        let size_dft = self.dft.size_dft();
        let hop = self.slide.size_hop();
        let to_rad = TAU * hop as f64 / self.dft.sample_rate();
        let interior = interior_bins(size_dft);
        let last = self.dft.num_bins() - 1;

        let (bins, scratch) = self.dft.bins_and_scratch();
        scratch[0] = Complex::new(bins[0].re, 0.0);
        if size_dft % 2 == 0 {
            scratch[last] = Complex::new(bins[last].re, 0.0);
        }

        for k in interior {
            let advance = expected_advance(k, hop, size_dft) + bins[k].im as f64 * to_rad;
            let accum = wrap_accum(self.accums[k] + advance);
            self.accums[k] = accum;
            scratch[k] = Complex::from_polar(bins[k].re, accum as f32);
        }
    }

    /// Spectral frame
    pub fn frame(&self) -> &SpectralFrame<f32> {
        self.dft.frame()
    }

    /// Spectral frame, mutable
    pub fn frame_mut(&mut self) -> &mut SpectralFrame<f32> {
        self.dft.frame_mut()
    }

    pub fn bin(&self, k: usize) -> Complex<f32> {
        self.dft.bin(k)
    }

    pub fn bins(&self) -> &[Complex<f32>] {
        self.dft.bins()
    }

    pub fn bins_mut(&mut self) -> &mut [Complex<f32>] {
        self.dft.bins_mut()
    }

    pub fn num_bins(&self) -> usize {
        self.dft.num_bins()
    }

    /// Last completed hop of output
    pub fn output(&self) -> &[f32] {
        &self.output[..self.slide.size_hop()]
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn format(&self) -> SpectralFormat {
        self.dft.format()
    }

    pub fn inverse_windowing(&self) -> bool {
        self.inverse_window
    }

    pub fn rotate_forward(&self) -> bool {
        self.rotate_forward
    }

    /// Frequency resolution of the analysis, `sample_rate / window` Hz
    pub fn freq_res(&self) -> f64 {
        self.dft.freq_res()
    }

    /// Window-to-hop ratio
    pub fn overlap(&self) -> f64 {
        self.size_win() as f64 / self.size_hop() as f64
    }

    /// Whether successive windows overlap
    pub fn overlapping(&self) -> bool {
        self.size_hop() < self.size_win()
    }

    pub fn size_hop(&self) -> usize {
        self.slide.size_hop()
    }

    pub fn size_pad(&self) -> usize {
        self.dft.size_pad()
    }

    pub fn size_win(&self) -> usize {
        self.dft.size_win()
    }

    pub fn size_dft(&self) -> usize {
        self.dft.size_dft()
    }

    /// Frames per second
    pub fn hop_rate(&self) -> f64 {
        self.dft.sample_rate() / self.size_hop() as f64
    }

    /// Hop duration in seconds
    pub fn units_hop(&self) -> f64 {
        self.size_hop() as f64 / self.dft.sample_rate()
    }

    pub fn sample_rate(&self) -> f64 {
        self.dft.sample_rate()
    }
}

impl<K: TransformKernel> SpectralTransform for Stft<K> {
    fn forward(&mut self, samples: &[f32]) {
        let window = self.size_win();
        let n = samples.len().min(window);
        load_window(self.dft.time_mut(), &samples[..n]);
        self.analyze();
    }

    fn inverse(&mut self, dst: Option<&mut [f32]>) {
        if self.dft.format() == SpectralFormat::MagFreq {
            self.synthesize_frequencies();
        } else {
            self.dft.load_scratch();
        }
        self.dft.inverse_kernel();

        let window = self.fwd_win.len();
        let time = self.dft.time_mut();
        if self.rotate_forward {
            time[..window].rotate_right(window / 2);
        }
        if self.inverse_window {
            apply_window_inplace(&mut time[..window], &self.fwd_win);
        }

        let inv_mul = self.inv_mul;
        for (acc, &t) in self.ola.iter_mut().zip(time.iter()) {
            *acc += t * inv_mul;
        }

        let hop = self.slide.size_hop();
        self.output[..hop].copy_from_slice(&self.ola[..hop]);
        self.ola.copy_within(hop.., 0);
        let len = self.ola.len();
        self.ola[len - hop..].fill(0.0);

        if let Some(dst) = dst {
            let n = dst.len().min(hop);
            dst[..n].copy_from_slice(&self.output[..n]);
        }
    }
}

impl<K: TransformKernel> DomainObserver for Stft<K> {
    fn on_domain_change(&mut self, sample_rate: f64) {
        // Hz conversions read the rate on every frame; only the bin width
        // is cached
        self.dft.on_domain_change(sample_rate);
    }
}

impl<K: TransformKernel> fmt::Display for Stft<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "STFT: window {}, hop {}, pad {}, size {}, {} bins, {:.3} Hz/bin, {} window, {}",
            self.size_win(),
            self.size_hop(),
            self.size_pad(),
            self.size_dft(),
            self.num_bins(),
            self.frame().bin_freq(),
            self.window_type,
            self.format()
        )
    }
}

/// Bins with a phase: all but DC and (for even sizes) Nyquist
fn interior_bins(size_dft: usize) -> std::ops::Range<usize> {
    let num_bins = size_dft / 2 + 1;
    let end = if size_dft % 2 == 0 { num_bins - 1 } else { num_bins };
    1.min(end)..end
}

/// Phase advance of bin `k` over one hop, reduced to [0, 2π)
#[inline]
fn expected_advance(k: usize, hop: usize, size_dft: usize) -> f64 {
    TAU * ((k * hop) % size_dft) as f64 / size_dft as f64
}

/// Wrap into [-π, π)
#[inline]
fn wrap_accum(phase: f64) -> f64 {
    phase - TAU * ((phase + PI) / TAU).floor()
}
