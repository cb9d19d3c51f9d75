//! Sliding DFT: per-sample spectrum over a band of bins
//!
//! Each retained bin is a complex resonator updated on every input sample
//! from the difference between the newest sample and the one leaving the
//! window:
//!
//! ```text
//! d    = (x(n) - x(n - N)) · 2/N
//! X_k ← X_k · e^{j2πk/N} + d
//! ```
//!
//! After `N` samples each bin equals `2/N · Σ_{i<N} x(n-i)·e^{j2πki/N}`, so a
//! cosine of amplitude `A` centered on bin `k` reads `|X_k| = A`. Cost per
//! sample is proportional to the number of retained bins, not to `N`.
//!
//! Rounding in the recursion accumulates slowly. [`SlidingDft::resync`]
//! recomputes the retained bins exactly from the delay-line history and can
//! be scheduled automatically with [`SlidingDft::set_resync_period`].

use std::f64::consts::TAU;
use std::fmt;

use num_complex::Complex;

use super::frame::{Real, SpectralFrame};
use crate::audio::{buffer, DelayLine};
use crate::domain::{check_sample_rate, DomainObserver};
use crate::error::SpectralError;

/// Sliding DFT configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingDftConfig {
    /// Transform size N
    pub size_dft: usize,

    /// Lowest retained bin (inclusive)
    pub bin_lo: usize,

    /// Highest retained bin (exclusive)
    pub bin_hi: usize,

    /// Sample rate in Hz
    pub sample_rate: f64,

    /// Recompute the bins exactly every this many samples
    pub resync_period: Option<usize>,
}

impl Default for SlidingDftConfig {
    fn default() -> Self {
        Self {
            size_dft: 1024,
            bin_lo: 0,
            bin_hi: 513,
            sample_rate: 48000.0,
            resync_period: None,
        }
    }
}

/// Recursive resonator bank over bins `[bin_lo, bin_hi)`
pub struct SlidingDft<T: Real = f64> {
    frame: SpectralFrame<T>,

    /// Last N input samples
    delay: DelayLine<T>,

    bin_lo: usize,
    bin_hi: usize,

    /// e^{j2πm/N} for m in 0..N
    twiddles: Vec<Complex<T>>,

    /// Rotator of the lowest retained bin
    low: Complex<T>,

    /// Rotator step between adjacent bins
    step: Complex<T>,

    /// 2/N
    norm: T,

    resync_period: Option<usize>,
    since_resync: usize,
}

impl<T: Real> SlidingDft<T> {
    pub fn new(config: SlidingDftConfig) -> Result<Self, SpectralError> {
        let sample_rate = check_sample_rate(config.sample_rate)?;
        let zero = Complex::new(T::zero(), T::zero());
        let mut sdft = Self {
            frame: SpectralFrame::new(1, 0, sample_rate)?,
            delay: DelayLine::new(1)?,
            bin_lo: 0,
            bin_hi: 1,
            twiddles: Vec::new(),
            low: zero,
            step: zero,
            norm: T::one(),
            resync_period: None,
            since_resync: 0,
        };
        sdft.set_resync_period(config.resync_period);
        sdft.resize(config.size_dft, config.bin_lo, config.bin_hi)?;
        Ok(sdft)
    }

    /// Reallocate for a new transform size and interval
    ///
    /// All resonator and delay-line state is discarded. A size of 0 is
    /// clamped to 1.
    pub fn resize(&mut self, size_dft: usize, bin_lo: usize, bin_hi: usize) -> Result<(), SpectralError> {
        let size_dft = if size_dft == 0 {
            log::warn!("sliding DFT size 0 clamped to 1");
            1
        } else {
            size_dft
        };

        self.frame.resize(size_dft)?;
        self.delay.resize(size_dft)?;

        let zero = Complex::new(T::zero(), T::zero());
        buffer::refill(&mut self.twiddles, size_dft, zero, "sliding DFT twiddles")?;
        for (m, w) in self.twiddles.iter_mut().enumerate() {
            let angle = TAU * m as f64 / size_dft as f64;
            *w = Complex::new(T::cast(angle.cos()), T::cast(angle.sin()));
        }
        self.norm = T::cast(2.0 / size_dft as f64);
        self.since_resync = 0;

        // Empty history: every bin starts (and stays) exactly zero
        self.set_interval(bin_lo, bin_hi, false);

        log::debug!(
            "sliding DFT resized: size={} bins=[{}, {})",
            size_dft,
            self.bin_lo,
            self.bin_hi
        );
        Ok(())
    }

    /// Apply a new configuration
    ///
    /// State is discarded only when the transform size changes.
    pub fn update_config(&mut self, config: SlidingDftConfig) -> Result<(), SpectralError> {
        let sample_rate = check_sample_rate(config.sample_rate)?;
        self.set_resync_period(config.resync_period);
        if config.size_dft.max(1) != self.size_dft() {
            self.resize(config.size_dft, config.bin_lo, config.bin_hi)?;
        } else {
            self.interval(config.bin_lo, config.bin_hi);
        }
        self.frame.on_domain_change(sample_rate);
        Ok(())
    }

    /// Current configuration
    pub fn config(&self) -> SlidingDftConfig {
        SlidingDftConfig {
            size_dft: self.size_dft(),
            bin_lo: self.bin_lo,
            bin_hi: self.bin_hi,
            sample_rate: self.frame.sample_rate(),
            resync_period: self.resync_period,
        }
    }

    /// Set the retained bins `[bin_lo, bin_hi)`
    ///
    /// `bin_hi` is clamped into `[1, num_bins]` and `bin_lo` into
    /// `[0, bin_hi - 1]`. Bins entering the interval are computed exactly
    /// from the stored history so they are valid immediately; bins leaving
    /// it are zeroed.
    pub fn interval(&mut self, bin_lo: usize, bin_hi: usize) {
        self.set_interval(bin_lo, bin_hi, true);
        log::debug!("sliding DFT interval [{}, {})", self.bin_lo, self.bin_hi);
    }

    fn set_interval(&mut self, bin_lo: usize, bin_hi: usize, recompute: bool) {
        let num_bins = self.frame.num_bins();
        let hi = bin_hi.clamp(1, num_bins);
        let lo = bin_lo.min(hi - 1);
        if hi != bin_hi || lo != bin_lo {
            log::warn!(
                "sliding DFT interval [{}, {}) clamped to [{}, {})",
                bin_lo,
                bin_hi,
                lo,
                hi
            );
        }

        let (old_lo, old_hi) = (self.bin_lo, self.bin_hi);
        self.bin_lo = lo;
        self.bin_hi = hi;
        self.low = self.twiddles[lo];
        self.step = self.twiddles[1 % self.twiddles.len()];

        if !recompute {
            return;
        }

        let zero = Complex::new(T::zero(), T::zero());
        for k in 0..num_bins {
            let retained = (lo..hi).contains(&k);
            let was_retained = (old_lo..old_hi).contains(&k);
            if retained && !was_retained {
                let value = self.exact_bin(k);
                self.frame.set_bin(k, value);
            } else if !retained && was_retained {
                self.frame.set_bin(k, zero);
            }
        }
    }

    /// Push one sample and update every retained bin
    #[inline]
    pub fn forward(&mut self, input: T) {
        let delta = (input - self.delay.process(input)) * self.norm;

        let (lo, hi) = (self.bin_lo, self.bin_hi);
        let step = self.step;
        let mut rot = self.low;
        for bin in &mut self.frame.bins_mut()[lo..hi] {
            *bin = *bin * rot + delta;
            rot = rot * step;
        }

        if let Some(period) = self.resync_period {
            self.since_resync += 1;
            if self.since_resync >= period {
                self.resync();
            }
        }
    }

    /// Recompute the retained bins exactly from the delay-line history
    ///
    /// Costs `O(N)` per retained bin.
    pub fn resync(&mut self) {
        for k in self.bin_lo..self.bin_hi {
            let value = self.exact_bin(k);
            self.frame.set_bin(k, value);
        }
        self.since_resync = 0;
    }

    /// Resync automatically every `period` samples (`None` or 0 disables)
    ///
    /// The resync runs inside [`SlidingDft::forward`], so that sample costs
    /// `O(N)` per retained bin instead of `O(1)`.
    pub fn set_resync_period(&mut self, period: Option<usize>) {
        self.resync_period = period.filter(|&p| p > 0);
        self.since_resync = 0;
    }

    /// Clear the history and all bins, keeping sizes
    pub fn reset(&mut self) {
        self.delay.reset();
        self.frame.zero();
        self.since_resync = 0;
    }

    /// `2/N · Σ_{i<N} x(n-i)·e^{j2πki/N}` over the stored history
    fn exact_bin(&self, k: usize) -> Complex<T> {
        let size = self.twiddles.len();
        let mut sum = Complex::new(T::zero(), T::zero());
        for (i, x) in self.delay.iter_newest_first().enumerate() {
            sum = sum + self.twiddles[(k * i) % size] * x;
        }
        sum * self.norm
    }

    pub fn frame(&self) -> &SpectralFrame<T> {
        &self.frame
    }

    /// Read bin `k`; bins outside the interval read zero
    pub fn bin(&self, k: usize) -> Complex<T> {
        self.frame.bin(k)
    }

    pub fn bins(&self) -> &[Complex<T>] {
        self.frame.bins()
    }

    pub fn bin_lo(&self) -> usize {
        self.bin_lo
    }

    pub fn bin_hi(&self) -> usize {
        self.bin_hi
    }

    pub fn num_bins(&self) -> usize {
        self.frame.num_bins()
    }

    pub fn size_dft(&self) -> usize {
        self.frame.size_dft()
    }

    pub fn bin_freq(&self) -> f64 {
        self.frame.bin_freq()
    }

    pub fn sample_rate(&self) -> f64 {
        self.frame.sample_rate()
    }

    pub fn resync_period(&self) -> Option<usize> {
        self.resync_period
    }
}

impl<T: Real> DomainObserver for SlidingDft<T> {
    fn on_domain_change(&mut self, sample_rate: f64) {
        self.frame.on_domain_change(sample_rate);
    }
}

impl<T: Real> fmt::Display for SlidingDft<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SlidingDFT: size {}, bins [{}, {}) of {}, {:.3} Hz/bin",
            self.size_dft(),
            self.bin_lo,
            self.bin_hi,
            self.num_bins(),
            self.bin_freq()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_sdft<T: Real>(size_dft: usize, bin_lo: usize, bin_hi: usize) -> SlidingDft<T> {
        SlidingDft::new(SlidingDftConfig {
            size_dft,
            bin_lo,
            bin_hi,
            ..SlidingDftConfig::default()
        })
        .unwrap()
    }

    fn noise(len: usize) -> Vec<f64> {
        // Deterministic LCG in [-1, 1)
        let mut state = 12345u32;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
                (state >> 8) as f64 / (1u32 << 23) as f64 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_converges_to_amplitude() {
        let n = 64;
        let k = 5;
        for &phase in &[0.0, 0.7, 2.0, -2.9] {
            let mut sdft = new_sdft::<f64>(n, 0, 33);
            for t in 0..n {
                let x = 0.7 * (TAU * k as f64 * t as f64 / n as f64 + phase).cos();
                sdft.forward(x);
            }
            assert!((sdft.bin(k).norm() - 0.7).abs() < 1e-9, "phase {}", phase);
            assert!(sdft.bin(k + 1).norm() < 1e-9);
        }
    }

    #[test]
    fn test_single_precision_convergence() {
        let n = 128;
        let k = 9;
        let mut sdft = new_sdft::<f32>(n, 4, 16);
        for t in 0..3 * n {
            let x = 0.25 * (TAU * k as f64 * t as f64 / n as f64 + 1.3).sin();
            sdft.forward(x as f32);
        }
        assert!((sdft.bin(k).norm() - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_matches_exact_dft() {
        let n = 32;
        let input = noise(500);
        let mut sdft = new_sdft::<f64>(n, 0, 17);
        for &x in &input {
            sdft.forward(x);
        }

        // Direct evaluation over the last N samples
        for k in 0..17 {
            let mut expected = Complex::new(0.0, 0.0);
            for i in 0..n {
                let angle = TAU * (k * i) as f64 / n as f64;
                expected += Complex::from_polar(input[input.len() - 1 - i], angle);
            }
            expected *= 2.0 / n as f64;
            assert!((sdft.bin(k) - expected).norm() < 1e-9, "bin {}", k);
        }
    }

    #[test]
    fn test_interval_limits_updates() {
        let mut sdft = new_sdft::<f64>(16, 2, 5);
        for x in noise(40) {
            sdft.forward(x);
        }
        assert_eq!(sdft.bin(1), Complex::new(0.0, 0.0));
        assert_eq!(sdft.bin(5), Complex::new(0.0, 0.0));
        assert!(sdft.bin(3).norm() > 0.0);
    }

    #[test]
    fn test_interval_change_is_immediately_valid() {
        let input = noise(100);
        let mut full = new_sdft::<f64>(16, 0, 9);
        let mut narrow = new_sdft::<f64>(16, 0, 2);

        for &x in &input[..60] {
            full.forward(x);
            narrow.forward(x);
        }

        narrow.interval(3, 7);
        assert_eq!(narrow.bin(0), Complex::new(0.0, 0.0));
        for k in 3..7 {
            assert!((narrow.bin(k) - full.bin(k)).norm() < 1e-9);
        }

        for &x in &input[60..] {
            full.forward(x);
            narrow.forward(x);
        }
        for k in 3..7 {
            assert!((narrow.bin(k) - full.bin(k)).norm() < 1e-9);
        }
    }

    #[test]
    fn test_interval_clamping() {
        let mut sdft = new_sdft::<f64>(16, 0, 100);
        assert_eq!((sdft.bin_lo(), sdft.bin_hi()), (0, 9));

        sdft.interval(10, 3);
        assert_eq!((sdft.bin_lo(), sdft.bin_hi()), (2, 3));

        sdft.interval(4, 0);
        assert_eq!((sdft.bin_lo(), sdft.bin_hi()), (0, 1));

        let sdft = new_sdft::<f32>(0, 0, 1);
        assert_eq!(sdft.size_dft(), 1);
        assert_eq!(sdft.num_bins(), 1);
    }

    #[test]
    fn test_resize_discards_state() {
        let input = noise(80);
        let mut sdft = new_sdft::<f64>(16, 0, 9);
        for &x in &input {
            sdft.forward(x);
        }

        sdft.resize(8, 0, 5).unwrap();
        assert!(sdft.bins().iter().all(|b| b.norm() == 0.0));

        let mut fresh = new_sdft::<f64>(8, 0, 5);
        for &x in &input[..20] {
            sdft.forward(x);
            fresh.forward(x);
        }
        for k in 0..5 {
            assert_eq!(sdft.bin(k), fresh.bin(k));
        }
    }

    #[test]
    fn test_resync_period() {
        let input = noise(300);
        let mut periodic = SlidingDft::<f32>::new(SlidingDftConfig {
            size_dft: 64,
            bin_lo: 0,
            bin_hi: 33,
            resync_period: Some(50),
            ..SlidingDftConfig::default()
        })
        .unwrap();
        let mut reference = new_sdft::<f64>(64, 0, 33);

        for &x in &input {
            periodic.forward(x as f32);
            reference.forward(x);
        }
        for k in 0..33 {
            let a = periodic.bin(k);
            let b = reference.bin(k);
            assert!((a.re as f64 - b.re).abs() < 1e-4 && (a.im as f64 - b.im).abs() < 1e-4);
        }

        periodic.set_resync_period(Some(0));
        assert_eq!(periodic.resync_period(), None);
    }

    #[test]
    fn test_config_and_domain() {
        let mut sdft = SlidingDft::<f64>::new(SlidingDftConfig::default()).unwrap();
        assert_eq!(sdft.num_bins(), 513);
        assert_eq!(sdft.config(), SlidingDftConfig::default());

        let config = SlidingDftConfig {
            size_dft: 256,
            bin_lo: 10,
            bin_hi: 20,
            sample_rate: 32000.0,
            resync_period: Some(1000),
        };
        sdft.update_config(config.clone()).unwrap();
        assert_eq!(sdft.config(), config);
        assert!((sdft.bin_freq() - 125.0).abs() < 1e-9);

        sdft.on_domain_change(25600.0);
        assert!((sdft.bin_freq() - 100.0).abs() < 1e-9);
        assert!(sdft.to_string().contains("bins [10, 20) of 129"));
    }
}
