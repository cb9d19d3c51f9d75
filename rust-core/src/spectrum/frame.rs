//! Spectral bin storage shared by all transforms
//!
//! A `SpectralFrame` owns the packed half-spectrum of a real signal plus any
//! number of auxiliary per-bin scratch buffers.
//!
//! # Packing
//!
//! For a transform of size `N` there are `N/2 + 1` bins. Bin 0 (DC) and, when
//! `N` is even, the last bin (Nyquist) are real: their imaginary part is zero
//! after a forward transform and is ignored by the inverse. With odd `N` the
//! last bin is an ordinary complex bin.

use std::fmt::Debug;

use num_complex::Complex;
use rustfft::num_traits::{Float, FloatConst};

use crate::audio::buffer;
use crate::error::SpectralError;

/// Floating-point sample type usable for bins and resonator state
pub trait Real: Float + FloatConst + Default + Debug + Send + Sync + 'static {
    /// Convert an `f64` constant into this type (rounding if needed)
    fn cast(value: f64) -> Self;
}

impl Real for f32 {
    #[inline]
    fn cast(value: f64) -> Self {
        value as f32
    }
}

impl Real for f64 {
    #[inline]
    fn cast(value: f64) -> Self {
        value
    }
}

/// Packed spectrum plus auxiliary per-bin buffers
#[derive(Debug, Clone)]
pub struct SpectralFrame<T: Real = f32> {
    /// Transform size N
    size_dft: usize,

    /// N/2 + 1 bins
    bins: Vec<Complex<T>>,

    /// `num_aux` contiguous buffers of `num_bins` values each
    aux: Vec<T>,

    /// Number of auxiliary buffers
    num_aux: usize,

    /// Sample rate in Hz
    sample_rate: f64,

    /// Bin width in Hz
    bin_freq: f64,
}

impl<T: Real> SpectralFrame<T> {
    /// Create a zeroed frame for a transform of `size_dft` samples
    ///
    /// # Arguments
    /// * `size_dft` - Transform size (clamped to at least 1)
    /// * `num_aux` - Number of auxiliary buffers
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(size_dft: usize, num_aux: usize, sample_rate: f64) -> Result<Self, SpectralError> {
        let mut frame = Self {
            size_dft: 0,
            bins: Vec::new(),
            aux: Vec::new(),
            num_aux,
            sample_rate,
            bin_freq: 0.0,
        };
        frame.resize(size_dft)?;
        Ok(frame)
    }

    /// Reallocate for a new transform size
    ///
    /// Bins and auxiliary buffers (same count, new stride) are zeroed.
    pub fn resize(&mut self, size_dft: usize) -> Result<(), SpectralError> {
        let size_dft = size_dft.max(1);
        let num_bins = size_dft / 2 + 1;
        buffer::refill(&mut self.bins, num_bins, Complex::new(T::zero(), T::zero()), "spectral bins")?;
        buffer::refill(&mut self.aux, self.num_aux * num_bins, T::zero(), "auxiliary buffers")?;
        self.size_dft = size_dft;
        self.bin_freq = self.sample_rate / size_dft as f64;
        Ok(())
    }

    /// Set the number of auxiliary buffers; all of them are zeroed
    pub fn set_num_aux(&mut self, count: usize) -> Result<(), SpectralError> {
        let len = count * self.num_bins();
        buffer::refill(&mut self.aux, len, T::zero(), "auxiliary buffers")?;
        self.num_aux = count;
        Ok(())
    }

    /// Transform size N
    pub fn size_dft(&self) -> usize {
        self.size_dft
    }

    /// Number of bins, N/2 + 1
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.size_dft / 2 + 1
    }

    /// Number of auxiliary buffers
    pub fn num_aux(&self) -> usize {
        self.num_aux
    }

    /// Whether bin `k` only carries a real value (DC, and Nyquist for even N)
    #[inline]
    pub fn is_real_bin(&self, k: usize) -> bool {
        k == 0 || (self.size_dft % 2 == 0 && k == self.size_dft / 2)
    }

    /// Read bin `k`
    ///
    /// # Panics
    /// If `k >= num_bins()`
    #[inline]
    pub fn bin(&self, k: usize) -> Complex<T> {
        self.bins[k]
    }

    /// Mutable access to bin `k`
    ///
    /// # Panics
    /// If `k >= num_bins()`
    #[inline]
    pub fn bin_mut(&mut self, k: usize) -> &mut Complex<T> {
        &mut self.bins[k]
    }

    /// Overwrite bin `k`
    #[inline]
    pub fn set_bin(&mut self, k: usize, value: Complex<T>) {
        self.bins[k] = value;
    }

    /// Checked read of bin `k`
    pub fn try_bin(&self, k: usize) -> Result<Complex<T>, SpectralError> {
        self.bins.get(k).copied().ok_or(SpectralError::BinOutOfRange {
            index: k,
            num_bins: self.num_bins(),
        })
    }

    /// All bins
    pub fn bins(&self) -> &[Complex<T>] {
        &self.bins
    }

    /// All bins, mutable
    pub fn bins_mut(&mut self) -> &mut [Complex<T>] {
        &mut self.bins
    }

    /// Zero every bin
    pub fn zero(&mut self) {
        self.bins.fill(Complex::new(T::zero(), T::zero()));
    }

    /// Zero the first and last bin (DC and Nyquist)
    pub fn zero_ends(&mut self) {
        let zero = Complex::new(T::zero(), T::zero());
        let last = self.bins.len() - 1;
        self.bins[0] = zero;
        self.bins[last] = zero;
    }

    /// Auxiliary buffer `i`
    ///
    /// # Panics
    /// If `i >= num_aux()`
    pub fn aux(&self, i: usize) -> &[T] {
        let n = self.num_bins();
        assert!(i < self.num_aux, "aux buffer {} out of range ({} allocated)", i, self.num_aux);
        &self.aux[i * n..(i + 1) * n]
    }

    /// Auxiliary buffer `i`, mutable
    ///
    /// # Panics
    /// If `i >= num_aux()`
    pub fn aux_mut(&mut self, i: usize) -> &mut [T] {
        let n = self.num_bins();
        assert!(i < self.num_aux, "aux buffer {} out of range ({} allocated)", i, self.num_aux);
        &mut self.aux[i * n..(i + 1) * n]
    }

    /// Checked access to auxiliary buffer `i`
    pub fn try_aux(&self, i: usize) -> Result<&[T], SpectralError> {
        if i >= self.num_aux {
            return Err(SpectralError::AuxOutOfRange {
                index: i,
                count: self.num_aux,
            });
        }
        Ok(self.aux(i))
    }

    /// Read complex value `k` from the pair of buffers starting at `i`
    ///
    /// Buffers `i` and `i + 1` are contiguous, so together they hold
    /// `num_bins()` interleaved (re, im) values.
    ///
    /// # Panics
    /// If `i + 1 >= num_aux()` or `k >= num_bins()`
    pub fn aux_bin(&self, i: usize, k: usize) -> Complex<T> {
        let pair = self.aux_pair(i, k);
        Complex::new(self.aux[pair], self.aux[pair + 1])
    }

    /// Write complex value `k` into the pair of buffers starting at `i`
    pub fn set_aux_bin(&mut self, i: usize, k: usize, value: Complex<T>) {
        let pair = self.aux_pair(i, k);
        self.aux[pair] = value.re;
        self.aux[pair + 1] = value.im;
    }

    fn aux_pair(&self, i: usize, k: usize) -> usize {
        assert!(
            i + 1 < self.num_aux,
            "aux pair {} needs two buffers ({} allocated)",
            i,
            self.num_aux
        );
        assert!(k < self.num_bins(), "bin {} out of range ({} bins)", k, self.num_bins());
        i * self.num_bins() + 2 * k
    }

    /// Zero all auxiliary buffers
    pub fn zero_aux(&mut self) {
        self.aux.fill(T::zero());
    }

    /// Zero auxiliary buffer `i`
    pub fn zero_aux_at(&mut self, i: usize) {
        self.aux_mut(i).fill(T::zero());
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Width of one bin in Hz
    pub fn bin_freq(&self) -> f64 {
        self.bin_freq
    }

    /// Center frequency of bin `k` in Hz
    pub fn bin_frequency(&self, k: usize) -> f64 {
        k as f64 * self.bin_freq
    }

    /// Sample-rate change: only the bin width depends on it
    pub fn on_domain_change(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.bin_freq = sample_rate / self.size_dft as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_sizes() {
        let frame = SpectralFrame::<f32>::new(8, 0, 48000.0).unwrap();
        assert_eq!(frame.num_bins(), 5);
        assert_eq!(frame.bins().len(), 5);
        assert!((frame.bin_freq() - 6000.0).abs() < 1e-9);

        let frame = SpectralFrame::<f32>::new(9, 0, 48000.0).unwrap();
        assert_eq!(frame.num_bins(), 5);
        assert!(frame.is_real_bin(0));
        assert!(!frame.is_real_bin(4));

        let frame = SpectralFrame::<f32>::new(8, 0, 48000.0).unwrap();
        assert!(frame.is_real_bin(4));
    }

    #[test]
    fn test_zero_ends() {
        let mut frame = SpectralFrame::<f32>::new(8, 0, 48000.0).unwrap();
        for k in 0..frame.num_bins() {
            frame.set_bin(k, Complex::new(1.0, 1.0));
        }

        frame.zero_ends();

        assert_eq!(frame.bin(0), Complex::new(0.0, 0.0));
        assert_eq!(frame.bin(4), Complex::new(0.0, 0.0));
        assert_eq!(frame.bin(2), Complex::new(1.0, 1.0));
    }

    #[test]
    fn test_bin_bounds() {
        let frame = SpectralFrame::<f64>::new(16, 0, 48000.0).unwrap();
        assert!(frame.try_bin(8).is_ok());
        assert_eq!(
            frame.try_bin(9),
            Err(SpectralError::BinOutOfRange {
                index: 9,
                num_bins: 9
            })
        );
    }

    #[test]
    #[should_panic]
    fn test_bin_index_panics() {
        let frame = SpectralFrame::<f32>::new(16, 0, 48000.0).unwrap();
        let _ = frame.bin(9);
    }

    #[test]
    fn test_aux_buffers() {
        let mut frame = SpectralFrame::<f32>::new(8, 2, 48000.0).unwrap();
        assert_eq!(frame.aux(0).len(), 5);
        assert_eq!(frame.aux(1).len(), 5);

        frame.aux_mut(1).fill(3.0);
        assert!(frame.aux(0).iter().all(|&x| x == 0.0));

        frame.zero_aux_at(1);
        assert!(frame.aux(1).iter().all(|&x| x == 0.0));

        assert!(frame.try_aux(2).is_err());
    }

    #[test]
    fn test_set_num_aux() {
        let mut frame = SpectralFrame::<f32>::new(8, 1, 48000.0).unwrap();
        frame.aux_mut(0).fill(2.0);

        frame.set_num_aux(3).unwrap();
        assert_eq!(frame.num_aux(), 3);
        for i in 0..3 {
            assert_eq!(frame.aux(i).len(), 5);
            assert!(frame.aux(i).iter().all(|&x| x == 0.0));
        }

        frame.set_num_aux(0).unwrap();
        assert!(frame.try_aux(0).is_err());
    }

    #[test]
    fn test_aux_pair_as_complex() {
        let mut frame = SpectralFrame::<f32>::new(8, 2, 48000.0).unwrap();
        frame.set_aux_bin(0, 3, Complex::new(1.5, -2.5));

        assert_eq!(frame.aux_bin(0, 3), Complex::new(1.5, -2.5));
        // Bin 3 of the pair lives at slots 6 and 7: the second buffer
        assert_eq!(frame.aux(1)[1], 1.5);
        assert_eq!(frame.aux(1)[2], -2.5);
    }

    #[test]
    fn test_resize_keeps_aux_count() {
        let mut frame = SpectralFrame::<f32>::new(8, 3, 48000.0).unwrap();
        frame.aux_mut(2).fill(1.0);
        frame.set_bin(1, Complex::new(2.0, 0.0));

        frame.resize(32).unwrap();

        assert_eq!(frame.num_aux(), 3);
        assert_eq!(frame.aux(2).len(), 17);
        assert!(frame.aux(2).iter().all(|&x| x == 0.0));
        assert_eq!(frame.bin(1), Complex::new(0.0, 0.0));
    }

    #[test]
    fn test_domain_change_only_touches_bin_width() {
        let mut frame = SpectralFrame::<f32>::new(1024, 0, 48000.0).unwrap();
        frame.set_bin(3, Complex::new(1.0, 2.0));

        frame.on_domain_change(44100.0);

        assert!((frame.bin_freq() - 44100.0 / 1024.0).abs() < 1e-9);
        assert_eq!(frame.bin(3), Complex::new(1.0, 2.0));
    }
}
