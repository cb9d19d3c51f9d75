//! Real-valued transform kernel
//!
//! The frame transforms only rely on the [`TransformKernel`] contract; the
//! default implementation plans transforms with `realfft` and keeps its own
//! scratch so processing never allocates.

use std::sync::Arc;

use num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use crate::audio::buffer;
use crate::error::SpectralError;

/// Real-to-complex transform pair of a fixed size N
///
/// Spectra are packed as N/2 + 1 bins (see [`crate::spectrum::frame`]).
pub trait TransformKernel: Send {
    /// Transform size N
    fn size(&self) -> usize;

    /// Re-plan for a new size
    fn resize(&mut self, size: usize) -> Result<(), SpectralError>;

    /// Unnormalized forward transform
    ///
    /// `input` holds N samples and may be used as scratch; `spectrum`
    /// receives N/2 + 1 bins with zero imaginary parts in the real bins.
    fn forward(&mut self, input: &mut [f32], spectrum: &mut [Complex<f32>]);

    /// One-sided synthesis sum
    ///
    /// Writes `x[n] = X[0]/2 + Σ Re(X[k]·e^{j2πkn/N}) (+ X[N/2]·(-1)^n / 2)`
    /// into `output` (N samples), ignoring the imaginary parts of the real
    /// bins. A spectrum scaled by 2/N therefore inverts the forward
    /// transform exactly. `spectrum` may be used as scratch.
    fn inverse(&mut self, spectrum: &mut [Complex<f32>], output: &mut [f32]);
}

/// Transform kernel backed by `realfft`
pub struct RealFftKernel {
    /// Transform size N
    size: usize,

    /// Forward (real to complex) plan
    r2c: Arc<dyn RealToComplex<f32>>,

    /// Inverse (complex to real) plan
    c2r: Arc<dyn ComplexToReal<f32>>,

    /// Forward scratch
    fwd_scratch: Vec<Complex<f32>>,

    /// Inverse scratch
    inv_scratch: Vec<Complex<f32>>,
}

impl RealFftKernel {
    /// Plan a kernel of `size` samples (clamped to at least 1)
    pub fn new(size: usize) -> Result<Self, SpectralError> {
        let size = size.max(1);
        let (r2c, c2r) = plan(size);
        let zero = Complex::new(0.0, 0.0);
        let fwd_scratch = buffer::filled(r2c.get_scratch_len(), zero, "transform scratch")?;
        let inv_scratch = buffer::filled(c2r.get_scratch_len(), zero, "transform scratch")?;

        Ok(Self {
            size,
            r2c,
            c2r,
            fwd_scratch,
            inv_scratch,
        })
    }
}

/// Plan both directions for `size` samples
///
/// The planner itself is not `Send`, so it only lives for the duration of a
/// (re)plan.
fn plan(size: usize) -> (Arc<dyn RealToComplex<f32>>, Arc<dyn ComplexToReal<f32>>) {
    let mut planner = RealFftPlanner::<f32>::new();
    (planner.plan_fft_forward(size), planner.plan_fft_inverse(size))
}

impl TransformKernel for RealFftKernel {
    fn size(&self) -> usize {
        self.size
    }

    fn resize(&mut self, size: usize) -> Result<(), SpectralError> {
        let size = size.max(1);
        let (r2c, c2r) = plan(size);
        let zero = Complex::new(0.0, 0.0);
        buffer::refill(&mut self.fwd_scratch, r2c.get_scratch_len(), zero, "transform scratch")?;
        buffer::refill(&mut self.inv_scratch, c2r.get_scratch_len(), zero, "transform scratch")?;

        self.size = size;
        self.r2c = r2c;
        self.c2r = c2r;
        Ok(())
    }

    fn forward(&mut self, input: &mut [f32], spectrum: &mut [Complex<f32>]) {
        if let Err(err) = self.r2c.process_with_scratch(input, spectrum, &mut self.fwd_scratch) {
            log::error!("forward transform rejected its buffers: {}", err);
            return;
        }

        spectrum[0].im = 0.0;
        if self.size % 2 == 0 {
            spectrum[self.size / 2].im = 0.0;
        }
    }

    fn inverse(&mut self, spectrum: &mut [Complex<f32>], output: &mut [f32]) {
        // realfft evaluates the full Hermitian sum, twice the one-sided one
        for bin in spectrum.iter_mut() {
            *bin *= 0.5;
        }
        spectrum[0].im = 0.0;
        if self.size % 2 == 0 {
            spectrum[self.size / 2].im = 0.0;
        }

        if let Err(err) = self.c2r.process_with_scratch(spectrum, output, &mut self.inv_scratch) {
            log::error!("inverse transform rejected its buffers: {}", err);
        }
    }
}
