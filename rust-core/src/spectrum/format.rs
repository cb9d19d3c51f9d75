//! Spectral formats and in-place rectangular/polar conversion

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;

use num_complex::Complex;

/// Interpretation of the two slots of each bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpectralFormat {
    /// Real and imaginary part
    #[default]
    Complex,

    /// Magnitude and phase (radians)
    MagPhase,

    /// Magnitude and frequency deviation from the bin center (Hz)
    ///
    /// Only the STFT tracks phase across frames; a plain `Dft` in this format
    /// behaves like `MagPhase`.
    MagFreq,
}

impl SpectralFormat {
    /// Whether bins hold magnitude in the first slot
    pub fn is_polar(&self) -> bool {
        !matches!(self, SpectralFormat::Complex)
    }
}

impl fmt::Display for SpectralFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpectralFormat::Complex => "complex",
            SpectralFormat::MagPhase => "mag-phase",
            SpectralFormat::MagFreq => "mag-freq",
        };
        f.write_str(name)
    }
}

/// Convert rectangular bins to (magnitude, phase) in place
///
/// Real bins (DC, and Nyquist when `last_is_real`) become
/// (signed amplitude, 0) so the conversion is exactly invertible for them.
///
/// # Arguments
/// * `bins` - Packed half-spectrum
/// * `last_is_real` - Whether the last bin is a Nyquist bin (even size)
/// * `precise` - Use `hypot`/`atan2` instead of the polynomial approximation
pub fn to_polar(bins: &mut [Complex<f32>], last_is_real: bool, precise: bool) {
    let interior = interior_range(bins.len(), last_is_real);

    if let Some(dc) = bins.first_mut() {
        *dc = Complex::new(dc.re, 0.0);
    }
    if last_is_real {
        if let Some(nyquist) = bins.last_mut() {
            *nyquist = Complex::new(nyquist.re, 0.0);
        }
    }

    let interior = &mut bins[interior];
    if precise {
        for bin in interior.iter_mut() {
            *bin = Complex::new(bin.norm(), bin.arg());
        }
    } else {
        for bin in interior.iter_mut() {
            let mag = (bin.re * bin.re + bin.im * bin.im).sqrt();
            *bin = Complex::new(mag, atan2_fast(bin.im, bin.re));
        }
    }
}

/// Convert (magnitude, phase) bins back to rectangular in place
pub fn to_rect(bins: &mut [Complex<f32>], last_is_real: bool) {
    let interior = interior_range(bins.len(), last_is_real);

    // Real bins already hold their signed amplitude in the first slot
    if let Some(dc) = bins.first_mut() {
        dc.im = 0.0;
    }
    if last_is_real {
        if let Some(nyquist) = bins.last_mut() {
            nyquist.im = 0.0;
        }
    }

    for bin in bins[interior].iter_mut() {
        *bin = Complex::from_polar(bin.re, bin.im);
    }
}

fn interior_range(len: usize, last_is_real: bool) -> std::ops::Range<usize> {
    let end = if last_is_real { len.saturating_sub(1) } else { len };
    1.min(end)..end
}

/// Wrap a phase into [-π, π]
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let two_pi = 2.0 * PI;
    let wrapped = phase - two_pi * (phase / two_pi).round();
    // round() can leave values a hair outside the interval
    wrapped.clamp(-PI, PI)
}

/// Polynomial `atan2` approximation
///
/// Abramowitz & Stegun 4.4.49 on the octant-reduced argument; maximum
/// error is about 1e-5 rad. Deterministic for a given input.
#[inline]
pub fn atan2_fast(y: f32, x: f32) -> f32 {
    if x == 0.0 && y == 0.0 {
        return 0.0;
    }

    let ax = x.abs();
    let ay = y.abs();
    let (z, swapped) = if ay > ax { (ax / ay, true) } else { (ay / ax, false) };

    let z2 = z * z;
    let mut angle = z
        * (0.999_866
            + z2 * (-0.330_299_5 + z2 * (0.180_141 + z2 * (-0.085_133 + 0.020_835_1 * z2))));

    if swapped {
        angle = FRAC_PI_2 - angle;
    }
    if x < 0.0 {
        angle = PI - angle;
    }
    if y < 0.0 {
        angle = -angle;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atan2_fast_accuracy() {
        let mut max_err = 0.0f32;
        for i in 0..720 {
            let theta = -PI + i as f32 * (2.0 * PI / 720.0);
            for &radius in &[0.001f32, 1.0, 250.0] {
                let (y, x) = (radius * theta.sin(), radius * theta.cos());
                let err = (wrap_phase(atan2_fast(y, x) - y.atan2(x))).abs();
                max_err = max_err.max(err);
            }
        }
        assert!(max_err < 2e-5, "max error {}", max_err);
    }

    #[test]
    fn test_atan2_fast_axes() {
        assert_eq!(atan2_fast(0.0, 0.0), 0.0);
        assert_eq!(atan2_fast(0.0, 1.0), 0.0);
        assert!((atan2_fast(1.0, 0.0) - FRAC_PI_2).abs() < 1e-6);
        assert!((atan2_fast(0.0, -1.0) - PI).abs() < 1e-6);
        assert!((atan2_fast(-1.0, 0.0) + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_polar_round_trip() {
        let original = vec![
            Complex::new(-3.0f32, 0.0),
            Complex::new(1.0, 2.0),
            Complex::new(-0.5, -0.25),
            Complex::new(0.0, 4.0),
            Complex::new(2.5, 0.0),
        ];

        for &precise in &[true, false] {
            let mut bins = original.clone();
            to_polar(&mut bins, true, precise);

            // Real ends keep their sign with zero phase
            assert_eq!(bins[0], Complex::new(-3.0, 0.0));
            assert_eq!(bins[4], Complex::new(2.5, 0.0));
            for (polar, rect) in bins.iter().zip(&original) {
                assert!((polar.re.abs() - rect.norm()).abs() < 1e-6);
            }

            to_rect(&mut bins, true);
            for (a, b) in bins.iter().zip(&original) {
                assert!((a - b).norm() < 1e-4, "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_odd_size_last_bin_is_complex() {
        let mut bins = vec![Complex::new(1.0f32, 0.0), Complex::new(0.0, -1.0)];
        to_polar(&mut bins, false, true);
        assert!((bins[1].re - 1.0).abs() < 1e-6);
        assert!((bins[1].im + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(3.0 * PI) - PI).abs() < 1e-5 || (wrap_phase(3.0 * PI) + PI).abs() < 1e-5);
        assert!((wrap_phase(0.5) - 0.5).abs() < 1e-7);
        assert!((wrap_phase(-2.0 * PI + 0.25) - 0.25).abs() < 1e-5);
        for i in -100..100 {
            let w = wrap_phase(i as f32 * 0.7);
            assert!((-PI..=PI).contains(&w));
        }
    }
}
