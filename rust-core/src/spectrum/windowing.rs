//! Windowing helpers for frame analysis and overlap-add synthesis
//!
//! Windows reduce spectral leakage before the forward transform; the gain
//! factors here undo the amplitude change on both sides of the transform.

/// Multiply `signal` by `window` sample by sample
///
/// Only the overlapping prefix of the two slices is touched.
#[inline]
pub fn apply_window_inplace(signal: &mut [f32], window: &[f32]) {
    for (s, &w) in signal.iter_mut().zip(window) {
        *s *= w;
    }
}

/// Calculate window correction factor
///
/// When applying windows, the signal amplitude is reduced. This factor
/// can be used to correct the FFT magnitude.
///
/// # Returns
/// Correction factor `length / Σw` (multiply FFT magnitude by this)
pub fn window_correction_factor(window: &[f32]) -> f64 {
    let sum: f64 = window.iter().map(|&w| w as f64).sum();
    if sum <= 0.0 {
        return 1.0;
    }
    window.len() as f64 / sum
}

/// Gain of overlap-adding frames windowed by `analysis` and `synthesis`
///
/// Shifted copies of `w_a·w_s` spaced `hop` samples apart sum to
/// `Σ(w_a·w_s) / hop` on average (exactly, for constant-overlap-add
/// windows). Without a synthesis window `w_s = 1`.
pub fn overlap_add_gain(analysis: &[f32], synthesis: Option<&[f32]>, hop: usize) -> f64 {
    let sum: f64 = match synthesis {
        Some(synthesis) => analysis
            .iter()
            .zip(synthesis)
            .map(|(&a, &s)| a as f64 * s as f64)
            .sum(),
        None => analysis.iter().map(|&a| a as f64).sum(),
    };
    sum / hop.max(1) as f64
}
