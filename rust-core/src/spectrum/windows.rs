//! Analysis/synthesis window functions
//!
//! Tables are periodic (DFT-even): `w[n]` is sampled over `n/M` rather than
//! `n/(M-1)`, so shifted copies at common hop sizes sum to a constant.

use std::f64::consts::PI;
use std::fmt;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    /// Rectangular window (no windowing)
    #[default]
    Rectangular,

    /// Bartlett (triangular) window: w[n] = 1 - |2n/M - 1|
    Bartlett,

    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/M)
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/M)
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/M) + 0.08*cos(4πn/M)
    Blackman,

    /// Blackman-Harris 4-term window, ~92 dB sidelobes
    BlackmanHarris,

    /// Welch (parabolic) window: w[n] = 1 - (2n/M - 1)^2
    Welch,
}

impl WindowType {
    /// All supported shapes
    pub const ALL: [WindowType; 7] = [
        WindowType::Rectangular,
        WindowType::Bartlett,
        WindowType::Hann,
        WindowType::Hamming,
        WindowType::Blackman,
        WindowType::BlackmanHarris,
        WindowType::Welch,
    ];

    /// Value of the window at normalized position `x = n/M` in [0, 1)
    pub fn value_at(&self, x: f64) -> f64 {
        let angle = 2.0 * PI * x;
        match self {
            WindowType::Rectangular => 1.0,
            WindowType::Bartlett => 1.0 - (2.0 * x - 1.0).abs(),
            WindowType::Hann => 0.5 - 0.5 * angle.cos(),
            WindowType::Hamming => 0.54 - 0.46 * angle.cos(),
            WindowType::Blackman => 0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos(),
            WindowType::BlackmanHarris => {
                0.35875 - 0.48829 * angle.cos() + 0.14128 * (2.0 * angle).cos()
                    - 0.01168 * (3.0 * angle).cos()
            }
            WindowType::Welch => {
                let t = 2.0 * x - 1.0;
                1.0 - t * t
            }
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowType::Rectangular => "rectangular",
            WindowType::Bartlett => "bartlett",
            WindowType::Hann => "hann",
            WindowType::Hamming => "hamming",
            WindowType::Blackman => "blackman",
            WindowType::BlackmanHarris => "blackman-harris",
            WindowType::Welch => "welch",
        };
        f.write_str(name)
    }
}

/// Fill `table` with the periodic window of length `table.len()`
pub fn fill_window(window_type: WindowType, table: &mut [f32]) {
    let m = table.len() as f64;
    for (n, w) in table.iter_mut().enumerate() {
        *w = window_type.value_at(n as f64 / m) as f32;
    }
}

/// Generate window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f32> {
    let mut window = vec![0.0; length];
    fill_window(window_type, &mut window);
    window
}
