//! Error types for the spectral core
//!
//! Only construction and resize paths can fail. Per-sample processing is
//! infallible: sizes are fixed between resizes, so every buffer handed to the
//! transform kernel already has the length it expects.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectralError {
    #[error("failed to allocate {requested} elements for {what}")]
    Allocation {
        what: &'static str,
        requested: usize,
    },

    #[error("bin index {index} out of range (number of bins: {num_bins})")]
    BinOutOfRange { index: usize, num_bins: usize },

    #[error("auxiliary buffer {index} out of range ({count} allocated)")]
    AuxOutOfRange { index: usize, count: usize },

    #[error("sample rate must be positive and finite (got {0})")]
    InvalidSampleRate(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SpectralError::BinOutOfRange {
            index: 9,
            num_bins: 5,
        };
        assert_eq!(
            err.to_string(),
            "bin index 9 out of range (number of bins: 5)"
        );

        let err = SpectralError::Allocation {
            what: "sliding window",
            requested: 64,
        };
        assert!(err.to_string().contains("sliding window"));
    }
}
