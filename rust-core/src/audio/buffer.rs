//! Zero-filled sample storage with fallible allocation
//!
//! All long-lived buffers in the crate are created here, at construction or
//! resize time, so allocation failure surfaces as a `SpectralError` instead
//! of an abort. Nothing on a per-sample path calls into this module.

use crate::error::SpectralError;

/// Allocate a buffer of `len` copies of `value`
///
/// # Arguments
/// * `len` - Number of elements
/// * `value` - Fill value (usually zero)
/// * `what` - Name of the buffer, reported on failure
pub fn filled<T: Clone>(len: usize, value: T, what: &'static str) -> Result<Vec<T>, SpectralError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| SpectralError::Allocation { what, requested: len })?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// Resize `buffer` to `len` elements and reset every element to `value`
///
/// Shrinking keeps the allocation; growing reserves exactly the missing
/// capacity. Old contents never survive a resize.
pub fn refill<T: Clone>(
    buffer: &mut Vec<T>,
    len: usize,
    value: T,
    what: &'static str,
) -> Result<(), SpectralError> {
    buffer.clear();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| SpectralError::Allocation { what, requested: len })?;
    buffer.resize(len, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_buffer() {
        let buffer = filled(16, 0.0f32, "test").unwrap();
        assert_eq!(buffer.len(), 16);
        assert!(buffer.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_refill_discards_contents() {
        let mut buffer = vec![1.0f32, 2.0, 3.0];

        // Grow
        refill(&mut buffer, 5, 0.0, "test").unwrap();
        assert_eq!(buffer, vec![0.0; 5]);

        // Shrink
        buffer[0] = 4.0;
        refill(&mut buffer, 2, 0.0, "test").unwrap();
        assert_eq!(buffer, vec![0.0; 2]);
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let result = filled(usize::MAX, 0u8, "huge");
        assert_eq!(
            result,
            Err(SpectralError::Allocation {
                what: "huge",
                requested: usize::MAX
            })
        );
    }
}
