//! Fixed-length sample delay
//!
//! Ring buffer with a single cursor: each call writes the current sample and
//! returns the one written `len` samples earlier. No allocations after
//! construction.

use super::buffer;
use crate::error::SpectralError;

/// Integer-length delay line
#[derive(Debug, Clone)]
pub struct DelayLine<T> {
    /// Ring storage, `len` samples
    buffer: Vec<T>,

    /// Slot holding the oldest sample (next to be overwritten)
    cursor: usize,
}

impl<T: Copy + Default> DelayLine<T> {
    /// Create a delay of `len` samples (clamped to at least 1)
    pub fn new(len: usize) -> Result<Self, SpectralError> {
        let mut delay = Self {
            buffer: Vec::new(),
            cursor: 0,
        };
        delay.resize(len)?;
        Ok(delay)
    }

    /// Change the delay length; contents are cleared
    pub fn resize(&mut self, len: usize) -> Result<(), SpectralError> {
        buffer::refill(&mut self.buffer, len.max(1), T::default(), "delay line")?;
        self.cursor = 0;
        Ok(())
    }

    /// Write `input` and return the sample written `len()` calls ago
    #[inline]
    pub fn process(&mut self, input: T) -> T {
        let delayed = self.buffer[self.cursor];
        self.buffer[self.cursor] = input;

        self.cursor += 1;
        if self.cursor == self.buffer.len() {
            self.cursor = 0;
        }

        delayed
    }

    /// Clear the delay contents
    pub fn reset(&mut self) {
        self.buffer.fill(T::default());
        self.cursor = 0;
    }

    /// Delay length in samples
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always false: a delay holds at least one sample
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Stored history, most recent sample first
    pub fn iter_newest_first(&self) -> impl Iterator<Item = T> + '_ {
        let (recent, earlier) = self.buffer.split_at(self.cursor);
        recent.iter().rev().chain(earlier.iter().rev()).copied()
    }
}
