//! Sliding sample window for hop-based analysis
//!
//! Collects incoming samples and signals once every `hop` samples that a full
//! window of the most recent `window` samples is ready.

use super::buffer;
use crate::error::SpectralError;

/// Fixed-size window that advances by `hop` samples at a time
///
/// Two feeding modes are provided; an instance should stick to one of them
/// between resets:
///
/// * [`SlidingWindow::feed`] keeps the window in time order in place. New
///   samples are written into the first `hop` slots (which always hold the
///   oldest samples) and the buffer is rotated left by `hop` when the hop
///   completes, so [`SlidingWindow::window`] is valid until the next feed.
/// * [`SlidingWindow::feed_into`] writes into a ring and copies the window,
///   oldest sample first, into a caller buffer when the hop completes.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    /// Window storage
    buffer: Vec<f32>,

    /// Samples between successive windows (1..=window)
    hop: usize,

    /// Next slot to write
    tap: usize,

    /// Samples written since the last hop boundary (ring mode)
    hop_count: usize,
}

impl SlidingWindow {
    /// Create a new sliding window
    ///
    /// # Arguments
    /// * `window` - Window size in samples (clamped to at least 1)
    /// * `hop` - Hop size in samples (clamped into `[1, window]`)
    pub fn new(window: usize, hop: usize) -> Result<Self, SpectralError> {
        let mut slide = Self {
            buffer: Vec::new(),
            hop: 1,
            tap: 0,
            hop_count: 0,
        };
        slide.resize(window, hop)?;
        Ok(slide)
    }

    /// Reallocate the window and reset all counters
    pub fn resize(&mut self, window: usize, hop: usize) -> Result<(), SpectralError> {
        let window = clamp_window(window);
        buffer::refill(&mut self.buffer, window, 0.0, "sliding window")?;
        self.hop = clamp_hop(hop, window);
        self.tap = 0;
        self.hop_count = 0;
        log::debug!("sliding window resized: window={} hop={}", window, self.hop);
        Ok(())
    }

    /// Change the hop size, keeping the window contents
    ///
    /// The write position restarts at the beginning of a hop.
    pub fn set_hop(&mut self, hop: usize) {
        self.hop = clamp_hop(hop, self.buffer.len());
        self.tap = 0;
        self.hop_count = 0;
    }

    /// Clear the window and restart hop counting
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.tap = 0;
        self.hop_count = 0;
    }

    /// Push one sample (in-place mode)
    ///
    /// # Returns
    /// `true` when a hop completed and [`SlidingWindow::window`] holds the
    /// latest `window` samples in time order
    #[inline]
    pub fn feed(&mut self, input: f32) -> bool {
        self.buffer[self.tap] = input;
        self.tap += 1;

        if self.tap >= self.hop {
            self.tap = 0;
            // The hop just written sits at the front; moving it to the back
            // retires the oldest samples and leaves the window in order.
            self.buffer.rotate_left(self.hop);
            return true;
        }
        false
    }

    /// Push one sample (ring-copy mode)
    ///
    /// When a hop completes, the window is copied oldest-first into `dst`.
    /// `dst` should hold at least `size_win()` samples; extra samples are
    /// left untouched and a shorter `dst` receives the oldest samples only.
    ///
    /// # Returns
    /// `true` when `dst` was filled
    #[inline]
    pub fn feed_into(&mut self, dst: &mut [f32], input: f32) -> bool {
        let window = self.buffer.len();
        self.buffer[self.tap] = input;
        self.tap += 1;
        if self.tap == window {
            self.tap = 0;
        }

        self.hop_count += 1;
        if self.hop_count == self.hop {
            self.hop_count = 0;
            copy_from_ring(&self.buffer, self.tap, dst);
            return true;
        }
        false
    }

    /// Current window (in-place mode)
    pub fn window(&self) -> &[f32] {
        &self.buffer
    }

    /// Window size in samples
    pub fn size_win(&self) -> usize {
        self.buffer.len()
    }

    /// Hop size in samples
    pub fn size_hop(&self) -> usize {
        self.hop
    }
}

/// Copy `ring` into `dst` starting at the oldest element `start`
fn copy_from_ring(ring: &[f32], start: usize, dst: &mut [f32]) {
    let (newer, older) = ring.split_at(start);
    let n_old = older.len().min(dst.len());
    dst[..n_old].copy_from_slice(&older[..n_old]);

    let n_new = newer.len().min(dst.len() - n_old);
    dst[n_old..n_old + n_new].copy_from_slice(&newer[..n_new]);
}

fn clamp_window(window: usize) -> usize {
    if window == 0 {
        log::warn!("window size 0 clamped to 1");
        return 1;
    }
    window
}

fn clamp_hop(hop: usize, window: usize) -> usize {
    let clamped = hop.clamp(1, window.max(1));
    if clamped != hop {
        log::warn!("hop size {} clamped to {} (window {})", hop, clamped, window);
    }
    clamped
}
