//! Time-domain sample buffering: sliding analysis windows and delay lines

pub mod buffer;
pub mod delay;
pub mod sliding_window;

pub use delay::DelayLine;
pub use sliding_window::SlidingWindow;
