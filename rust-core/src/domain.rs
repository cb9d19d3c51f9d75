//! Sample-rate context
//!
//! A `Domain` holds the sample rate shared by a group of transforms. It does
//! not keep references to them: the caller passes the components to update
//! on every change, so update order is the slice order.

use crate::error::SpectralError;

/// Component whose derived constants depend on the sample rate
pub trait DomainObserver {
    /// Called after the sample rate changed to `sample_rate` Hz
    fn on_domain_change(&mut self, sample_rate: f64);
}

/// Sample rate shared by a set of components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    sample_rate: f64,
}

impl Domain {
    /// Create a domain running at `sample_rate` Hz
    pub fn new(sample_rate: f64) -> Result<Self, SpectralError> {
        Ok(Self {
            sample_rate: check_sample_rate(sample_rate)?,
        })
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Sample period in seconds
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate
    }

    /// Change the sample rate and notify `observers` in order
    ///
    /// An invalid rate leaves the domain and every observer untouched.
    pub fn set_sample_rate(
        &mut self,
        sample_rate: f64,
        observers: &mut [&mut dyn DomainObserver],
    ) -> Result<(), SpectralError> {
        self.sample_rate = check_sample_rate(sample_rate)?;
        log::debug!(
            "sample rate set to {} Hz ({} observers)",
            self.sample_rate,
            observers.len()
        );
        for observer in observers.iter_mut() {
            observer.on_domain_change(self.sample_rate);
        }
        Ok(())
    }

    /// Push the current rate to `observer` (e.g. one created elsewhere)
    pub fn attach(&self, observer: &mut dyn DomainObserver) {
        observer.on_domain_change(self.sample_rate);
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
        }
    }
}

/// Validate a sample rate: positive and finite
pub(crate) fn check_sample_rate(sample_rate: f64) -> Result<f64, SpectralError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(sample_rate)
    } else {
        log::warn!("ignoring invalid sample rate {}", sample_rate);
        Err(SpectralError::InvalidSampleRate(sample_rate))
    }
}
