use crate::prelude::{StageError, StageResult};
use serde::{Deserialize, Serialize};

/// Band-pass request: Butterworth order plus cutoffs in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub order: usize,
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FilterSpec {
    pub fn new(order: usize, low_hz: f64, high_hz: f64) -> Self {
        Self {
            order,
            low_hz,
            high_hz,
        }
    }

    /// Checks `order >= 1` and `0 < low < high < nyquist` for `sample_rate`.
    pub fn validate(&self, sample_rate: u32) -> StageResult<()> {
        let nyquist = f64::from(sample_rate) / 2.0;
        let band_ok = self.low_hz.is_finite()
            && self.high_hz.is_finite()
            && self.low_hz > 0.0
            && self.low_hz < self.high_hz
            && self.high_hz < nyquist;
        if self.order == 0 || !band_ok {
            return Err(StageError::InvalidFilterSpec {
                order: self.order,
                low: self.low_hz,
                high: self.high_hz,
                nyquist,
            });
        }
        Ok(())
    }
}
