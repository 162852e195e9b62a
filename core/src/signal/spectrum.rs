use serde::{Deserialize, Serialize};

/// One-sided magnitude spectrum of a real signal.
///
/// `frequencies[k] = k * sample_rate / n` for `k` in `0..=n/2`; magnitudes are
/// the raw transform moduli without `1/n` scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f32>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Spacing between adjacent bins in Hz.
    pub fn bin_width(&self) -> f64 {
        match self.frequencies.get(1) {
            Some(&second) => second - self.frequencies[0],
            None => 0.0,
        }
    }

    /// Copy of the bins at or below `max_hz`.
    pub fn truncated(&self, max_hz: f64) -> Spectrum {
        let end = self.frequencies.partition_point(|&freq| freq <= max_hz);
        Spectrum {
            frequencies: self.frequencies[..end].to_vec(),
            magnitudes: self.magnitudes[..end].to_vec(),
        }
    }
}

/// Carrier picked from a spectrum peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarrierEstimate {
    pub frequency_hz: f64,
    pub bin: usize,
    pub magnitude: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_keeps_bins_up_to_ceiling() {
        let spectrum = Spectrum {
            frequencies: vec![0.0, 10.0, 20.0, 30.0],
            magnitudes: vec![1.0, 2.0, 3.0, 4.0],
        };
        let cut = spectrum.truncated(20.0);
        assert_eq!(cut.frequencies, vec![0.0, 10.0, 20.0]);
        assert_eq!(cut.magnitudes, vec![1.0, 2.0, 3.0]);
        assert_eq!(spectrum.bin_width(), 10.0);
    }
}
