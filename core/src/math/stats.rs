pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&v| f64::from(v) * f64::from(v)).sum();
        (sum_sq / samples.len() as f64).sqrt() as f32
    }

    /// Largest absolute sample, or `None` for empty or non-finite input.
    pub fn peak_abs(samples: &[f32]) -> Option<f32> {
        let mut peak: Option<f32> = None;
        for &value in samples {
            if !value.is_finite() {
                return None;
            }
            let magnitude = value.abs();
            peak = Some(peak.map_or(magnitude, |p| p.max(magnitude)));
        }
        peak
    }
}
