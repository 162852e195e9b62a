use crate::prelude::{
    ProcessingStage, StageConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::signal::{CarrierEstimate, Spectrum};
use crate::telemetry::log::LogManager;

/// Picks the strongest spectral bin above the carrier search floor and hands
/// the searched spectrum back in the metadata.
pub struct CarrierStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl CarrierStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("carrier"),
        }
    }

    /// First bin whose frequency is strictly above `floor_hz`.
    pub fn search_start(spectrum: &Spectrum, floor_hz: f64) -> Option<usize> {
        spectrum.frequencies.iter().position(|&freq| freq > floor_hz)
    }

    /// Arg-max over the bins above `floor_hz`, lowest bin winning ties.
    ///
    /// When no bin clears the floor the whole spectrum is searched from bin 0.
    pub fn detect(spectrum: &Spectrum, floor_hz: f64) -> StageResult<CarrierEstimate> {
        if spectrum.frequencies.len() != spectrum.magnitudes.len() {
            return Err(StageError::InvalidInput(format!(
                "spectrum has {} frequencies but {} magnitudes",
                spectrum.frequencies.len(),
                spectrum.magnitudes.len()
            )));
        }
        if spectrum.is_empty() {
            return Err(StageError::CarrierNotFound("spectrum is empty".into()));
        }

        let start = Self::search_start(spectrum, floor_hz).unwrap_or(0);
        let mut best: Option<(usize, f32)> = None;
        for (bin, &magnitude) in spectrum.magnitudes.iter().enumerate().skip(start) {
            if !magnitude.is_finite() {
                continue;
            }
            match best {
                Some((_, peak)) if magnitude <= peak => {}
                _ => best = Some((bin, magnitude)),
            }
        }

        let (bin, magnitude) = best.ok_or_else(|| {
            StageError::CarrierNotFound(format!("no finite magnitude from bin {}", start))
        })?;
        if magnitude <= 0.0 {
            return Err(StageError::DegenerateSignal(format!(
                "no spectral energy above {:.1} Hz",
                spectrum.frequencies[start]
            )));
        }

        Ok(CarrierEstimate {
            frequency_hz: spectrum.frequencies[bin],
            bin,
            magnitude,
        })
    }
}

impl Default for CarrierStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for CarrierStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        if !config.carrier_search_floor_hz.is_finite() || config.carrier_search_floor_hz < 0.0 {
            return Err(StageError::InvalidInput(format!(
                "carrier search floor {} Hz",
                config.carrier_search_floor_hz
            )));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;
        let spectrum = input
            .spectrum
            .ok_or_else(|| StageError::InvalidInput("carrier search needs a spectrum".into()))?;

        let floor = config.carrier_search_floor_hz;
        if Self::search_start(&spectrum, floor).is_none() {
            self.logger.caution(&format!(
                "no bin above {:.1} Hz, searching the full spectrum",
                floor
            ));
        }

        let carrier = Self::detect(&spectrum, floor)?;
        let note = format!(
            "carrier {:.2} Hz at bin {} (magnitude {:.3})",
            carrier.frequency_hz, carrier.bin, carrier.magnitude
        );
        self.logger.record(&note);

        Ok(StageOutput {
            samples: input.samples,
            metadata: StageMetadata {
                spectrum: Some(spectrum),
                carrier: Some(carrier),
                notes: vec![note],
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::spectrum::SpectrumStage;
    use std::f64::consts::PI;

    fn spectrum(frequencies: Vec<f64>, magnitudes: Vec<f32>) -> Spectrum {
        Spectrum {
            frequencies,
            magnitudes,
        }
    }

    #[test]
    fn ignores_strong_bins_below_floor() {
        let spec = spectrum(
            vec![0.0, 500.0, 1000.0, 1500.0, 2000.0],
            vec![9.0, 8.0, 7.0, 3.0, 4.0],
        );
        let carrier = CarrierStage::detect(&spec, 1000.0).unwrap();
        assert_eq!(carrier.bin, 4);
        assert_eq!(carrier.frequency_hz, 2000.0);
    }

    #[test]
    fn ties_resolve_to_lowest_frequency() {
        let spec = spectrum(vec![0.0, 1500.0, 2000.0, 2500.0], vec![1.0, 5.0, 5.0, 2.0]);
        assert_eq!(CarrierStage::detect(&spec, 1000.0).unwrap().bin, 1);
    }

    #[test]
    fn falls_back_to_full_spectrum_below_floor() {
        let spec = spectrum(vec![0.0, 250.0, 500.0], vec![1.0, 3.0, 2.0]);
        assert_eq!(CarrierStage::search_start(&spec, 1000.0), None);
        let carrier = CarrierStage::detect(&spec, 1000.0).unwrap();
        assert_eq!(carrier.frequency_hz, 250.0);
    }

    #[test]
    fn silent_spectrum_is_degenerate() {
        let spec = spectrum(vec![0.0, 1500.0, 3000.0], vec![0.0, 0.0, 0.0]);
        assert!(matches!(
            CarrierStage::detect(&spec, 1000.0),
            Err(StageError::DegenerateSignal(_))
        ));
    }

    #[test]
    fn empty_spectrum_reports_missing_carrier() {
        assert!(matches!(
            CarrierStage::detect(&spectrum(vec![], vec![]), 1000.0),
            Err(StageError::CarrierNotFound(_))
        ));
    }

    #[test]
    fn finds_pure_tone_within_one_bin() {
        let (rate, len, tone) = (8000u32, 1000usize, 2312.0);
        let samples: Vec<f32> = (0..len)
            .map(|i| (2.0 * PI * tone * i as f64 / f64::from(rate)).sin() as f32)
            .collect();
        let spec = SpectrumStage::analyze(&samples, rate).unwrap();
        let carrier = CarrierStage::detect(&spec, 1000.0).unwrap();
        assert!((carrier.frequency_hz - tone).abs() <= f64::from(rate) / len as f64);
    }

    #[test]
    fn eight_kilohertz_cosine_at_cd_rate() {
        let samples: Vec<f32> = (0..44_100)
            .map(|i| (2.0 * PI * 8000.0 * i as f64 / 44_100.0).cos() as f32)
            .collect();
        let spec = SpectrumStage::analyze(&samples, 44_100).unwrap();
        let carrier = CarrierStage::detect(&spec, 1000.0).unwrap();
        assert!((carrier.frequency_hz - 8000.0).abs() <= 1.0);
    }

    #[test]
    fn stage_reports_carrier_in_metadata() {
        let mut stage = CarrierStage::new();
        stage.initialize(&StageConfig::default()).unwrap();
        let spec = spectrum(vec![0.0, 1500.0, 3000.0], vec![4.0, 1.0, 2.0]);
        let output = stage
            .execute(StageInput::new(vec![0.0; 4], 6000).with_spectrum(spec))
            .unwrap();
        assert_eq!(output.metadata.carrier.unwrap().frequency_hz, 3000.0);
        assert!(output.metadata.spectrum.is_some());
        assert_eq!(output.samples.len(), 4);
        stage.cleanup();
    }

    #[test]
    fn stage_requires_spectrum() {
        let mut stage = CarrierStage::new();
        stage.initialize(&StageConfig::default()).unwrap();
        assert!(matches!(
            stage.execute(StageInput::new(vec![0.0; 4], 6000)),
            Err(StageError::InvalidInput(_))
        ));
    }
}
