use crate::math::butterworth::SosFilter;
use crate::math::stats::StatsHelper;
use crate::prelude::{
    ProcessingStage, StageConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::signal::FilterSpec;
use crate::telemetry::log::LogManager;

/// Zero-phase Butterworth band-pass applied after demodulation.
pub struct BandpassStage {
    spec: Option<FilterSpec>,
    logger: LogManager,
}

impl BandpassStage {
    pub fn new() -> Self {
        Self {
            spec: None,
            logger: LogManager::new("bandpass"),
        }
    }

    /// Designs the filter for `sample_rate` and runs it forward and backward.
    pub fn apply(samples: &[f32], sample_rate: u32, spec: &FilterSpec) -> StageResult<Vec<f32>> {
        let filter = SosFilter::butterworth_bandpass(spec, sample_rate)?;
        Ok(filter.filtfilt(samples))
    }
}

impl Default for BandpassStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for BandpassStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        self.spec = Some(FilterSpec::new(
            config.filter_order,
            config.band_low_hz,
            config.band_high_hz,
        ));
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let spec = self
            .spec
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;
        if input.samples.is_empty() {
            return Err(StageError::DegenerateSignal("no samples to filter".into()));
        }

        let filtered = Self::apply(&input.samples, input.sample_rate, &spec)?;
        let rms = StatsHelper::rms(&filtered);
        let note = format!(
            "order {} band {:.1}-{:.1} Hz, RMS {:.4}",
            spec.order, spec.low_hz, spec.high_hz, rms
        );
        self.logger.record(&note);

        Ok(StageOutput {
            samples: filtered,
            metadata: StageMetadata {
                carrier: input.carrier,
                notes: vec![note],
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.spec = None;
    }
}
