use crate::math::stats::StatsHelper;
use crate::prelude::{
    ProcessingStage, StageConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;
use std::f64::consts::PI;

/// Coherent AM detector: mixes the input with a zero-phase local carrier.
///
/// A phase error `phi` between the received carrier and the regenerated one
/// scales the recovered envelope by `cos(phi)`. The image at twice the
/// carrier frequency is left in place for the band-pass stage to remove.
pub struct DemodulationStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl DemodulationStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("demodulator"),
        }
    }

    /// `samples[i] *= cos(2π · carrier_hz · i / sample_rate)`, in place.
    pub fn demodulate(samples: &mut [f32], sample_rate: u32, carrier_hz: f64) -> StageResult<()> {
        if sample_rate == 0 {
            return Err(StageError::InvalidInput("sample rate must be positive".into()));
        }
        if !carrier_hz.is_finite() || carrier_hz < 0.0 {
            return Err(StageError::InvalidInput(format!(
                "carrier frequency {} Hz",
                carrier_hz
            )));
        }

        let step = 2.0 * PI * carrier_hz / f64::from(sample_rate);
        for (i, sample) in samples.iter_mut().enumerate() {
            *sample = (f64::from(*sample) * (step * i as f64).cos()) as f32;
        }
        Ok(())
    }
}

impl Default for DemodulationStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for DemodulationStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        if self.config.is_none() {
            return Err(StageError::Internal("stage not initialized".into()));
        }
        let carrier = input
            .carrier
            .ok_or_else(|| StageError::InvalidInput("demodulation needs a carrier".into()))?;
        if input.samples.is_empty() {
            return Err(StageError::DegenerateSignal("no samples to demodulate".into()));
        }

        let mut samples = input.samples;
        self.logger.detail(&format!(
            "reference advances {:.6} rad/sample",
            2.0 * PI * carrier.frequency_hz / f64::from(input.sample_rate.max(1))
        ));
        Self::demodulate(&mut samples, input.sample_rate, carrier.frequency_hz)?;

        let rms = StatsHelper::rms(&samples);
        self.logger.record(&format!(
            "mixed {} samples with {:.2} Hz reference, RMS {:.4}",
            samples.len(),
            carrier.frequency_hz,
            rms
        ));

        Ok(StageOutput {
            samples,
            metadata: StageMetadata {
                carrier: Some(carrier),
                notes: vec![format!("demodulated RMS {:.4}", rms)],
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
