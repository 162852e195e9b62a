use crate::math::fft::FftHelper;
use crate::prelude::{
    ProcessingStage, StageConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::signal::Spectrum;
use crate::telemetry::log::LogManager;

/// Computes the one-sided magnitude spectrum and passes the samples through.
pub struct SpectrumStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl SpectrumStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("spectrum"),
        }
    }

    /// Unwindowed, unnormalized magnitude spectrum over the whole buffer.
    pub fn analyze(samples: &[f32], sample_rate: u32) -> StageResult<Spectrum> {
        if samples.len() < 2 {
            return Err(StageError::DegenerateSignal(format!(
                "spectrum needs at least 2 samples, got {}",
                samples.len()
            )));
        }
        if sample_rate == 0 {
            return Err(StageError::InvalidInput("sample rate must be positive".into()));
        }

        let n = samples.len();
        let helper = FftHelper::new(n);
        let magnitudes: Vec<f32> = helper
            .forward_one_sided(samples)
            .iter()
            .map(|c| c.norm())
            .collect();
        let bin_width = f64::from(sample_rate) / n as f64;
        let frequencies = (0..magnitudes.len())
            .map(|k| k as f64 * bin_width)
            .collect();

        Ok(Spectrum {
            frequencies,
            magnitudes,
        })
    }
}

impl Default for SpectrumStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for SpectrumStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        if self.config.is_none() {
            return Err(StageError::Internal("stage not initialized".into()));
        }

        let spectrum = Self::analyze(&input.samples, input.sample_rate)?;
        let note = format!(
            "{} bins, {:.3} Hz resolution",
            spectrum.len(),
            spectrum.bin_width()
        );
        self.logger.record(&note);

        Ok(StageOutput {
            samples: input.samples,
            metadata: StageMetadata {
                spectrum: Some(spectrum),
                notes: vec![note],
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
