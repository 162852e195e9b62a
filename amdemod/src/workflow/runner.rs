use crate::workflow::config::WorkflowConfig;
use amcore::prelude::{PipelineState, ProcessingStage, StageConfig, StageInput, StageOutput};
use amcore::processing::{BandpassStage, CarrierStage, DemodulationStage, SpectrumStage};
use amcore::signal::{CarrierEstimate, Spectrum, Waveform};
use amcore::wav;
use anyhow::Context;
use log::info;

/// Leading samples kept from each intermediate signal for diagnostics.
pub const EXCERPT_LEN: usize = 1000;

#[derive(Debug)]
pub struct WorkflowResult {
    pub state: PipelineState,
    pub sample_rate: u32,
    pub input_spectrum: Spectrum,
    pub carrier: CarrierEstimate,
    pub demodulated_spectrum: Spectrum,
    pub filtered_spectrum: Spectrum,
    pub filtered: Waveform,
    pub modulated_excerpt: Vec<f32>,
    pub demodulated_excerpt: Vec<f32>,
    pub notes: Vec<String>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Load, process and save in one shot; nothing is written on failure.
    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let input_path = &self.config.input_path;
        let waveform = wav::load_waveform(input_path)
            .with_context(|| format!("loading waveform {}", input_path.display()))?;

        let mut result = self.process(waveform)?;

        let output_path = &self.config.output_path;
        wav::save_waveform(output_path, &result.filtered)
            .with_context(|| format!("saving waveform {}", output_path.display()))?;
        result.state = enter(PipelineState::Saved);
        Ok(result)
    }

    /// Runs analysis, carrier detection, demodulation and filtering in memory.
    pub fn process(&self, waveform: Waveform) -> anyhow::Result<WorkflowResult> {
        let stage_config = self.config.to_stage_config();
        let sample_rate = waveform.sample_rate;
        info!(
            "{} samples ({:.2} s) at {} Hz",
            waveform.len(),
            waveform.duration_secs(),
            sample_rate
        );
        enter(PipelineState::Loaded);
        let modulated_excerpt = excerpt(&waveform.samples);
        let mut notes = Vec::new();

        let analyzed = run_stage(
            &mut SpectrumStage::new(),
            "spectrum",
            &stage_config,
            StageInput::new(waveform.samples, sample_rate),
        )?;
        notes.extend(analyzed.metadata.notes);
        let spectrum = analyzed
            .metadata
            .spectrum
            .context("spectrum stage returned no spectrum")?;
        enter(PipelineState::Analyzed);

        let located = run_stage(
            &mut CarrierStage::new(),
            "carrier",
            &stage_config,
            StageInput::new(analyzed.samples, sample_rate).with_spectrum(spectrum),
        )?;
        notes.extend(located.metadata.notes);
        let carrier = located
            .metadata
            .carrier
            .context("carrier stage returned no estimate")?;
        let input_spectrum = located
            .metadata
            .spectrum
            .context("carrier stage dropped the spectrum")?;
        enter(PipelineState::CarrierFound);

        let demodulated = run_stage(
            &mut DemodulationStage::new(),
            "demodulation",
            &stage_config,
            StageInput::new(located.samples, sample_rate).with_carrier(carrier),
        )?;
        notes.extend(demodulated.metadata.notes);
        let demodulated_spectrum = SpectrumStage::analyze(&demodulated.samples, sample_rate)
            .context("analyzing demodulated spectrum")?;
        let demodulated_excerpt = excerpt(&demodulated.samples);
        enter(PipelineState::Demodulated);

        let filtered = run_stage(
            &mut BandpassStage::new(),
            "bandpass",
            &stage_config,
            StageInput::new(demodulated.samples, sample_rate).with_carrier(carrier),
        )?;
        notes.extend(filtered.metadata.notes);
        let filtered_spectrum = SpectrumStage::analyze(&filtered.samples, sample_rate)
            .context("analyzing filtered spectrum")?;
        let state = enter(PipelineState::Filtered);

        Ok(WorkflowResult {
            state,
            sample_rate,
            input_spectrum,
            carrier,
            demodulated_spectrum,
            filtered_spectrum,
            filtered: Waveform::new(filtered.samples, sample_rate),
            modulated_excerpt,
            demodulated_excerpt,
            notes,
        })
    }
}

fn run_stage<S: ProcessingStage>(
    stage: &mut S,
    name: &str,
    config: &StageConfig,
    input: StageInput,
) -> anyhow::Result<StageOutput> {
    stage
        .initialize(config)
        .with_context(|| format!("initializing {} stage", name))?;
    let output = stage
        .execute(input)
        .with_context(|| format!("executing {} stage", name));
    stage.cleanup();
    output
}

fn enter(state: PipelineState) -> PipelineState {
    info!("pipeline -> {}", state);
    state
}

fn excerpt(samples: &[f32]) -> Vec<f32> {
    samples[..samples.len().min(EXCERPT_LEN)].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_am_waveform, write_am_recording, GeneratorConfig};
    use amcore::prelude::StageError;
    use tempfile::tempdir;

    fn stage_error(err: &anyhow::Error) -> Option<&StageError> {
        err.downcast_ref::<StageError>()
    }

    #[test]
    fn runner_recovers_carrier_and_baseband() {
        let generator = GeneratorConfig {
            noise: 0.0,
            ..Default::default()
        };
        let waveform = build_am_waveform(&generator).unwrap();
        let runner = Runner::new(WorkflowConfig::default());
        let result = runner.process(waveform).unwrap();

        let bin = result.input_spectrum.bin_width();
        assert!((result.carrier.frequency_hz - generator.carrier_hz).abs() <= bin);
        assert_eq!(result.state, PipelineState::Filtered);
        assert_eq!(result.filtered.len(), result.input_spectrum.len() * 2 - 2);
        assert_eq!(result.modulated_excerpt.len(), EXCERPT_LEN);

        let carrier_search = CarrierStage::detect(&result.filtered_spectrum, 0.0).unwrap();
        assert!((carrier_search.frequency_hz - generator.tone_hz).abs() <= bin);
    }

    #[test]
    fn runner_rejects_degenerate_inputs() {
        let runner = Runner::new(WorkflowConfig::default());

        let err = runner
            .process(Waveform::new(vec![0.25], 44_100))
            .unwrap_err();
        assert!(matches!(stage_error(&err), Some(StageError::DegenerateSignal(_))));

        let err = runner
            .process(Waveform::new(vec![0.0; 4096], 44_100))
            .unwrap_err();
        assert!(matches!(stage_error(&err), Some(StageError::DegenerateSignal(_))));
    }

    #[test]
    fn runner_rejects_band_beyond_nyquist() {
        let config = WorkflowConfig {
            band_high_hz: 30_000.0,
            ..Default::default()
        };
        let waveform = build_am_waveform(&GeneratorConfig::default()).unwrap();
        let err = Runner::new(config).process(waveform).unwrap_err();
        assert!(matches!(
            stage_error(&err),
            Some(StageError::InvalidFilterSpec { .. })
        ));
    }

    #[test]
    fn runner_executes_file_to_file() {
        let dir = tempdir().unwrap();
        let config = WorkflowConfig {
            input_path: dir.path().join("input.wav"),
            output_path: dir.path().join("output.wav"),
            ..Default::default()
        };
        let generator = GeneratorConfig::default();
        write_am_recording(&config.input_path, &generator).unwrap();

        let result = Runner::new(config.clone()).execute().unwrap();
        assert_eq!(result.state, PipelineState::Saved);

        let saved = wav::load_waveform(&config.output_path).unwrap();
        assert_eq!(saved.sample_rate, generator.sample_rate);
        assert_eq!(saved.len(), result.filtered.len());
    }

    #[test]
    fn missing_input_leaves_no_output() {
        let dir = tempdir().unwrap();
        let config = WorkflowConfig {
            input_path: dir.path().join("absent.wav"),
            output_path: dir.path().join("output.wav"),
            ..Default::default()
        };
        let err = Runner::new(config.clone()).execute().unwrap_err();
        assert!(matches!(stage_error(&err), Some(StageError::Io { .. })));
        assert!(!config.output_path.exists());
    }
}
