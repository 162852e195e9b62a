use crate::workflow::config::WorkflowConfig;
use crate::workflow::runner::{WorkflowResult, EXCERPT_LEN};
use amcore::math::SosFilter;
use amcore::prelude::PipelineState;
use amcore::signal::{CarrierEstimate, FilterSpec, Spectrum};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Points at which the band-pass response is sampled between 0 Hz and Nyquist.
pub const RESPONSE_POINTS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResponse {
    pub spec: FilterSpec,
    pub frequencies_hz: Vec<f64>,
    pub gain: Vec<f64>,
}

/// Data behind the spectrum, filter and time-domain views of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub state: PipelineState,
    pub sample_rate: u32,
    pub sample_count: usize,
    pub display_ceiling_hz: f64,
    pub carrier: CarrierEstimate,
    pub input_spectrum: Spectrum,
    pub demodulated_spectrum: Spectrum,
    pub filtered_spectrum: Spectrum,
    pub filter_response: FilterResponse,
    pub modulated_excerpt: Vec<f32>,
    pub demodulated_excerpt: Vec<f32>,
    pub filtered_excerpt: Vec<f32>,
    pub notes: Vec<String>,
}

impl DiagnosticReport {
    pub fn from_result(result: &WorkflowResult, config: &WorkflowConfig) -> anyhow::Result<Self> {
        let nyquist = result.filtered.nyquist();
        let ceiling = config.display_ceiling_hz.min(nyquist);

        let spec = FilterSpec::new(config.filter_order, config.band_low_hz, config.band_high_hz);
        let filter = SosFilter::butterworth_bandpass(&spec, result.sample_rate)
            .context("designing band-pass for the response view")?;
        let frequencies_hz: Vec<f64> = (0..RESPONSE_POINTS)
            .map(|k| nyquist * k as f64 / RESPONSE_POINTS as f64)
            .collect();
        let gain = frequencies_hz
            .iter()
            .map(|&freq| filter.magnitude_response(freq, result.sample_rate))
            .collect();

        let filtered = &result.filtered.samples;
        Ok(Self {
            state: result.state,
            sample_rate: result.sample_rate,
            sample_count: result.filtered.len(),
            display_ceiling_hz: ceiling,
            carrier: result.carrier,
            input_spectrum: result.input_spectrum.truncated(ceiling),
            demodulated_spectrum: result.demodulated_spectrum.truncated(ceiling),
            filtered_spectrum: result.filtered_spectrum.truncated(ceiling),
            filter_response: FilterResponse {
                spec,
                frequencies_hz,
                gain,
            },
            modulated_excerpt: result.modulated_excerpt.clone(),
            demodulated_excerpt: result.demodulated_excerpt.clone(),
            filtered_excerpt: filtered[..filtered.len().min(EXCERPT_LEN)].to_vec(),
            notes: result.notes.clone(),
        })
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("creating report {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("writing report {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("flushing report {}", path.display()))?;
        Ok(())
    }
}
