use crate::signal::{CarrierEstimate, Spectrum};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shared configuration for each processing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub carrier_search_floor_hz: f64,
    pub band_low_hz: f64,
    pub band_high_hz: f64,
    pub filter_order: usize,
    pub display_ceiling_hz: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            carrier_search_floor_hz: 1000.0,
            band_low_hz: 20.0,
            band_high_hz: 6000.0,
            filter_order: 5,
            display_ceiling_hz: 20_000.0,
        }
    }
}

/// Input payload for a processing stage.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub spectrum: Option<Spectrum>,
    pub carrier: Option<CarrierEstimate>,
}

impl StageInput {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            spectrum: None,
            carrier: None,
        }
    }

    pub fn with_spectrum(mut self, spectrum: Spectrum) -> Self {
        self.spectrum = Some(spectrum);
        self
    }

    pub fn with_carrier(mut self, carrier: CarrierEstimate) -> Self {
        self.carrier = Some(carrier);
        self
    }
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub samples: Vec<f32>,
    pub metadata: StageMetadata,
}

/// Metadata used for chaining stages and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub spectrum: Option<Spectrum>,
    pub carrier: Option<CarrierEstimate>,
    pub notes: Vec<String>,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: hound::Error,
    },
    #[error("degenerate signal: {0}")]
    DegenerateSignal(String),
    #[error(
        "invalid filter spec: order {order}, band {low} Hz..{high} Hz (nyquist {nyquist} Hz)"
    )]
    InvalidFilterSpec {
        order: usize,
        low: f64,
        high: f64,
        nyquist: f64,
    },
    #[error("carrier not found: {0}")]
    CarrierNotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait describing object-oriented signal-processing stages.
pub trait ProcessingStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()>;
    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput>;
    fn cleanup(&mut self);
}

/// Position of a batch run in the load → save sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Loaded,
    Analyzed,
    CarrierFound,
    Demodulated,
    Filtered,
    Saved,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Loaded => "LOADED",
            PipelineState::Analyzed => "ANALYZED",
            PipelineState::CarrierFound => "CARRIER_FOUND",
            PipelineState::Demodulated => "DEMODULATED",
            PipelineState::Filtered => "FILTERED",
            PipelineState::Saved => "SAVED",
        };
        f.write_str(name)
    }
}
