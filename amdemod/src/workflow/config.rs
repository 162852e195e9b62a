use amcore::prelude::StageConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "signal_modulated_noisy_audio.wav";
pub const DEFAULT_OUTPUT: &str = "filtered_audio.wav";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub input_path: PathBuf,
    pub carrier_search_floor_hz: f64,
    pub band_low_hz: f64,
    pub band_high_hz: f64,
    pub filter_order: usize,
    pub output_path: PathBuf,
    pub display_ceiling_hz: f64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let stage = StageConfig::default();
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            carrier_search_floor_hz: stage.carrier_search_floor_hz,
            band_low_hz: stage.band_low_hz,
            band_high_hz: stage.band_high_hz,
            filter_order: stage.filter_order,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            display_ceiling_hz: stage.display_ceiling_hz,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn to_stage_config(&self) -> StageConfig {
        StageConfig {
            carrier_search_floor_hz: self.carrier_search_floor_hz,
            band_low_hz: self.band_low_hz,
            band_high_hz: self.band_high_hz,
            filter_order: self.filter_order,
            display_ceiling_hz: self.display_ceiling_hz,
        }
    }
}
