//! Core signal-processing stages for recovering amplitude-modulated audio.
//!
//! A recording is analysed for its dominant carrier, coherently demodulated
//! against a regenerated cosine, and cleaned with a zero-phase Butterworth
//! band-pass. Each step is a [`ProcessingStage`] so drivers can chain them.

pub mod math;
pub mod prelude;
pub mod processing;
pub mod signal;
pub mod telemetry;
pub mod wav;

pub use prelude::{PipelineState, ProcessingStage, StageConfig, StageInput, StageOutput};
pub use signal::{CarrierEstimate, FilterSpec, Spectrum, Waveform};
