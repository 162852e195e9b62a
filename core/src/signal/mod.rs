pub mod filter_spec;
pub mod spectrum;
pub mod waveform;

pub use filter_spec::FilterSpec;
pub use spectrum::{CarrierEstimate, Spectrum};
pub use waveform::Waveform;
