pub mod butterworth;
pub mod fft;
pub mod stats;

pub use butterworth::{Biquad, SosFilter};
pub use fft::FftHelper;
pub use stats::StatsHelper;
