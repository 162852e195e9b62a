pub mod bandpass;
pub mod carrier;
pub mod demod;
pub mod spectrum;

pub use bandpass::BandpassStage;
pub use carrier::CarrierStage;
pub use demod::DemodulationStage;
pub use spectrum::SpectrumStage;
