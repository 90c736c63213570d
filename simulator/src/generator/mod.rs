//! Wavelet providers that stand in for real observations.

pub mod artificial;
pub mod noise;
pub mod synthetic;

pub use artificial::ArtificialWavelets;
pub use noise::degrade;
pub use synthetic::SyntheticWavelets;
