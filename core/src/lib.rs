//! Seismic source radiation patterns and grid-search focal mechanism
//! inversion.
//!
//! Forward models turn a moment tensor into signed far-field amplitudes; the
//! source scan compares observed first-motion wavelets with those amplitudes
//! over a cached grid of mechanisms and ranks every mechanism by `P(Mt|d)`.

pub mod data;
pub mod grid;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod radiation;
pub mod telemetry;
pub mod tensor;

pub use data::{ObservedData, Wavelet};
pub use grid::{GridKey, MechanismGrid};
pub use prelude::{RadiationModel, ScanConfig, SourceError, SourceResult};
pub use processing::{CorrectedData, PtPdf, ScanResult, SourceScan};
pub use radiation::{Component, SeismicSource, SimpleModel, WaveType};
pub use tensor::Mechanism;
