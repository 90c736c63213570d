//! Far-field radiation patterns of seismic sources.

pub mod aki_richards;
pub mod energy;
pub mod projection;
pub mod source;
pub mod vavrycuk;
pub mod wave;

pub use aki_richards::AkiRichards;
pub use energy::EnergyStats;
pub use projection::{disp_component, project_signed, ComponentAmplitudes};
pub use source::{SeismicSource, SimpleModel};
pub use vavrycuk::Vavrycuk;
pub use wave::{Component, RatioKind, WaveType};
