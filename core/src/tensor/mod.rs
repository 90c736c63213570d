//! Moment tensor representations, decomposition and comparison.

pub mod decomposition;
pub mod distance;
pub mod mechanism;

pub use decomposition::{mt_angles, Decomposer, Decomposition, EigenDecomposer, MtAngles};
pub use distance::{axis_distance, fault_plane_difference};
pub use mechanism::{double_couple, mt_full, Mechanism};
