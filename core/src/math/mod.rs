pub mod geometry;
pub mod matrix;
pub mod signal;
pub mod sphere;
pub mod stats;

pub use matrix::MatrixHelper;
pub use sphere::ObservationGrid;
pub use stats::StatsHelper;
