//! Observed-data contract consumed by the scan.

pub mod wavelet;

pub use wavelet::{ObservedData, Wavelet};
