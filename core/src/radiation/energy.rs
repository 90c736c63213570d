use crate::math::stats::StatsHelper;
use ndarray::{ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Weighted statistics of a radiation amplitude field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyStats {
    pub rms: f64,
    /// Euclidean norm.
    pub norm: f64,
    pub average: f64,
}

impl EnergyStats {
    /// Statistics of the norms of a `3 x n` displacement field. Each amplitude
    /// is weighted by its squared distance to the field maximum.
    pub fn from_displacement(displacement: ArrayView2<f64>) -> Self {
        let amplitudes: Vec<f64> = displacement
            .axis_iter(Axis(1))
            .map(|column| column.iter().map(|v| v * v).sum::<f64>().sqrt())
            .collect();
        Self::from_amplitudes(&amplitudes)
    }

    pub fn from_amplitudes(amplitudes: &[f64]) -> Self {
        let peak = StatsHelper::nan_max(&amplitudes.iter().map(|a| a.abs()).collect::<Vec<_>>());
        let weights: Vec<f64> = amplitudes.iter().map(|a| (peak - a).powi(2)).collect();
        let weight_sum: f64 = weights.iter().sum();
        let weighted: Vec<f64> = amplitudes
            .iter()
            .zip(&weights)
            .map(|(a, w)| (w * a).powi(2))
            .collect();
        let energy = StatsHelper::nan_sum(&weighted);
        let absolute: Vec<f64> = amplitudes
            .iter()
            .zip(&weights)
            .map(|(a, w)| (a * w).abs())
            .collect();
        Self {
            rms: (energy / weight_sum).sqrt(),
            norm: energy.sqrt(),
            average: StatsHelper::nan_sum(&absolute) / weight_sum,
        }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.rms, self.norm, self.average]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn peak_sample_carries_no_weight() {
        let stats = EnergyStats::from_amplitudes(&[0.0, 1.0, 2.0]);
        // weights 4, 1, 0
        assert!((stats.norm - 1.0).abs() < 1e-12);
        assert!((stats.rms - (1.0f64 / 5.0).sqrt()).abs() < 1e-12);
        assert!((stats.average - 0.2).abs() < 1e-12);
    }

    #[test]
    fn displacement_norms_feed_the_statistics() {
        let field = array![[3.0, 0.0, 0.0], [4.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let from_field = EnergyStats::from_displacement(field.view());
        let from_norms = EnergyStats::from_amplitudes(&[5.0, 1.0, 0.0]);
        assert_eq!(from_field, from_norms);
    }

    #[test]
    fn constant_field_has_undefined_rms() {
        let stats = EnergyStats::from_amplitudes(&[1.0, 1.0]);
        assert!(stats.rms.is_nan());
        assert_eq!(stats.norm, 0.0);
    }
}
