//! Smoothed P- and T-axis probability surfaces.

use crate::math::geometry::haversine_polar;
use crate::math::stats::StatsHelper;
use crate::prelude::{SourceError, SourceResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const PDF_AZIMUTHS: usize = 100;
pub const PDF_POLAR_ANGLES: usize = 50;

/// Smallest distance fed to the inverse-distance kernel.
const MIN_DISTANCE: f64 = 1e-12;

/// Axis probability surfaces on an azimuth x polar-angle mesh. Rows follow
/// `polar_angles`, columns follow `azimuths`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtPdf {
    pub azimuths: Vec<f64>,
    pub polar_angles: Vec<f64>,
    pub p_axis: Vec<Vec<f64>>,
    pub t_axis: Vec<Vec<f64>>,
}

impl PtPdf {
    /// Kernel-smooths `-posterior` from each mechanism's axis onto the mesh,
    /// then rescales both surfaces together into the posterior's range.
    pub fn build(
        p_axes: &[[f64; 3]],
        t_axes: &[[f64; 3]],
        posterior: &[f64],
    ) -> SourceResult<Self> {
        if p_axes.len() != posterior.len() || t_axes.len() != posterior.len() {
            return Err(SourceError::Dimension(format!(
                "{} P axes and {} T axes for {} posterior values",
                p_axes.len(),
                t_axes.len(),
                posterior.len()
            )));
        }
        let azimuths = linspace(-PI, PI, PDF_AZIMUTHS);
        let polar_angles = linspace(0.0, PI, PDF_POLAR_ANGLES);
        let mut p_axis = smooth(p_axes, posterior, &azimuths, &polar_angles);
        let mut t_axis = smooth(t_axes, posterior, &azimuths, &polar_angles);

        let peak = surface_max(&p_axis).max(surface_max(&t_axis));
        if peak != 0.0 {
            let scale = StatsHelper::nan_max(posterior) / peak;
            for row in p_axis.iter_mut().chain(t_axis.iter_mut()) {
                row.iter_mut().for_each(|v| *v *= scale);
            }
        }
        Ok(Self {
            azimuths,
            polar_angles,
            p_axis,
            t_axis,
        })
    }

    /// `(rows, columns)` of each surface.
    pub fn shape(&self) -> (usize, usize) {
        (self.polar_angles.len(), self.azimuths.len())
    }
}

fn smooth(
    axes: &[[f64; 3]],
    posterior: &[f64],
    azimuths: &[f64],
    polars: &[f64],
) -> Vec<Vec<f64>> {
    polars
        .iter()
        .map(|&polar| {
            azimuths
                .iter()
                .map(|&azimuth| {
                    let mut weighted = 0.0;
                    let mut total = 0.0;
                    for (axis, &p) in axes.iter().zip(posterior.iter()) {
                        let distance = haversine_polar(axis[0], axis[1], azimuth, polar, 1.0);
                        let kernel = 1.0 / (distance.max(MIN_DISTANCE) / PI).sqrt();
                        weighted += -p * kernel;
                        total += kernel;
                    }
                    weighted / total
                })
                .collect()
        })
        .collect()
}

fn surface_max(surface: &[Vec<f64>]) -> f64 {
    surface
        .iter()
        .flatten()
        .fold(f64::NEG_INFINITY, |acc, &v| {
            if v.is_nan() || acc.is_nan() {
                f64::NAN
            } else {
                acc.max(v)
            }
        })
}

fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![start; count];
    }
    let step = (stop - start) / (count - 1) as f64;
    (0..count).map(|k| start + k as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surfaces_have_fifty_by_hundred_nodes() {
        let axes = [[0.0, 1.0, 1.0], [2.0, 2.0, 1.0]];
        let pdf = PtPdf::build(&axes, &axes, &[0.5, -0.1]).unwrap();
        assert_eq!(pdf.shape(), (50, 100));
        assert_eq!(pdf.p_axis.len(), 50);
        assert!(pdf.p_axis.iter().all(|row| row.len() == 100));
        assert!((pdf.azimuths[0] + PI).abs() < 1e-12);
        assert!((pdf.polar_angles[49] - PI).abs() < 1e-12);
    }

    #[test]
    fn single_mechanism_surface_is_flat_at_its_posterior() {
        let axes = [[0.7, 1.2, 1.0]];
        let pdf = PtPdf::build(&axes, &axes, &[-0.5]).unwrap();
        for value in pdf.p_axis.iter().chain(pdf.t_axis.iter()).flatten() {
            assert!((value + 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn nearer_axes_weigh_more() {
        let p_axes = [[0.0, 1.0, 1.0], [3.0, 2.5, 1.0]];
        let pdf = PtPdf::build(&p_axes, &p_axes, &[1.0, 0.0]).unwrap();
        let column = pdf.azimuths.iter().position(|a| a.abs() < 0.04).unwrap();
        let row = pdf.polar_angles.iter().position(|p| (p - 1.0).abs() < 0.04).unwrap();
        let near = pdf.p_axis[row][column];
        let far = pdf.p_axis[49 - row][99 - column];
        assert!(near.abs() > far.abs());
    }

    #[test]
    fn zero_posterior_skips_rescaling() {
        let axes = [[0.0, 1.0, 1.0]];
        let pdf = PtPdf::build(&axes, &axes, &[0.0]).unwrap();
        assert!(pdf.p_axis.iter().flatten().all(|v| *v == 0.0));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let axes = [[0.0, 1.0, 1.0]];
        assert!(PtPdf::build(&axes, &axes, &[0.1, 0.2]).is_err());
    }
}
