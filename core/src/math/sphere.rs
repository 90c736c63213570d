use crate::math::geometry::{
    cartesian_to_spherical, spherical_to_cartesian, to_cartesian, to_spherical,
};
use crate::prelude::{SourceError, SourceResult};
use ndarray::{Array2, ArrayView1};
use std::f64::consts::PI;
use std::sync::OnceLock;

/// Point count of the default observation sphere.
pub const DEFAULT_SPHERE_POINTS: usize = 1000;

/// Resolution split between azimuth and polar angle in [`ObservationGrid::sphere`].
const SPHERE_SPLIT_EXPONENT: f64 = 0.038;

static DEFAULT_SPHERE: OnceLock<ObservationGrid> = OnceLock::new();

/// Immutable set of observation directions kept in both cartesian and
/// spherical form.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationGrid {
    cartesian: Array2<f64>,
    spherical: Array2<f64>,
}

impl ObservationGrid {
    pub fn from_cartesian(cartesian: Array2<f64>) -> SourceResult<Self> {
        let spherical = cartesian_to_spherical(cartesian.view())?;
        Ok(Self {
            cartesian,
            spherical,
        })
    }

    /// Accepts `2 x n` (unit radius) or `3 x n` spherical coordinates.
    pub fn from_spherical(spherical: Array2<f64>) -> SourceResult<Self> {
        let cartesian = spherical_to_cartesian(spherical.view())?;
        let spherical = if spherical.nrows() == 2 {
            cartesian_to_spherical(cartesian.view())?
        } else {
            spherical
        };
        Ok(Self {
            cartesian,
            spherical,
        })
    }

    /// Azimuth x polar-angle meshgrid with slightly more azimuth samples,
    /// flattened polar-major.
    pub fn sphere(radius: f64, n: usize) -> Self {
        let n = n as f64;
        let n_azimuth = ((n.powf(0.5 + SPHERE_SPLIT_EXPONENT) + 1.0).floor() as usize).max(2);
        let n_polar = (n.powf(0.5 - SPHERE_SPLIT_EXPONENT).floor() as usize).max(2);
        let azimuths = linspace(0.0, 2.0 * PI, n_azimuth);
        let polars = linspace(0.0, PI, n_polar);

        let count = n_azimuth * n_polar;
        let mut spherical = Array2::zeros((3, count));
        let mut cartesian = Array2::zeros((3, count));
        for (i, &polar) in polars.iter().enumerate() {
            for (j, &azimuth) in azimuths.iter().enumerate() {
                let column = i * n_azimuth + j;
                let sph = [azimuth, polar, radius];
                let xyz = to_cartesian(sph);
                for row in 0..3 {
                    spherical[[row, column]] = sph[row];
                    cartesian[[row, column]] = xyz[row];
                }
            }
        }
        Self {
            cartesian,
            spherical,
        }
    }

    /// Quasi-uniform golden-angle (Fibonacci) sampling, from the top pole down.
    pub fn globe(radius: f64, n: usize) -> Self {
        let golden_angle = PI * (3.0 - 5f64.sqrt());
        let nf = n as f64;
        let zs = linspace(1.0 - 1.0 / nf, 1.0 / nf - 1.0, n);
        let mut cartesian = Array2::zeros((3, n));
        let mut spherical = Array2::zeros((3, n));
        for (i, &z) in zs.iter().enumerate() {
            let theta = golden_angle * i as f64;
            let ring = (1.0 - z * z).max(0.0).sqrt();
            let xyz = [
                radius * ring * theta.cos(),
                radius * ring * theta.sin(),
                radius * z,
            ];
            let sph = to_spherical(xyz);
            for row in 0..3 {
                cartesian[[row, i]] = xyz[row];
                spherical[[row, i]] = sph[row];
            }
        }
        Self {
            cartesian,
            spherical,
        }
    }

    /// Shared default unit sphere, built on first use.
    pub fn default_sphere() -> &'static ObservationGrid {
        DEFAULT_SPHERE.get_or_init(|| Self::sphere(1.0, DEFAULT_SPHERE_POINTS))
    }

    /// Subset of the directions, in the order given.
    pub fn select(&self, indices: &[usize]) -> SourceResult<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(SourceError::Dimension(format!(
                "direction index {} out of range for {} directions",
                bad,
                self.len()
            )));
        }
        Ok(Self {
            cartesian: self.cartesian.select(ndarray::Axis(1), indices),
            spherical: self.spherical.select(ndarray::Axis(1), indices),
        })
    }

    pub fn len(&self) -> usize {
        self.cartesian.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cartesian(&self) -> &Array2<f64> {
        &self.cartesian
    }

    pub fn spherical(&self) -> &Array2<f64> {
        &self.spherical
    }

    pub fn azimuths(&self) -> ArrayView1<'_, f64> {
        self.spherical.row(0)
    }

    pub fn polar_angles(&self) -> ArrayView1<'_, f64> {
        self.spherical.row(1)
    }

    /// Index of the direction closest to `(azimuth, polar, radius)`, measured
    /// as the euclidean distance between spherical coordinate triples.
    pub fn nearest_spherical(&self, target: [f64; 3]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for index in 0..self.len() {
            let d = (0..3)
                .map(|row| (target[row] - self.spherical[[row, index]]).powi(2))
                .sum::<f64>()
                .sqrt();
            match best {
                Some((_, current)) if d >= current => {}
                _ => best = Some((index, d)),
            }
        }
        best.map(|(index, _)| index)
    }
}

fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}
