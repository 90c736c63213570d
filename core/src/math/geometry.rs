//! Coordinate transforms and vector helpers on the focal sphere.
//!
//! Fields are stored as `3 x n` arrays: one column per direction, rows
//! `x, y, z` for cartesian data and `azimuth, polar angle, radius` for
//! spherical data. Azimuth is `atan2(y, x)` and the polar angle is measured
//! from `+z`.

use crate::math::stats::StatsHelper;
use crate::prelude::{SourceError, SourceResult};
use crate::radiation::wave::Component;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::f64::consts::{FRAC_PI_2, PI};

/// Guard added to squared norms before dividing by them.
pub const PROJECTION_EPSILON: f64 = 1e-10;

/// `[x, y, z]` to `[azimuth, polar angle, radius]`.
pub fn to_spherical(xyz: [f64; 3]) -> [f64; 3] {
    let [x, y, z] = xyz;
    let radius = (x * x + y * y + z * z).sqrt();
    let polar = if radius == 0.0 {
        FRAC_PI_2 * StatsHelper::sign(z)
    } else {
        (z / radius).acos()
    };
    [y.atan2(x), polar, radius]
}

/// `[azimuth, polar angle, radius]` to `[x, y, z]`.
pub fn to_cartesian(sph: [f64; 3]) -> [f64; 3] {
    let [azimuth, polar, radius] = sph;
    let sin_polar = polar.sin();
    [
        radius * sin_polar * azimuth.cos(),
        radius * sin_polar * azimuth.sin(),
        radius * polar.cos(),
    ]
}

fn expect_rows(field: &ArrayView2<f64>, rows: usize, name: &str) -> SourceResult<()> {
    if field.nrows() != rows {
        return Err(SourceError::Dimension(format!(
            "{} has shape {:?}; expected {} x n",
            name,
            field.shape(),
            rows
        )));
    }
    Ok(())
}

fn column3(field: &ArrayView2<f64>, index: usize) -> [f64; 3] {
    [
        field[[0, index]],
        field[[1, index]],
        field[[2, index]],
    ]
}

/// Converts a `3 x n` cartesian field to spherical coordinates.
pub fn cartesian_to_spherical(xyz: ArrayView2<f64>) -> SourceResult<Array2<f64>> {
    expect_rows(&xyz, 3, "cartesian field")?;
    let mut out = Array2::zeros(xyz.raw_dim());
    for index in 0..xyz.ncols() {
        let sph = to_spherical(column3(&xyz, index));
        for row in 0..3 {
            out[[row, index]] = sph[row];
        }
    }
    Ok(out)
}

/// Converts a spherical field to cartesian coordinates. Accepts `2 x n`
/// (azimuth, polar angle; unit radius) or `3 x n` input.
pub fn spherical_to_cartesian(sph: ArrayView2<f64>) -> SourceResult<Array2<f64>> {
    if sph.nrows() != 2 && sph.nrows() != 3 {
        return Err(SourceError::Dimension(format!(
            "spherical field has shape {:?}; expected 2 x n (azimuth, polar) or 3 x n (azimuth, polar, radius)",
            sph.shape()
        )));
    }
    let mut out = Array2::zeros((3, sph.ncols()));
    for index in 0..sph.ncols() {
        let radius = if sph.nrows() == 3 {
            sph[[2, index]]
        } else {
            1.0
        };
        let xyz = to_cartesian([sph[[0, index]], sph[[1, index]], radius]);
        for row in 0..3 {
            out[[row, index]] = xyz[row];
        }
    }
    Ok(out)
}

/// Projects each column of `b` onto the matching column of `a`.
pub fn project_vectors(b: ArrayView2<f64>, a: ArrayView2<f64>) -> SourceResult<Array2<f64>> {
    expect_rows(&b, 3, "projected field")?;
    expect_rows(&a, 3, "direction field")?;
    if a.ncols() != b.ncols() {
        return Err(SourceError::Dimension(format!(
            "cannot project {} vectors onto {} directions",
            b.ncols(),
            a.ncols()
        )));
    }
    let dots = (&a * &b).sum_axis(Axis(0));
    let norms = (&a * &a).sum_axis(Axis(0)) + PROJECTION_EPSILON;
    let ratio = dots / norms;
    Ok(&a * &ratio.insert_axis(Axis(0)))
}

/// Unit-sphere direction of the requested component at each input direction.
pub fn vector_normal(xyz: ArrayView2<f64>, kind: Component) -> SourceResult<Array2<f64>> {
    let mut atr = cartesian_to_spherical(xyz)?;
    match kind {
        Component::Radial => return Ok(xyz.to_owned()),
        Component::Meridian => {
            atr.row_mut(1).mapv_inplace(|polar| polar - FRAC_PI_2);
        }
        Component::Horizontal => {
            atr.row_mut(0).mapv_inplace(|azimuth| azimuth - FRAC_PI_2);
            atr.row_mut(1).fill(FRAC_PI_2);
        }
        Component::Vertical => {
            atr.row_mut(1).fill(0.0);
        }
    }
    spherical_to_cartesian(atr.view())
}

/// Great-circle distance between two points given by longitude and latitude.
pub fn haversine(lon1: f64, lat1: f64, lon2: f64, lat2: f64, radius: f64) -> f64 {
    let dlon = lon2 - lon1;
    let dlat = lat2 - lat1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // rounding can push `a` slightly above one for antipodal points
    radius * 2.0 * a.clamp(0.0, 1.0).sqrt().asin()
}

/// Same as [`haversine`] with polar angles in place of latitudes.
pub fn haversine_polar(lon1: f64, phi1: f64, lon2: f64, phi2: f64, radius: f64) -> f64 {
    haversine(lon1, FRAC_PI_2 - phi1, lon2, FRAC_PI_2 - phi2, radius)
}

/// Elementwise distances between two `2 x n` (azimuth, polar angle) sets.
pub fn haversine_elementwise(
    first: ArrayView2<f64>,
    second: ArrayView2<f64>,
    radius: f64,
) -> SourceResult<Array1<f64>> {
    if first.nrows() < 2 || second.nrows() < 2 || first.ncols() != second.ncols() {
        return Err(SourceError::Dimension(format!(
            "haversine inputs {:?} and {:?} must both be 2 x n with the same n",
            first.shape(),
            second.shape()
        )));
    }
    Ok(Array1::from_iter((0..first.ncols()).map(|i| {
        haversine_polar(
            first[[0, i]],
            first[[1, i]],
            second[[0, i]],
            second[[1, i]],
            radius,
        )
    })))
}

/// Distances from every node of `grid` (rows) to every direction in
/// `points` (columns). Both inputs are `2 x n` (azimuth, polar angle).
pub fn haversine_broadcast(
    points: ArrayView2<f64>,
    grid: ArrayView2<f64>,
    radius: f64,
) -> SourceResult<Array2<f64>> {
    if points.nrows() < 2 || grid.nrows() < 2 {
        return Err(SourceError::Dimension(format!(
            "haversine inputs {:?} and {:?} must both be 2 x n",
            points.shape(),
            grid.shape()
        )));
    }
    let mut out = Array2::zeros((grid.ncols(), points.ncols()));
    for node in 0..grid.ncols() {
        for point in 0..points.ncols() {
            out[[node, point]] = haversine_polar(
                points[[0, point]],
                points[[1, point]],
                grid[[0, node]],
                grid[[1, node]],
                radius,
            );
        }
    }
    Ok(out)
}

/// Angle in radians between two lines through the origin, in `[0, π/2]`.
pub fn axial_angle(a: [f64; 3], b: [f64; 3]) -> f64 {
    let norm = |v: [f64; 3]| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return FRAC_PI_2;
    }
    let cos = ((a[0] * b[0] + a[1] * b[1] + a[2] * b[2]) / denom).abs();
    let angle = cos.clamp(0.0, 1.0).acos();
    angle.min(PI - angle)
}
