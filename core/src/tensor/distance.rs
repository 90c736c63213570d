//! Angular distances between mechanisms.

use crate::math::geometry::{axial_angle, haversine_polar};
use crate::prelude::SourceResult;
use crate::tensor::decomposition::Decomposer;
use crate::tensor::mechanism::Mechanism;
use std::f64::consts::FRAC_PI_2;

/// Mean angle (degrees) between the P axes and between the T axes of two
/// mechanisms. Axes are undirected so the result lies in `[0, 90]`.
pub fn axis_distance(
    lhs: &Mechanism,
    rhs: &Mechanism,
    decomposer: &dyn Decomposer,
) -> SourceResult<f64> {
    let a = decomposer.decompose(&lhs.tensor()?)?;
    let b = decomposer.decompose(&rhs.tensor()?)?;
    let p = axial_angle(a.p_axis, b.p_axis);
    let t = axial_angle(a.t_axis, b.t_axis);
    Ok(((p + t) / 2.0).to_degrees())
}

/// Mean over the planes of `lhs` of the smallest great-circle distance
/// (degrees) to a plane of `rhs`, with strike as longitude and dip as
/// polar angle. Distances are folded by quarter turns into `[0, pi/2]`.
pub fn fault_plane_difference(
    lhs: &Mechanism,
    rhs: &Mechanism,
    decomposer: &dyn Decomposer,
) -> SourceResult<f64> {
    let a = decomposer.decompose(&lhs.tensor()?)?.fault_planes;
    let b = decomposer.decompose(&rhs.tensor()?)?.fault_planes;
    let mut total = 0.0;
    for plane in &a {
        let closest = b
            .iter()
            .map(|other| {
                let mut d = haversine_polar(
                    plane[0].to_radians(),
                    plane[1].to_radians(),
                    other[0].to_radians(),
                    other[1].to_radians(),
                    1.0,
                );
                while d > FRAC_PI_2 {
                    d -= FRAC_PI_2;
                }
                d
            })
            .fold(f64::INFINITY, f64::min);
        total += closest;
    }
    Ok((total / a.len() as f64).to_degrees())
}
