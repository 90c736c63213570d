//! Moment tensor decomposition.
//!
//! The scan core only needs percentages, one equivalent fault plane and the
//! principal axes of a tensor. Those come from a [`Decomposer`]; the default
//! [`EigenDecomposer`] derives them from the eigen-system of the tensor.

use crate::prelude::{SourceError, SourceResult};
use crate::tensor::mechanism::{select_plane, Mechanism};
use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;

/// Everything the scan needs to know about a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub dc_percent: f64,
    pub clvd_percent: f64,
    pub iso_percent: f64,
    pub devi_percent: f64,
    /// Strike, dip, rake (degrees) of both nodal planes.
    pub fault_planes: [[f64; 3]; 2],
    /// Compression axis, unit length, pointing into the lower hemisphere.
    pub p_axis: [f64; 3],
    /// Tension axis, unit length, pointing into the lower hemisphere.
    pub t_axis: [f64; 3],
}

/// Moment tensor decomposition collaborator.
pub trait Decomposer: Send + Sync {
    fn decompose(&self, tensor: &[f64; 6]) -> SourceResult<Decomposition>;
}

/// Eigen-analysis based decomposition: isotropic part from the trace,
/// DC/CLVD split from the ratio of the smallest to the largest deviatoric
/// eigenvalue.
#[derive(Debug, Default, Clone, Copy)]
pub struct EigenDecomposer;

impl Decomposer for EigenDecomposer {
    fn decompose(&self, tensor: &[f64; 6]) -> SourceResult<Decomposition> {
        if tensor.iter().any(|v| !v.is_finite()) {
            return Err(SourceError::InvalidInput(format!(
                "moment tensor {:?} has non-finite components",
                tensor
            )));
        }
        let [mxx, myy, mzz, mxy, mxz, myz] = *tensor;
        let m = Matrix3::new(mxx, mxy, mxz, mxy, myy, myz, mxz, myz, mzz);
        let iso = m.trace() / 3.0;
        let deviatoric = m - Matrix3::identity() * iso;
        let eigen = SymmetricEigen::new(deviatoric);

        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        let values: Vec<f64> = order.iter().map(|&i| eigen.eigenvalues[i]).collect();

        let m0_iso = iso.abs();
        let m0_devi = values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        let m0 = m0_iso + m0_devi;
        if m0 == 0.0 {
            return Err(SourceError::InvalidInput(
                "zero moment tensor has no decomposition".into(),
            ));
        }
        let iso_percent = 100.0 * m0_iso / m0;
        let devi_percent = 100.0 - iso_percent;
        let smallest = values.iter().fold(f64::INFINITY, |acc, v| acc.min(v.abs()));
        let epsilon = if m0_devi > 0.0 { smallest / m0_devi } else { 0.0 };
        let dc_percent = (1.0 - 2.0 * epsilon) * devi_percent;
        let clvd_percent = 2.0 * epsilon * devi_percent;

        let column = |i: usize| -> Vector3<f64> { eigen.eigenvectors.column(i).into_owned() };
        let p = lower_hemisphere(column(order[0]).normalize());
        let t = lower_hemisphere(column(order[2]).normalize());

        let first = plane_angles((t + p) * FRAC_1_SQRT_2, (t - p) * FRAC_1_SQRT_2);
        let second = plane_angles((t - p) * FRAC_1_SQRT_2, (t + p) * FRAC_1_SQRT_2);

        Ok(Decomposition {
            dc_percent,
            clvd_percent,
            iso_percent,
            devi_percent,
            fault_planes: [first, second],
            p_axis: [p.x, p.y, p.z],
            t_axis: [t.x, t.y, t.z],
        })
    }
}

fn lower_hemisphere(v: Vector3<f64>) -> Vector3<f64> {
    let flip = v.z > 0.0 || (v.z == 0.0 && (v.x < 0.0 || (v.x == 0.0 && v.y < 0.0)));
    if flip {
        -v
    } else {
        v
    }
}

/// Strike, dip, rake (degrees) of the plane with `normal` slipping along
/// `slip`, both given in the East-North-Up frame.
fn plane_angles(normal: Vector3<f64>, slip: Vector3<f64>) -> [f64; 3] {
    // North, East, Down
    let mut n = Vector3::new(normal.y, normal.x, -normal.z);
    let mut d = Vector3::new(slip.y, slip.x, -slip.z);
    if n.z > 0.0 {
        n = -n;
        d = -d;
    }
    let dip = (-n.z).clamp(-1.0, 1.0).acos();
    let sin_dip = dip.sin();
    let (strike, rake) = if sin_dip > 1e-9 {
        let strike = (-n.x).atan2(n.y);
        let rake = (-d.z / sin_dip).atan2(d.x * strike.cos() + d.y * strike.sin());
        (strike, rake)
    } else {
        // horizontal plane, strike and rake trade off; keep strike at north
        (0.0, (-d.y).atan2(d.x))
    };
    [
        strike.to_degrees().rem_euclid(360.0),
        dip.to_degrees(),
        rake.to_degrees(),
    ]
}

/// Angles and component percentages of a mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MtAngles {
    /// Strike, dip, rake in degrees.
    pub angles: [f64; 3],
    /// DC, CLVD, isotropic and deviatoric percentages; NaN when unknown.
    pub percentages: [f64; 4],
}

/// Strike/dip/rake and percentages of any mechanism view.
pub fn mt_angles(mechanism: &Mechanism, decomposer: &dyn Decomposer) -> SourceResult<MtAngles> {
    const PURE_DC: [f64; 4] = [100.0, 0.0, 0.0, 100.0];
    match *mechanism {
        Mechanism::Angles(angles) => Ok(MtAngles {
            angles,
            percentages: PURE_DC,
        }),
        Mechanism::AnglesPair(pair) => Ok(MtAngles {
            angles: select_plane(&pair),
            percentages: PURE_DC,
        }),
        Mechanism::AnglesWithDeviatoric([strike, dip, rake, devi]) => Ok(MtAngles {
            angles: [strike, dip, rake],
            percentages: [f64::NAN, f64::NAN, 0.0, devi],
        }),
        Mechanism::SixComponent(_) | Mechanism::FullMatrix(_) => {
            let tensor = mechanism.tensor()?;
            let parts = decomposer.decompose(&tensor)?;
            Ok(MtAngles {
                angles: select_plane(&parts.fault_planes),
                percentages: [
                    parts.dc_percent,
                    parts.clvd_percent,
                    parts.iso_percent,
                    parts.devi_percent,
                ],
            })
        }
    }
}
