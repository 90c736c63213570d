use crate::prelude::{SourceError, SourceResult};
use ndarray::{array, Array2};
use serde::{Deserialize, Serialize};

const ACCEPTED_SHAPES: &str = "only [1|2]x3, 1x[4|6] and 3x3 inputs supported";

/// The accepted views of a source mechanism. Angles are in degrees and
/// tensors use the `(Mxx, Myy, Mzz, Mxy, Mxz, Myz)` ordering in the
/// x = East, y = North, z = Up frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mechanism {
    /// Strike, dip, rake of a pure double couple.
    Angles([f64; 3]),
    /// Strike, dip, rake and deviatoric percentage.
    AnglesWithDeviatoric([f64; 4]),
    SixComponent([f64; 6]),
    /// Both nodal-plane solutions of one double couple.
    AnglesPair([[f64; 3]; 2]),
    FullMatrix([[f64; 3]; 3]),
}

impl Mechanism {
    pub fn from_slice(values: &[f64]) -> SourceResult<Self> {
        match values.len() {
            3 => Ok(Self::Angles([values[0], values[1], values[2]])),
            4 => Ok(Self::AnglesWithDeviatoric([
                values[0], values[1], values[2], values[3],
            ])),
            6 => Ok(Self::SixComponent([
                values[0], values[1], values[2], values[3], values[4], values[5],
            ])),
            n => Err(SourceError::Dimension(format!(
                "got 1x{}; {}",
                n, ACCEPTED_SHAPES
            ))),
        }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> SourceResult<Self> {
        if rows.len() == 1 {
            return Self::from_slice(&rows[0]);
        }
        if rows.iter().any(|row| row.len() != 3) || !(rows.len() == 2 || rows.len() == 3) {
            let widths: Vec<usize> = rows.iter().map(Vec::len).collect();
            return Err(SourceError::Dimension(format!(
                "got {} rows of widths {:?}; {}",
                rows.len(),
                widths,
                ACCEPTED_SHAPES
            )));
        }
        let row = |i: usize| [rows[i][0], rows[i][1], rows[i][2]];
        if rows.len() == 2 {
            Ok(Self::AnglesPair([row(0), row(1)]))
        } else {
            Ok(Self::FullMatrix([row(0), row(1), row(2)]))
        }
    }

    /// Six independent tensor components of this mechanism.
    pub fn tensor(&self) -> SourceResult<[f64; 6]> {
        match *self {
            Self::Angles([strike, dip, rake]) => Ok(double_couple(strike, dip, rake)),
            Self::AnglesPair(pair) => {
                let [strike, dip, rake] = select_plane(&pair);
                Ok(double_couple(strike, dip, rake))
            }
            Self::AnglesWithDeviatoric(_) => Err(SourceError::Dimension(
                "1x4 (strike, dip, rake, deviatoric%) does not define a unique tensor; \
                 pass 1x3, 2x3, 1x6 or 3x3"
                    .into(),
            )),
            Self::SixComponent(mt) => Ok(mt),
            Self::FullMatrix(m) => Ok([m[0][0], m[1][1], m[2][2], m[0][1], m[0][2], m[1][2]]),
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Self::Angles(_) => "1x3",
            Self::AnglesWithDeviatoric(_) => "1x4",
            Self::SixComponent(_) => "1x6",
            Self::AnglesPair(_) => "2x3",
            Self::FullMatrix(_) => "3x3",
        }
    }
}

/// Picks one of two equivalent nodal planes: the first unless the second
/// has the smaller absolute strike.
pub fn select_plane(pair: &[[f64; 3]; 2]) -> [f64; 3] {
    if pair[0][0].abs() < pair[1][0].abs() {
        pair[0]
    } else {
        pair[1]
    }
}

/// Symmetric 3 x 3 tensor of a 1x6 or 3x3 mechanism.
pub fn mt_full(mechanism: &Mechanism) -> SourceResult<Array2<f64>> {
    match *mechanism {
        Mechanism::SixComponent(mt) => Ok(array![
            [mt[0], mt[3], mt[4]],
            [mt[3], mt[1], mt[5]],
            [mt[4], mt[5], mt[2]]
        ]),
        Mechanism::FullMatrix(m) => Ok(array![
            [m[0][0], m[0][1], m[0][2]],
            [m[1][0], m[1][1], m[1][2]],
            [m[2][0], m[2][1], m[2][2]]
        ]),
        other => Err(SourceError::Dimension(format!(
            "got {}; only 1x6 or 3x3 input supported",
            other.shape()
        ))),
    }
}

/// Double-couple tensor of a strike/dip/rake triple (degrees), unit moment.
///
/// Components follow Aki & Richards (2002, box 4.4) in North-East-Down and
/// are rotated into the East-North-Up frame.
pub fn double_couple(strike: f64, dip: f64, rake: f64) -> [f64; 6] {
    let (phi, delta, lambda) = (strike.to_radians(), dip.to_radians(), rake.to_radians());
    let (sd, cd) = delta.sin_cos();
    let (sr, cr) = lambda.sin_cos();
    let (sp, cp) = phi.sin_cos();
    let s2d = (2.0 * delta).sin();
    let c2d = (2.0 * delta).cos();
    let s2p = (2.0 * phi).sin();
    let c2p = (2.0 * phi).cos();

    let nn = -(sd * cr * s2p + s2d * sr * sp * sp);
    let ee = sd * cr * s2p - s2d * sr * cp * cp;
    let dd = s2d * sr;
    let ne = sd * cr * c2p + 0.5 * s2d * sr * s2p;
    let nd = -(cd * cr * cp + c2d * sr * sp);
    let ed = -(cd * cr * sp - c2d * sr * cp);

    [ee, nn, dd, ne, -ed, -nd]
}
