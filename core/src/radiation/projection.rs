use crate::math::geometry::{project_vectors, vector_normal};
use crate::math::stats::StatsHelper;
use crate::prelude::{SourceError, SourceResult};
use crate::radiation::wave::Component;
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Bias added before taking the sign so that exact zeros count as positive.
pub const SIGN_TIE_BIAS: f64 = 1e-5;

/// Signed amplitude of a displacement field along a polarization component.
#[derive(Debug, Clone)]
pub struct ComponentAmplitudes {
    pub amplitudes: Array1<f64>,
    /// 3 x n displacement after projection.
    pub projected: Array2<f64>,
}

/// Projects `displacement` on the `component` direction at each observation
/// (or on itself when no component is given). Amplitudes are the projected
/// norms carrying the sign of `displacement · direction`.
pub fn disp_component(
    observations: ArrayView2<f64>,
    displacement: ArrayView2<f64>,
    component: Option<Component>,
) -> SourceResult<ComponentAmplitudes> {
    if observations.shape() != displacement.shape() {
        return Err(SourceError::Dimension(format!(
            "observations {:?} and displacement {:?} must share a 3 x n shape",
            observations.shape(),
            displacement.shape()
        )));
    }
    let direction = match component {
        Some(kind) => vector_normal(observations, kind)?,
        None => displacement.to_owned(),
    };
    project_signed(displacement, direction.view())
}

/// Signed projected norms of `displacement` along precomputed `direction`s.
pub fn project_signed(
    displacement: ArrayView2<f64>,
    direction: ArrayView2<f64>,
) -> SourceResult<ComponentAmplitudes> {
    let projected = project_vectors(displacement, direction)?;
    let signs = (&displacement * &direction).sum_axis(Axis(0));
    let amplitudes = Array1::from_iter(projected.axis_iter(Axis(1)).zip(signs.iter()).map(
        |(column, &dot)| {
            let norm = column.iter().map(|v| v * v).sum::<f64>().sqrt();
            norm * StatsHelper::sign(dot + SIGN_TIE_BIAS)
        },
    ));
    Ok(ComponentAmplitudes {
        amplitudes,
        projected,
    })
}
