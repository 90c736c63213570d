use ndarray::{Array1, ArrayView1, ArrayView2};

pub struct MatrixHelper;

impl MatrixHelper {
    /// `M · v` for a 3 x 3 tensor and a direction.
    pub fn apply(matrix: ArrayView2<f64>, vector: ArrayView1<f64>) -> Array1<f64> {
        matrix.dot(&vector)
    }

    /// `vᵀ · M · v`.
    pub fn quadratic_form(matrix: ArrayView2<f64>, vector: ArrayView1<f64>) -> f64 {
        vector.dot(&matrix.dot(&vector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn quadratic_form_of_identity_is_squared_norm() {
        let identity = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let v = array![1.0, 2.0, 2.0];
        assert_eq!(MatrixHelper::quadratic_form(identity.view(), v.view()), 9.0);
        assert_eq!(
            MatrixHelper::apply(identity.view(), v.view()).to_vec(),
            vec![1.0, 2.0, 2.0]
        );
    }
}
