//! Far-field radiation of a general moment tensor after Aki & Richards
//! (2002, eq. 4.29).

use crate::math::geometry::{project_vectors, vector_normal};
use crate::math::sphere::ObservationGrid;
use crate::math::MatrixHelper;
use crate::prelude::{RadiationModel, RadiationPattern, SourceError, SourceResult};
use crate::radiation::wave::{Component, WaveType};
use crate::tensor::mechanism::Mechanism;
use ndarray::{array, Array1, Array2, Axis};

/// Aki-Richards forward model of one moment tensor.
#[derive(Debug, Clone)]
pub struct AkiRichards {
    tensor: Array2<f64>,
}

impl AkiRichards {
    pub fn new(mechanism: &Mechanism) -> SourceResult<Self> {
        Ok(Self::from_tensor(mechanism.tensor()?))
    }

    pub fn from_tensor(mt: [f64; 6]) -> Self {
        Self {
            tensor: array![
                [mt[0], mt[3], mt[4]],
                [mt[3], mt[1], mt[5]],
                [mt[4], mt[5], mt[2]]
            ],
        }
    }

    /// Symmetric 3 x 3 moment tensor.
    pub fn tensor(&self) -> &Array2<f64> {
        &self.tensor
    }

    fn body_wave(&self, wave: WaveType, observations: &Array2<f64>) -> Array2<f64> {
        let mut displacement = Array2::zeros(observations.raw_dim());
        for (index, direction) in observations.axis_iter(Axis(1)).enumerate() {
            let distance = direction.iter().map(|v| v * v).sum::<f64>().sqrt();
            if distance == 0.0 {
                continue;
            }
            let gamma: Array1<f64> = direction.mapv(|v| v / distance);
            let value = match wave {
                WaveType::P => {
                    let radial = MatrixHelper::quadratic_form(self.tensor.view(), gamma.view());
                    &gamma * radial
                }
                _ => {
                    // (γ_n γ_p − δ_np) (M γ)_p
                    let m_gamma = MatrixHelper::apply(self.tensor.view(), gamma.view());
                    let along = gamma.dot(&m_gamma);
                    &gamma * along - &m_gamma
                }
            };
            displacement.column_mut(index).assign(&value);
        }
        displacement
    }
}

impl RadiationModel for AkiRichards {
    fn radpat(
        &self,
        wave: WaveType,
        observations: &ObservationGrid,
    ) -> SourceResult<RadiationPattern> {
        let cartesian = observations.cartesian();
        let displacement = match wave {
            WaveType::P | WaveType::S => self.body_wave(wave, cartesian),
            WaveType::Sv | WaveType::Sh | WaveType::Sm => {
                let shear = self.body_wave(WaveType::S, cartesian);
                let component = match wave {
                    WaveType::Sv => Component::Vertical,
                    WaveType::Sh => Component::Horizontal,
                    _ => Component::Meridian,
                };
                let direction = vector_normal(cartesian.view(), component)?;
                project_vectors(shear.view(), direction.view())?
            }
            WaveType::Ratio(_) => {
                return Err(SourceError::Unsupported(format!(
                    "wave type {} for the Aki-Richards model; amplitude ratios need the Vavryčuk model",
                    wave
                )))
            }
        };
        Ok(RadiationPattern {
            displacement,
            observations: cartesian.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radiation::energy::EnergyStats;
    use crate::radiation::projection::disp_component;
    use crate::radiation::wave::RatioKind;

    fn strike_slip() -> AkiRichards {
        AkiRichards::new(&Mechanism::Angles([0.0, 90.0, 0.0])).unwrap()
    }

    #[test]
    fn p_wave_is_point_antisymmetric() {
        let model = AkiRichards::new(&Mechanism::Angles([33.0, 61.0, -47.0])).unwrap();
        let grid = ObservationGrid::globe(1.0, 64);
        let flipped = ObservationGrid::from_cartesian(grid.cartesian().mapv(|v| -v)).unwrap();
        let a = model.radpat(WaveType::P, &grid).unwrap();
        let b = model.radpat(WaveType::P, &flipped).unwrap();
        for (u, v) in a.displacement.iter().zip(b.displacement.iter()) {
            assert!((u + v).abs() < 1e-12);
        }
        let radial = Some(Component::Radial);
        let ra = disp_component(grid.cartesian().view(), a.displacement.view(), radial).unwrap();
        let rb = disp_component(flipped.cartesian().view(), b.displacement.view(), radial).unwrap();
        for (u, v) in ra.amplitudes.iter().zip(rb.amplitudes.iter()) {
            assert!((u - v).abs() < 1e-9);
        }
    }

    #[test]
    fn strike_slip_p_lobes_sit_between_the_planes() {
        let model = strike_slip();
        let f = std::f64::consts::FRAC_1_SQRT_2;
        let grid = ObservationGrid::from_cartesian(array![[f, -f], [f, f], [0.0, 0.0]]).unwrap();
        let pattern = model.radpat(WaveType::P, &grid).unwrap();
        let radial = disp_component(
            grid.cartesian().view(),
            pattern.displacement.view(),
            Some(Component::Radial),
        )
        .unwrap();
        assert!((radial.amplitudes[0] - 1.0).abs() < 1e-9);
        assert!((radial.amplitudes[1] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn s_wave_is_transverse() {
        let model = AkiRichards::new(&Mechanism::Angles([10.0, 40.0, 80.0])).unwrap();
        let grid = ObservationGrid::globe(1.0, 50);
        let pattern = model.radpat(WaveType::S, &grid).unwrap();
        let dots = (&pattern.displacement * grid.cartesian()).sum_axis(Axis(0));
        assert!(dots.iter().all(|d| d.abs() < 1e-9));
    }

    #[test]
    fn s_sub_components_are_projections_of_s() {
        let model = AkiRichards::new(&Mechanism::Angles([120.0, 30.0, 45.0])).unwrap();
        let grid = ObservationGrid::globe(1.0, 40);
        let full = model.radpat(WaveType::S, &grid).unwrap();
        let sh = model.radpat(WaveType::Sh, &grid).unwrap();
        let sm = model.radpat(WaveType::Sm, &grid).unwrap();
        // parallel and meridian directions span the transverse plane
        let recombined = &sh.displacement + &sm.displacement;
        for (u, v) in recombined.iter().zip(full.displacement.iter()) {
            assert!((u - v).abs() < 1e-6);
        }
        assert!(model.radpat(WaveType::Sv, &grid).is_ok());
    }

    #[test]
    fn zero_direction_yields_zero_displacement() {
        let grid = ObservationGrid::from_cartesian(array![[0.0], [0.0], [0.0]]).unwrap();
        let pattern = strike_slip().radpat(WaveType::S, &grid).unwrap();
        assert!(pattern.displacement.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn ratios_are_rejected() {
        let err = strike_slip()
            .radpat(WaveType::Ratio(RatioKind::SOverP), ObservationGrid::default_sphere())
            .unwrap_err();
        assert!(matches!(err, SourceError::Unsupported(_)));
    }

    #[test]
    fn deviatoric_only_mechanism_cannot_be_modeled() {
        assert!(matches!(
            AkiRichards::new(&Mechanism::AnglesWithDeviatoric([0.0, 90.0, 0.0, 100.0])),
            Err(SourceError::Dimension(_))
        ));
    }

    #[test]
    fn energy_uses_the_default_sphere() {
        let stats = strike_slip().energy(WaveType::P).unwrap();
        let pattern = strike_slip()
            .radpat(WaveType::P, ObservationGrid::default_sphere())
            .unwrap();
        assert_eq!(stats, EnergyStats::from_displacement(pattern.displacement.view()));
        assert!(stats.norm > 0.0);
    }
}
