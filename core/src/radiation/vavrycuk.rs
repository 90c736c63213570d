//! Shear-tensile source radiation after Vavryčuk (2001) in the closed form
//! of Kwiatek & Ben-Zion (2013).

use crate::math::geometry::spherical_to_cartesian;
use crate::math::sphere::ObservationGrid;
use crate::prelude::{RadiationModel, RadiationPattern, SourceError, SourceResult};
use crate::radiation::wave::WaveType;
use crate::tensor::decomposition::{mt_angles, Decomposer, EigenDecomposer};
use crate::tensor::mechanism::Mechanism;
use ndarray::{s, Array2};

pub const DEFAULT_POISSON: f64 = 0.25;

/// Vavryčuk forward model of one mechanism.
#[derive(Debug, Clone)]
pub struct Vavrycuk {
    strike: f64,
    dip: f64,
    rake: f64,
    /// Tensile angle derived from the DC percentage.
    mode1: f64,
    poisson: f64,
}

impl Vavrycuk {
    pub fn new(mechanism: &Mechanism, poisson: f64) -> SourceResult<Self> {
        Self::with_decomposer(mechanism, poisson, &EigenDecomposer)
    }

    pub fn with_decomposer(
        mechanism: &Mechanism,
        poisson: f64,
        decomposer: &dyn Decomposer,
    ) -> SourceResult<Self> {
        let angles = mt_angles(mechanism, decomposer)?;
        let dc = angles.percentages[0];
        if !dc.is_finite() {
            return Err(SourceError::InvalidInput(format!(
                "{} mechanism has no double-couple percentage to derive a tensile angle from",
                mechanism.shape()
            )));
        }
        let [strike, dip, rake] = angles.angles;
        Ok(Self {
            strike: strike.to_radians(),
            dip: dip.to_radians(),
            rake: rake.to_radians(),
            mode1: ((100.0 - dc) / 100.0).clamp(-1.0, 1.0).asin(),
            poisson,
        })
    }

    /// Tensile angle in radians.
    pub fn tensile_angle(&self) -> f64 {
        self.mode1
    }

    fn coefficients(&self) -> [f64; 6] {
        let (ss, cs) = self.strike.sin_cos();
        let (sd, cd) = self.dip.sin_cos();
        let (sr, cr) = self.rake.sin_cos();
        let (sm, cm) = self.mode1.sin_cos();
        let s2s = (2.0 * self.strike).sin();
        let c2s = (2.0 * self.strike).cos();
        let s2d = (2.0 * self.dip).sin();
        let c2d = (2.0 * self.dip).cos();
        let k = 2.0 * self.poisson / (2.0 * self.poisson - 1.0);

        [
            cm * (c2d * cs * sr - cd * cr * ss) - s2d * cs * sm,
            cm * (c2d * sr * ss + cd * cr * cs) - s2d * sm * ss,
            cm * (c2s * cr * sd + s2d * s2s * sr / 2.0) - s2s * sd * sd * sm,
            cm * (s2s * cr * sd - s2d * cs * cs * sr) - sm * (k - 2.0 * cs * cs * sd * sd),
            cm * (s2d * sr * ss * ss + s2s * cr * sd) + sm * (k - 2.0 * sd * sd * ss * ss),
            sm * (2.0 * cd * cd - k) + s2d * cm * sr,
        ]
    }

    fn p(a: &[f64; 6], azimuth: f64, takeoff: f64) -> f64 {
        let (sa, ca) = azimuth.sin_cos();
        let (st, ct) = takeoff.sin_cos();
        ct * (ct * a[5] - ca * st * a[1] + sa * st * a[0])
            + sa * st * (ct * a[0] + ca * st * a[2] + sa * st * a[3])
            - ca * st * (ct * a[1] - sa * st * a[2] + ca * st * a[4])
    }

    fn sh(a: &[f64; 6], azimuth: f64, takeoff: f64) -> f64 {
        let (sa, ca) = azimuth.sin_cos();
        let (st, ct) = takeoff.sin_cos();
        ct * (ca * a[0] + sa * a[1]) - sa * st * (sa * a[2] - ca * a[3])
            + ca * st * (sa * a[4] + ca * a[2])
    }

    fn sv(a: &[f64; 6], azimuth: f64, takeoff: f64) -> f64 {
        let (sa, ca) = azimuth.sin_cos();
        let (st, ct) = takeoff.sin_cos();
        sa * st * (ca * ct * a[2] - st * a[0] + ct * sa * a[3])
            - ct * (st * a[5] + ca * ct * a[1] - ct * sa * a[0])
            + ca * st * (st * a[1] + ct * sa * a[2] - ca * ct * a[4])
    }

    /// Scalar amplitude of `wave` along the ray leaving at `azimuth`,
    /// `takeoff` (radians). Ratios are plain divisions and may be infinite.
    pub fn amplitude(&self, wave: WaveType, azimuth: f64, takeoff: f64) -> SourceResult<f64> {
        let a = self.coefficients();
        self.amplitude_with(&a, wave, azimuth, takeoff)
    }

    fn amplitude_with(
        &self,
        a: &[f64; 6],
        wave: WaveType,
        azimuth: f64,
        takeoff: f64,
    ) -> SourceResult<f64> {
        let value = match wave {
            WaveType::P => Self::p(a, azimuth, takeoff),
            WaveType::Sh => Self::sh(a, azimuth, takeoff),
            WaveType::Sv => Self::sv(a, azimuth, takeoff),
            WaveType::S => Self::sh(a, azimuth, takeoff).hypot(Self::sv(a, azimuth, takeoff)),
            WaveType::Ratio(kind) => {
                let (numerator, denominator) = kind.terms();
                self.amplitude_with(a, numerator, azimuth, takeoff)?
                    / self.amplitude_with(a, denominator, azimuth, takeoff)?
            }
            WaveType::Sm => {
                return Err(SourceError::Unsupported(format!(
                    "wave type {} for the Vavryčuk model; use P, S, Sh, Sv or a ratio",
                    wave
                )))
            }
        };
        Ok(value)
    }
}

impl RadiationModel for Vavrycuk {
    fn radpat(
        &self,
        wave: WaveType,
        observations: &ObservationGrid,
    ) -> SourceResult<RadiationPattern> {
        let a = self.coefficients();
        let count = observations.len();
        let mut scaled = Array2::zeros((3, count));
        for index in 0..count {
            let azimuth = observations.azimuths()[index];
            let takeoff = observations.polar_angles()[index];
            scaled[[0, index]] = azimuth;
            scaled[[1, index]] = takeoff;
            scaled[[2, index]] = self.amplitude_with(&a, wave, azimuth, takeoff)?;
        }
        let displacement = spherical_to_cartesian(scaled.view())?;
        let unit = spherical_to_cartesian(scaled.slice(s![0..2, ..]))?;
        Ok(RadiationPattern {
            displacement,
            observations: unit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radiation::wave::RatioKind;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn strike_slip() -> Vavrycuk {
        Vavrycuk::new(&Mechanism::Angles([0.0, 90.0, 0.0]), DEFAULT_POISSON).unwrap()
    }

    #[test]
    fn pure_double_couple_has_no_tensile_angle() {
        assert_eq!(strike_slip().tensile_angle(), 0.0);
    }

    #[test]
    fn vertical_strike_slip_p_follows_sin_two_azimuth() {
        let model = strike_slip();
        let peak = model.amplitude(WaveType::P, FRAC_PI_4, FRAC_PI_2).unwrap();
        assert!((peak - 1.0).abs() < 1e-12);
        for i in 0..12 {
            let azimuth = i as f64 * 0.5;
            let takeoff = 0.3 + i as f64 * 0.2;
            let p = model.amplitude(WaveType::P, azimuth, takeoff).unwrap();
            let expected = (2.0 * azimuth).sin() * takeoff.sin().powi(2);
            assert!((p - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn s_combines_sh_and_sv() {
        let model = Vavrycuk::new(&Mechanism::Angles([40.0, 60.0, 30.0]), 0.3).unwrap();
        let (azimuth, takeoff) = (1.1, 0.7);
        let sh = model.amplitude(WaveType::Sh, azimuth, takeoff).unwrap();
        let sv = model.amplitude(WaveType::Sv, azimuth, takeoff).unwrap();
        let s = model.amplitude(WaveType::S, azimuth, takeoff).unwrap();
        assert!((s * s - sh * sh - sv * sv).abs() < 1e-12);
        let ratio = model
            .amplitude(WaveType::Ratio(RatioKind::ShOverS), azimuth, takeoff)
            .unwrap();
        assert!((ratio - sh / s).abs() < 1e-12);
    }

    #[test]
    fn displacement_is_radial_with_signed_length() {
        let model = strike_slip();
        let grid = ObservationGrid::globe(1.0, 30);
        let pattern = model.radpat(WaveType::P, &grid).unwrap();
        for index in 0..grid.len() {
            let expected = model
                .amplitude(
                    WaveType::P,
                    grid.azimuths()[index],
                    grid.polar_angles()[index],
                )
                .unwrap();
            let column = pattern.displacement.column(index);
            let unit = pattern.observations.column(index);
            let along: f64 = column.iter().zip(unit.iter()).map(|(d, u)| d * u).sum();
            assert!((along - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn meridian_s_is_unsupported() {
        let err = strike_slip()
            .radpat(WaveType::Sm, &ObservationGrid::globe(1.0, 4))
            .unwrap_err();
        assert!(matches!(err, SourceError::Unsupported(_)));
    }

    #[test]
    fn deviatoric_only_input_has_no_tensile_angle() {
        let result = Vavrycuk::new(
            &Mechanism::AnglesWithDeviatoric([0.0, 90.0, 0.0, 80.0]),
            DEFAULT_POISSON,
        );
        assert!(matches!(result, Err(SourceError::InvalidInput(_))));
    }

    #[test]
    fn energy_is_finite_for_p() {
        let stats = strike_slip().energy(WaveType::P).unwrap();
        assert!(stats.norm.is_finite() && stats.norm > 0.0);
    }
}
