use anyhow::{bail, Context};
use focalcore::data::{ObservedData, Wavelet};
use focalcore::math::signal::template_wavelet;
use focalcore::math::sphere::ObservationGrid;
use focalcore::math::StatsHelper;
use focalcore::prelude::RadiationModel;
use focalcore::radiation::{disp_component, AkiRichards, Component, WaveType};
use focalcore::tensor::Mechanism;
use rand::{rngs::StdRng, Rng};
use std::f64::consts::PI;

/// Samples per synthetic wavelet.
pub const WAVELET_SAMPLES: usize = 20;

/// Upper bound on the globe densification used to honour a gap.
const MAX_GAP_POINTS: usize = 200_000;

/// First-motion P wavelets of a known mechanism at quasi-uniform stations.
#[derive(Debug, Clone)]
pub struct SyntheticWavelets {
    pub mechanism: Mechanism,
    /// Aperture (radians) of the station-free cone around the East axis.
    pub gap: f64,
    pub data: ObservedData,
}

impl SyntheticWavelets {
    /// `stations` wavelets on the upper hemisphere (or the full sphere), with
    /// the polarity of the Aki-Richards P amplitude of `mechanism`. A `gap`
    /// above π is read as degrees.
    pub fn generate(
        stations: usize,
        mechanism: Mechanism,
        full_sphere: bool,
        gap: f64,
    ) -> anyhow::Result<Self> {
        if stations == 0 {
            bail!("at least one station is required");
        }
        let (observations, gap) = station_directions(stations, full_sphere, gap)?;
        let model = AkiRichards::new(&mechanism).context("building the forward model")?;
        let pattern = model
            .radpat(WaveType::P, &observations)
            .context("computing P radiation")?;
        let polarities = disp_component(
            observations.cartesian().view(),
            pattern.displacement.view(),
            Some(Component::Radial),
        )
        .context("projecting P displacement")?
        .amplitudes;

        let wavelets = polarity_wavelets(&observations, &polarities.to_vec());

        Ok(Self {
            mechanism,
            gap,
            data: ObservedData::new(wavelets).with_mechanism(mechanism),
        })
    }

    /// Same as [`SyntheticWavelets::generate`] with a random double couple.
    pub fn random(
        stations: usize,
        full_sphere: bool,
        gap: f64,
        rng: &mut StdRng,
    ) -> anyhow::Result<Self> {
        Self::generate(stations, random_mechanism(rng), full_sphere, gap)
    }

    pub fn degrade(&mut self, shift: [f64; 2], snr: [f64; 2], rng: &mut StdRng) {
        super::degrade(&mut self.data.wavelets, shift, snr, rng);
    }
}

/// Uniform strike in [0, 360), dip in [-90, 90) and rake in [0, 180).
pub fn random_mechanism(rng: &mut StdRng) -> Mechanism {
    Mechanism::Angles([
        rng.gen_range(0.0..360.0),
        rng.gen_range(-90.0..90.0),
        rng.gen_range(0.0..180.0),
    ])
}

/// One template wavelet per direction, scaled by the sign of its amplitude.
/// Stations on a nodal plane record a flat trace.
fn polarity_wavelets(observations: &ObservationGrid, amplitudes: &[f64]) -> Vec<Wavelet> {
    let template = template_wavelet(WAVELET_SAMPLES);
    amplitudes
        .iter()
        .enumerate()
        .map(|(index, &amplitude)| {
            let sph = observations.spherical().column(index);
            let polarity = StatsHelper::sign(amplitude);
            Wavelet::new(
                index.to_string(),
                template.iter().map(|v| v * polarity).collect(),
                [sph[0], sph[1], sph[2]],
                WaveType::P,
                Component::Radial,
            )
        })
        .collect()
}

fn station_directions(
    stations: usize,
    full_sphere: bool,
    gap: f64,
) -> anyhow::Result<(ObservationGrid, f64)> {
    let sampled = if full_sphere { stations } else { stations * 2 };
    if gap <= 0.0 {
        let globe = ObservationGrid::globe(1.0, sampled);
        let indices: Vec<usize> = (0..stations).collect();
        return Ok((globe.select(&indices)?, 0.0));
    }

    let gap = if gap > PI { gap.to_radians() } else { gap };
    if gap >= 2.0 * PI {
        bail!("a {:.1} deg gap leaves no room for stations", gap.to_degrees());
    }
    let mut total = sampled;
    loop {
        let globe = ObservationGrid::globe(1.0, total);
        let candidates = if full_sphere { total } else { total / 2 };
        let cartesian = globe.cartesian();
        let kept: Vec<(usize, f64)> = (0..candidates)
            .map(|index| {
                let norm = cartesian.column(index).dot(&cartesian.column(index)).sqrt();
                (index, (cartesian[[0, index]] / norm).clamp(-1.0, 1.0).acos())
            })
            .filter(|(_, angle)| *angle > gap / 2.0)
            .collect();
        if kept.len() >= stations {
            let indices: Vec<usize> = kept.iter().take(stations).map(|(i, _)| *i).collect();
            let achieved = kept
                .iter()
                .take(stations)
                .fold(f64::INFINITY, |acc, (_, angle)| acc.min(*angle))
                * 2.0;
            return Ok((globe.select(&indices)?, achieved));
        }
        total += 1;
        if total > MAX_GAP_POINTS {
            bail!(
                "could not place {} stations outside a {:.1} deg gap",
                stations,
                gap.to_degrees()
            );
        }
    }
}
