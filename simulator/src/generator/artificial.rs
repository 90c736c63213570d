use anyhow::bail;
use focalcore::data::{ObservedData, Wavelet};
use focalcore::math::sphere::ObservationGrid;
use focalcore::radiation::{Component, WaveType};

const TEMPLATE: [f64; 5] = [0.0, 1.0, 0.0, -1.0, 0.0];

/// Five-sample wavelets on a globe, positive for the first half of the
/// stations and flipped for the rest. No mechanism produces them.
#[derive(Debug, Clone)]
pub struct ArtificialWavelets {
    pub data: ObservedData,
}

impl ArtificialWavelets {
    pub fn generate(stations: usize) -> anyhow::Result<Self> {
        if stations == 0 {
            bail!("at least one station is required");
        }
        let globe = ObservationGrid::globe(1.0, stations);
        let spherical = globe.spherical();
        let wavelets = (0..stations)
            .map(|index| {
                let sign = if index < stations / 2 { 1.0 } else { -1.0 };
                let sph = spherical.column(index);
                Wavelet::new(
                    format!("A{:03}", index),
                    TEMPLATE.iter().map(|v| v * sign).collect(),
                    [sph[0], sph[1], sph[2]],
                    WaveType::P,
                    Component::Radial,
                )
            })
            .collect();
        Ok(Self {
            data: ObservedData::new(wavelets),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_of_the_stations_are_flipped() {
        let artificial = ArtificialWavelets::generate(50).unwrap();
        let wavelets = &artificial.data.wavelets;
        assert_eq!(wavelets.len(), 50);
        assert!(wavelets[..25].iter().all(|w| w.samples[1] == 1.0));
        assert!(wavelets[25..].iter().all(|w| w.samples[1] == -1.0));
        assert!(artificial.data.mechanism.is_none());
    }

    #[test]
    fn directions_follow_the_globe() {
        let artificial = ArtificialWavelets::generate(10).unwrap();
        let globe = ObservationGrid::globe(1.0, 10);
        for (index, wavelet) in artificial.data.wavelets.iter().enumerate() {
            assert!((wavelet.polar - globe.spherical()[[1, index]]).abs() < 1e-12);
        }
    }
}
