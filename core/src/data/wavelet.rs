use crate::math::geometry::to_cartesian;
use crate::math::sphere::ObservationGrid;
use crate::prelude::{SourceError, SourceResult};
use crate::radiation::wave::{Component, WaveType};
use crate::tensor::mechanism::Mechanism;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

fn unit_radius() -> f64 {
    1.0
}

/// One observed first-arrival waveform and the ray it left the source on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wavelet {
    pub station: String,
    pub samples: Vec<f64>,
    /// Radians, `atan2(y, x)` in the East-North-Up frame.
    pub azimuth: f64,
    /// Takeoff angle from `+z`, radians.
    pub polar: f64,
    #[serde(default = "unit_radius")]
    pub radius: f64,
    pub wave: WaveType,
    pub component: Component,
}

impl Wavelet {
    pub fn new(
        station: impl Into<String>,
        samples: Vec<f64>,
        direction: [f64; 3],
        wave: WaveType,
        component: Component,
    ) -> Self {
        Self {
            station: station.into(),
            samples,
            azimuth: direction[0],
            polar: direction[1],
            radius: direction[2],
            wave,
            component,
        }
    }

    pub fn spherical(&self) -> [f64; 3] {
        [self.azimuth, self.polar, self.radius]
    }

    pub fn cartesian(&self) -> [f64; 3] {
        to_cartesian(self.spherical())
    }

    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    /// A wavelet can be stacked when it has a finite, non-zero peak.
    pub fn is_usable(&self) -> bool {
        !self.samples.is_empty()
            && self.samples.iter().all(|v| v.is_finite())
            && self.peak() > 0.0
            && self.spherical().iter().all(|v| v.is_finite())
    }
}

/// Observed data set handed to the scan, with an optional ground-truth
/// mechanism used only for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservedData {
    pub wavelets: Vec<Wavelet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<Mechanism>,
}

impl ObservedData {
    pub fn new(wavelets: Vec<Wavelet>) -> Self {
        Self {
            wavelets,
            mechanism: None,
        }
    }

    pub fn with_mechanism(mut self, mechanism: Mechanism) -> Self {
        self.mechanism = Some(mechanism);
        self
    }

    pub fn from_json(contents: &str) -> SourceResult<Self> {
        serde_json::from_str(contents)
            .map_err(|err| SourceError::InvalidInput(format!("observed data: {}", err)))
    }

    pub fn to_json(&self) -> SourceResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| SourceError::Internal(format!("serializing observed data: {}", err)))
    }

    pub fn len(&self) -> usize {
        self.wavelets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelets.is_empty()
    }

    /// Directions of every wavelet, in wavelet order.
    pub fn observations(&self) -> SourceResult<ObservationGrid> {
        let mut spherical = Array2::zeros((3, self.wavelets.len()));
        for (index, wavelet) in self.wavelets.iter().enumerate() {
            let sph = wavelet.spherical();
            for row in 0..3 {
                spherical[[row, index]] = sph[row];
            }
        }
        ObservationGrid::from_spherical(spherical)
    }
}
