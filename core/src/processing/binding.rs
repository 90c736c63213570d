//! Binding of observed wavelets to the mechanism grid.

use crate::data::wavelet::{ObservedData, Wavelet};
use crate::grid::MechanismGrid;
use crate::math::signal::{taper_window, template_wavelet};
use crate::math::sphere::ObservationGrid;
use crate::math::stats::StatsHelper;
use crate::prelude::{SourceError, SourceResult};
use crate::radiation::wave::{Component, WaveType};
use crate::telemetry::log::LogManager;
use ndarray::Array2;

/// One usable wavelet with everything scoring needs.
#[derive(Debug, Clone)]
pub struct BoundWavelet {
    pub station: String,
    pub wave: WaveType,
    pub component: Component,
    /// Position of the matching field in `MechanismGrid::fields`.
    pub field: usize,
    /// Nearest grid observation direction.
    pub index: usize,
    /// Samples scaled to unit peak.
    pub samples: Vec<f64>,
    pub taper: Vec<f64>,
}

/// Observed data prepared for a scan.
#[derive(Debug, Clone)]
pub struct DataBinding {
    pub wavelets: Vec<BoundWavelet>,
    /// Directions of the bound wavelets, in order.
    pub observations: ObservationGrid,
    /// Longest wavelet, the length of every stack.
    pub length: usize,
    /// Coherent stack with each wavelet in its energy-maximizing orientation.
    pub optimal_stack: Vec<f64>,
    pub optimal_power: f64,
    /// Template wavelet scaled by the wavelet count and tapered.
    pub synthetic_stack: Vec<f64>,
    pub synthetic_power: f64,
    /// Fraction of distinct grid directions hit in the first half of the grid.
    pub coverage: f64,
}

impl DataBinding {
    pub fn bind(
        data: &ObservedData,
        grid: &MechanismGrid,
        logger: &LogManager,
    ) -> SourceResult<Self> {
        let mut wavelets = Vec::with_capacity(data.len());
        let mut usable: Vec<&Wavelet> = Vec::with_capacity(data.len());
        for wavelet in &data.wavelets {
            let field = grid
                .fields()
                .iter()
                .position(|f| f.wave == wavelet.wave && f.component == wavelet.component)
                .ok_or_else(|| {
                    SourceError::Unsupported(format!(
                        "wavelet {} is {} {} but the grid only holds {}",
                        wavelet.station,
                        wavelet.wave,
                        wavelet.component,
                        grid.key().file_name()
                    ))
                })?;
            if !wavelet.is_usable() {
                logger.warn(&format!(
                    "dropping wavelet {}: no finite non-zero peak",
                    wavelet.station
                ));
                continue;
            }
            let index = grid
                .observations()
                .nearest_spherical(wavelet.spherical())
                .ok_or_else(|| SourceError::Internal("grid has no observation directions".into()))?;
            let peak = wavelet.peak();
            wavelets.push(BoundWavelet {
                station: wavelet.station.clone(),
                wave: wavelet.wave,
                component: wavelet.component,
                field,
                index,
                samples: wavelet.samples.iter().map(|v| v / peak).collect(),
                taper: taper_window(wavelet.samples.len()),
            });
            usable.push(wavelet);
        }
        if wavelets.is_empty() {
            return Err(SourceError::InvalidInput(format!(
                "none of the {} wavelets can be stacked",
                data.len()
            )));
        }

        let mut spherical = Array2::zeros((3, usable.len()));
        for (column, wavelet) in usable.iter().enumerate() {
            for (row, value) in wavelet.spherical().iter().enumerate() {
                spherical[[row, column]] = *value;
            }
        }
        let observations = ObservationGrid::from_spherical(spherical)?;

        let length = wavelets.iter().map(|w| w.samples.len()).max().unwrap_or(0);
        let optimal_stack = optimal_stack(&wavelets, length);
        let synthetic_stack = synthetic_stack(wavelets.len(), length);
        let coverage = coverage(&wavelets, grid.observations().len());

        Ok(Self {
            optimal_power: power(&optimal_stack),
            synthetic_power: power(&synthetic_stack),
            wavelets,
            observations,
            length,
            optimal_stack,
            synthetic_stack,
            coverage,
        })
    }

    pub fn len(&self) -> usize {
        self.wavelets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelets.is_empty()
    }
}

/// `Σ stack²`, NaN samples ignored.
pub fn power(stack: &[f64]) -> f64 {
    StatsHelper::nan_sum(&stack.iter().map(|v| v * v).collect::<Vec<_>>())
}

fn optimal_stack(wavelets: &[BoundWavelet], length: usize) -> Vec<f64> {
    let mut stack = vec![0.0; length];
    for wavelet in wavelets {
        let tapered: Vec<f64> = wavelet
            .samples
            .iter()
            .zip(wavelet.taper.iter())
            .map(|(v, t)| v * t)
            .collect();
        let head = &stack[..tapered.len()];
        let flipped: f64 = head.iter().zip(&tapered).map(|(s, t)| (s - t).powi(2)).sum();
        let kept: f64 = head.iter().zip(&tapered).map(|(s, t)| (s + t).powi(2)).sum();
        let orientation = if flipped > kept { -1.0 } else { 1.0 };
        for (slot, value) in stack.iter_mut().zip(&tapered) {
            *slot += orientation * value;
        }
    }
    stack
}

fn synthetic_stack(count: usize, length: usize) -> Vec<f64> {
    let taper = taper_window(length);
    template_wavelet(length)
        .iter()
        .zip(taper.iter())
        .map(|(v, t)| v * count as f64 * t)
        .collect()
}

fn coverage(wavelets: &[BoundWavelet], grid_size: usize) -> f64 {
    if grid_size == 0 {
        return 0.0;
    }
    let half = grid_size as f64 / 2.0;
    let mut hit: Vec<usize> = wavelets
        .iter()
        .map(|w| w.index)
        .filter(|&index| (index + 1) as f64 <= half)
        .collect();
    hit.sort_unstable();
    hit.dedup();
    (hit.len() as f64 / grid_size as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridKey;
    use crate::tensor::decomposition::EigenDecomposer;

    fn grid() -> MechanismGrid {
        let key = GridKey {
            waves: vec![WaveType::P],
            components: vec![vec![Component::Radial]],
            n_dims: 3,
            n_model: 100,
            n_obs: 50,
        };
        MechanismGrid::build(key, &EigenDecomposer).unwrap()
    }

    fn wavelet(samples: Vec<f64>, direction: [f64; 3]) -> Wavelet {
        Wavelet::new("ST", samples, direction, WaveType::P, Component::Radial)
    }

    #[test]
    fn wavelets_are_normalized_and_bound_to_nearest_direction() {
        let grid = grid();
        let target = grid.observations().spherical().column(7).to_vec();
        let data = ObservedData::new(vec![wavelet(
            vec![0.0, 2.0, -4.0],
            [target[0], target[1], target[2]],
        )]);
        let binding = DataBinding::bind(&data, &grid, &LogManager::new()).unwrap();
        assert_eq!(binding.wavelets[0].index, 7);
        assert_eq!(binding.wavelets[0].samples, vec![0.0, 0.5, -1.0]);
        assert_eq!(binding.length, 3);
    }

    #[test]
    fn optimal_stack_adds_each_wavelet_coherently() {
        let grid = grid();
        let template = template_wavelet(20);
        let flipped: Vec<f64> = template.iter().map(|v| -v).collect();
        let data = ObservedData::new(vec![
            wavelet(template.clone(), [0.1, 1.0, 1.0]),
            wavelet(flipped, [2.0, 2.0, 1.0]),
        ]);
        let binding = DataBinding::bind(&data, &grid, &LogManager::new()).unwrap();
        let taper = taper_window(20);
        for k in 0..20 {
            assert!((binding.optimal_stack[k] - 2.0 * template[k] * taper[k]).abs() < 1e-12);
        }
        assert!((binding.optimal_power - binding.synthetic_power).abs() < 1e-9);
    }

    #[test]
    fn shorter_wavelets_are_zero_padded() {
        let grid = grid();
        let data = ObservedData::new(vec![
            wavelet(template_wavelet(20), [0.1, 1.0, 1.0]),
            wavelet(template_wavelet(10), [0.2, 1.0, 1.0]),
        ]);
        let binding = DataBinding::bind(&data, &grid, &LogManager::new()).unwrap();
        assert_eq!(binding.optimal_stack.len(), 20);
        assert_eq!(binding.synthetic_stack.len(), 20);
    }

    #[test]
    fn unusable_wavelets_are_dropped() {
        let grid = grid();
        let data = ObservedData::new(vec![
            wavelet(vec![0.0, 0.0], [0.1, 1.0, 1.0]),
            wavelet(vec![1.0, -1.0], [0.2, 1.0, 1.0]),
        ]);
        let binding = DataBinding::bind(&data, &grid, &LogManager::new()).unwrap();
        assert_eq!(binding.len(), 1);
        assert_eq!(binding.observations.len(), 1);
    }

    #[test]
    fn no_usable_wavelet_is_invalid_input() {
        let grid = grid();
        let data = ObservedData::new(vec![wavelet(vec![0.0; 5], [0.1, 1.0, 1.0])]);
        assert!(matches!(
            DataBinding::bind(&data, &grid, &LogManager::new()),
            Err(SourceError::InvalidInput(_))
        ));
        assert!(matches!(
            DataBinding::bind(&ObservedData::default(), &grid, &LogManager::new()),
            Err(SourceError::InvalidInput(_))
        ));
    }

    #[test]
    fn wave_outside_the_grid_is_unsupported() {
        let grid = grid();
        let data = ObservedData::new(vec![Wavelet::new(
            "ST",
            vec![1.0],
            [0.0, 1.0, 1.0],
            WaveType::S,
            Component::Horizontal,
        )]);
        assert!(matches!(
            DataBinding::bind(&data, &grid, &LogManager::new()),
            Err(SourceError::Unsupported(_))
        ));
    }

    #[test]
    fn coverage_counts_distinct_directions_in_first_half() {
        let grid = grid();
        let sph = grid.observations().spherical();
        let direction = |i: usize| [sph[[0, i]], sph[[1, i]], sph[[2, i]]];
        let data = ObservedData::new(vec![
            wavelet(vec![1.0], direction(3)),
            wavelet(vec![1.0], direction(3)),
            wavelet(vec![1.0], direction(10)),
            wavelet(vec![1.0], direction(40)),
        ]);
        let binding = DataBinding::bind(&data, &grid, &LogManager::new()).unwrap();
        assert!((binding.coverage - 2.0 / 50.0).abs() < 1e-12);
    }
}
