//! Robustness sweeps: how station count, azimuthal gap, noise, time shifts and
//! non double-couple components affect the recovered solution.

use crate::generator::SyntheticWavelets;
use crate::workflow::config::{BenchmarkConfig, Solution};
use crate::workflow::runner::scan_data;
use anyhow::bail;
use focalcore::data::ObservedData;
use focalcore::processing::SourceScan;
use focalcore::radiation::SimpleModel;
use focalcore::tensor::{fault_plane_difference, EigenDecomposer, Mechanism};
use log::{info, warn};
use rand::{rngs::StdRng, Rng};
use serde::Serialize;

const MIN_STATIONS: f64 = 2.0;
const MAX_STATIONS: f64 = 175.0;
const SNR_RANGE: [f64; 2] = [0.1, 10.0];
const SHIFT_RANGE: [f64; 2] = [0.0, 0.5];
const NON_DC_RANGE: [f64; 2] = [0.01, 0.99];
/// SNR of the time-shift sweep.
const SHIFT_SWEEP_SNR: f64 = 10.0;

/// Mean outcome of the bootstrap scans at one sweep value. Failed scans and
/// undefined errors count as zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenchmarkRow {
    pub test: String,
    pub label: String,
    pub value: f64,
    pub mean_probability: f64,
    /// Mean fault-plane difference to the true mechanism, degrees.
    pub mean_error: f64,
}

pub struct Benchmark<'a> {
    scan: &'a mut SourceScan,
    config: BenchmarkConfig,
    rng: StdRng,
}

impl<'a> Benchmark<'a> {
    pub fn new(scan: &'a mut SourceScan, config: BenchmarkConfig, rng: StdRng) -> Self {
        Self { scan, config, rng }
    }

    pub fn run(&mut self) -> anyhow::Result<Vec<BenchmarkRow>> {
        if self.config.steps == 0 || self.config.bootstrap == 0 {
            bail!("the benchmark needs at least one step and one bootstrap scan");
        }
        let steps = self.config.steps;
        let station_range = linspace(MIN_STATIONS, MAX_STATIONS, steps);
        let mut rows = Vec::new();

        rows.extend(self.sweep("coverage", "N, G0", &station_range, |n, rng| {
            Ok(SyntheticWavelets::random(n as usize, false, 0.0, rng)?.data)
        })?);

        let tests = self.config.station_tests.clone();
        let largest = tests.iter().copied().max().unwrap_or(0);
        for &stations in &tests {
            if stations < largest {
                let label = format!("G, N{}", stations);
                rows.extend(self.sweep("gap", &label, &station_range, |gap, rng| {
                    Ok(SyntheticWavelets::random(stations, false, gap.to_radians(), rng)?.data)
                })?);
            }

            let label = format!("N{}", stations);
            let snr_range = linspace(SNR_RANGE[0], SNR_RANGE[1], steps);
            rows.extend(self.sweep("snr", &label, &snr_range, |snr, rng| {
                let mut synthetic = SyntheticWavelets::random(stations, false, 0.0, rng)?;
                synthetic.degrade([0.0, 0.0], [snr, snr], rng);
                Ok(synthetic.data)
            })?);

            let shift_range = linspace(SHIFT_RANGE[0], SHIFT_RANGE[1], steps);
            rows.extend(self.sweep("shift", &label, &shift_range, |shift, rng| {
                let mut synthetic = SyntheticWavelets::random(stations, false, 0.0, rng)?;
                synthetic.degrade([-shift, shift], [SHIFT_SWEEP_SNR, SHIFT_SWEEP_SNR], rng);
                Ok(synthetic.data)
            })?);
        }

        let non_dc_range = linspace(NON_DC_RANGE[0], NON_DC_RANGE[1], steps);
        let stations = self.config.non_dc_stations;
        for model in [SimpleModel::LinearVector, SimpleModel::Isotropic, SimpleModel::Clvd] {
            rows.extend(self.sweep("non_dc", model.name(), &non_dc_range, |share, rng| {
                let mechanism = Mechanism::SixComponent(mixed_tensor(model, share, rng));
                Ok(SyntheticWavelets::generate(stations, mechanism, false, 0.0)?.data)
            })?);
        }
        Ok(rows)
    }

    fn sweep<F>(
        &mut self,
        test: &str,
        label: &str,
        values: &[f64],
        mut make: F,
    ) -> anyhow::Result<Vec<BenchmarkRow>>
    where
        F: FnMut(f64, &mut StdRng) -> anyhow::Result<ObservedData>,
    {
        let mut rows = Vec::with_capacity(values.len());
        for &value in values {
            let mut probability = 0.0;
            let mut error = 0.0;
            for _ in 0..self.config.bootstrap {
                let data = make(value, &mut self.rng)?;
                let (p, e) = self.trial(&data);
                probability += zero_nan(p);
                error += zero_nan(e);
            }
            let count = self.config.bootstrap as f64;
            let row = BenchmarkRow {
                test: test.to_string(),
                label: label.to_string(),
                value,
                mean_probability: probability / count,
                mean_error: error / count,
            };
            info!(
                "{} [{}] at {:.3}: P(Mt|d) {:.4}, error {:.2} deg",
                row.test, row.label, row.value, row.mean_probability, row.mean_error
            );
            rows.push(row);
        }
        Ok(rows)
    }

    /// Probability and fault-plane error of the configured solution.
    fn trial(&mut self, data: &ObservedData) -> (f64, f64) {
        let result = match scan_data(&mut *self.scan, data) {
            Ok(result) => result,
            Err(err) => {
                warn!("bootstrap scan failed: {:#}", err);
                return (f64::NAN, f64::NAN);
            }
        };
        let (estimate, probability) = match self.config.solution {
            Solution::Best => (Mechanism::Angles(result.best.mechanism), result.best.probability),
            Solution::Centroid => (
                Mechanism::SixComponent(result.centroid.tensor),
                result.centroid.probability,
            ),
        };
        let error = data
            .mechanism
            .as_ref()
            .and_then(|truth| fault_plane_difference(&estimate, truth, &EigenDecomposer).ok())
            .unwrap_or(f64::NAN);
        (probability, error)
    }
}

/// `share` of the diagonal of `model` and `1 - share` of the double couple's
/// off-diagonal terms, each rotated by a random whole number of slots.
pub fn mixed_tensor(model: SimpleModel, share: f64, rng: &mut StdRng) -> [f64; 6] {
    let diagonal = model.tensor();
    let couple = SimpleModel::DoubleCouple.tensor();
    let first = roll(
        [diagonal[0] * share, diagonal[1] * share, diagonal[2] * share],
        rng.gen_range(0.0f64..2.0).round() as usize,
    );
    let second = roll(
        [
            couple[3] * (1.0 - share),
            couple[4] * (1.0 - share),
            couple[5] * (1.0 - share),
        ],
        rng.gen_range(0.0f64..2.0).round() as usize,
    );
    [first[0], first[1], first[2], second[0], second[1], second[2]]
}

fn roll(values: [f64; 3], by: usize) -> [f64; 3] {
    let mut rolled = [0.0; 3];
    for (index, value) in values.iter().enumerate() {
        rolled[(index + by) % 3] = *value;
    }
    rolled
}

fn zero_nan(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![start; count];
    }
    let step = (stop - start) / (count - 1) as f64;
    (0..count).map(|k| start + k as f64 * step).collect()
}
