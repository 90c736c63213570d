use crate::generator::{ArtificialWavelets, SyntheticWavelets};
use crate::workflow::config::{DataSource, WorkflowConfig};
use anyhow::{bail, Context};
use focalcore::data::ObservedData;
use focalcore::processing::{BestSolution, Centroid, PtPdf, SourceScan};
use focalcore::telemetry::MetricsSnapshot;
use focalcore::tensor::{axis_distance, fault_plane_difference, EigenDecomposer, Mechanism};
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::fs;

/// Angular distances (degrees) between an estimate and the true mechanism.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MechanismError {
    pub fault_plane: f64,
    pub axes: f64,
}

impl MechanismError {
    pub fn between(estimate: &Mechanism, truth: &Mechanism) -> anyhow::Result<Self> {
        Ok(Self {
            fault_plane: fault_plane_difference(estimate, truth, &EigenDecomposer)
                .context("comparing fault planes")?,
            axes: axis_distance(estimate, truth, &EigenDecomposer)
                .context("comparing P/T axes")?,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct WorkflowResult {
    pub stations: usize,
    pub precision: f64,
    pub best: BestSolution,
    pub centroid: Centroid,
    pub coverage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truth: Option<Mechanism>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_error: Option<MechanismError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid_error: Option<MechanismError>,
    pub metrics: MetricsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pt_pdf: Option<PtPdf>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Loads or builds the mechanism grid of the configured scan.
    pub fn prepare(&self) -> anyhow::Result<SourceScan> {
        SourceScan::new(self.config.scan.clone()).context("preparing the mechanism grid")
    }

    /// Observed data of the configured source, degraded when requested.
    pub fn observed_data(&self, rng: &mut StdRng) -> anyhow::Result<ObservedData> {
        let data = &self.config.data;
        let mut observed = match data.source {
            DataSource::Synthetic => {
                let synthetic = match data.mechanism {
                    Some(mechanism) => SyntheticWavelets::generate(
                        data.stations,
                        mechanism,
                        data.full_sphere,
                        data.gap,
                    )?,
                    None => {
                        SyntheticWavelets::random(data.stations, data.full_sphere, data.gap, rng)?
                    }
                };
                info!(
                    "{} synthetic stations, {:.1} deg gap",
                    synthetic.data.len(),
                    synthetic.gap.to_degrees()
                );
                synthetic.data
            }
            DataSource::Artificial => ArtificialWavelets::generate(data.stations)?.data,
            DataSource::File => {
                let Some(path) = data.path.as_ref() else {
                    bail!("the file data source needs a path");
                };
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("reading observed data {}", path.display()))?;
                ObservedData::from_json(&contents)
                    .with_context(|| format!("parsing observed data {}", path.display()))?
            }
        };
        if let Some(degrade) = data.degrade {
            crate::generator::degrade(&mut observed.wavelets, degrade.shift, degrade.snr, rng);
        }
        Ok(observed)
    }

    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let mut rng = StdRng::seed_from_u64(self.config.data.seed);
        let mut scan = self.prepare()?;
        let data = self.observed_data(&mut rng)?;
        let mut result = scan_data(&mut scan, &data)?;
        if self.config.pt_pdf {
            result.pt_pdf = Some(scan.pt_pdf().context("building the P/T axis surfaces")?);
        }
        Ok(result)
    }
}

/// Scans `data` with an already prepared grid and compares both solutions
/// with the data's mechanism when it has one.
pub fn scan_data(scan: &mut SourceScan, data: &ObservedData) -> anyhow::Result<WorkflowResult> {
    let scanned = scan
        .scan(data)
        .with_context(|| format!("scanning {} wavelets", data.len()))?;
    let best = scanned.best;
    let centroid = scanned.centroid;
    let coverage = scanned.coverage;

    let (best_error, centroid_error) = match data.mechanism.as_ref() {
        Some(truth) => {
            let best_error = MechanismError::between(&Mechanism::Angles(best.mechanism), truth)
                .context("scoring the best solution")?;
            let centroid_error =
                match MechanismError::between(&Mechanism::SixComponent(centroid.tensor), truth) {
                    Ok(error) => Some(error),
                    Err(err) => {
                        warn!("centroid left unscored: {:#}", err);
                        None
                    }
                };
            (Some(best_error), centroid_error)
        }
        None => (None, None),
    };

    Ok(WorkflowResult {
        stations: data.len(),
        precision: scan.grid().precision(),
        best,
        centroid,
        coverage,
        truth: data.mechanism,
        best_error,
        centroid_error,
        metrics: scan.metrics(),
        pt_pdf: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::{DataConfig, DegradeConfig};
    use focalcore::prelude::ScanConfig;
    use focalcore::radiation::{Component, WaveType};
    use std::path::Path;

    fn scan_config(root: &Path, n_model: usize, n_obs: usize) -> ScanConfig {
        ScanConfig {
            waves: vec![WaveType::P],
            components: vec![vec![Component::Radial]],
            n_model,
            n_obs,
            grid_root: root.to_path_buf(),
            ..ScanConfig::default()
        }
    }

    #[test]
    fn runner_executes_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = WorkflowConfig {
            scan: scan_config(dir.path(), 400, 300),
            data: DataConfig {
                stations: 40,
                seed: 9,
                ..DataConfig::default()
            },
            pt_pdf: true,
            ..WorkflowConfig::default()
        };
        let result = Runner::new(cfg).execute().unwrap();
        assert_eq!(result.stations, 40);
        assert!(result.truth.is_some());
        assert!(result.best_error.is_some());
        assert!(result.best.probability.is_finite());
        assert_eq!(result.metrics.scans, 1);
        assert_eq!(result.pt_pdf.map(|pdf| pdf.shape()), Some((50, 100)));
    }

    #[test]
    fn artificial_data_has_no_truth() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = WorkflowConfig {
            scan: scan_config(dir.path(), 400, 300),
            data: DataConfig {
                source: DataSource::Artificial,
                stations: 30,
                ..DataConfig::default()
            },
            ..WorkflowConfig::default()
        };
        let result = Runner::new(cfg).execute().unwrap();
        assert!(result.truth.is_none());
        assert!(result.best_error.is_none());
        assert!(result.pt_pdf.is_none());
    }

    #[test]
    fn file_source_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let synthetic =
            SyntheticWavelets::generate(20, Mechanism::Angles([40.0, 60.0, 90.0]), true, 0.0)
                .unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, synthetic.data.to_json().unwrap()).unwrap();
        let runner = Runner::new(WorkflowConfig {
            data: DataConfig {
                source: DataSource::File,
                path: Some(path),
                ..DataConfig::default()
            },
            ..WorkflowConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(runner.observed_data(&mut rng).unwrap(), synthetic.data);
    }

    #[test]
    fn file_source_without_path_fails() {
        let runner = Runner::new(WorkflowConfig {
            data: DataConfig {
                source: DataSource::File,
                ..DataConfig::default()
            },
            ..WorkflowConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(0);
        assert!(runner.observed_data(&mut rng).is_err());
    }

    #[test]
    fn synthetic_mechanism_is_recovered() {
        let dir = tempfile::tempdir().unwrap();
        let truth = Mechanism::Angles([82.0, 5.0, 10.0]);
        let cfg = WorkflowConfig {
            scan: scan_config(dir.path(), 1500, 1000),
            data: DataConfig {
                stations: 80,
                full_sphere: true,
                mechanism: Some(truth),
                ..DataConfig::default()
            },
            ..WorkflowConfig::default()
        };
        let result = Runner::new(cfg).execute().unwrap();
        let error = result.best_error.unwrap();
        assert!(
            error.axes < 2.0 * result.precision,
            "axis error {:.1} deg at {:.1} deg resolution",
            error.axes,
            result.precision
        );
    }

    #[test]
    fn noisier_data_lowers_confidence() {
        const SEEDS: u64 = 8;
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(WorkflowConfig {
            scan: scan_config(dir.path(), 400, 300),
            ..WorkflowConfig::default()
        });
        let mut scan = runner.prepare().unwrap();
        let mechanism = Mechanism::Angles([120.0, 50.0, -30.0]);
        let means: Vec<f64> = [20.0, 5.0, 1.0, 0.5, 0.1]
            .iter()
            .map(|&snr| {
                let mut total = 0.0;
                for seed in 0..SEEDS {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let mut synthetic =
                        SyntheticWavelets::generate(40, mechanism, false, 0.0).unwrap();
                    synthetic.degrade([0.0, 0.0], [snr, snr], &mut rng);
                    total += scan_data(&mut scan, &synthetic.data).unwrap().best.probability;
                }
                total / SEEDS as f64
            })
            .collect();
        for pair in means.windows(2) {
            assert!(pair[1] <= pair[0] + 0.01, "confidence rose with noise: {:?}", means);
        }
        assert!(means[0] > means[means.len() - 1], "{:?}", means);
    }

    #[test]
    fn degradation_is_applied_from_config() {
        let runner = Runner::new(WorkflowConfig {
            data: DataConfig {
                stations: 10,
                mechanism: Some(Mechanism::Angles([0.0, 45.0, 90.0])),
                degrade: Some(DegradeConfig {
                    shift: [0.1, 0.1],
                    snr: [0.0, 0.0],
                }),
                ..DataConfig::default()
            },
            ..WorkflowConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(0);
        let data = runner.observed_data(&mut rng).unwrap();
        // a 10% shift of 20 samples moves the quarter-period peak to sample 7
        assert!(data
            .wavelets
            .iter()
            .all(|w| w.samples[..2] == [0.0, 0.0] && w.samples[7].abs() == 1.0));
    }
}
