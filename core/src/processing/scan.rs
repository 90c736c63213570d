//! Grid-search source inversion.

use crate::data::wavelet::ObservedData;
use crate::grid::cache;
use crate::grid::{GridKey, MechanismGrid};
use crate::math::stats::StatsHelper;
use crate::prelude::{ScanConfig, SourceError, SourceResult};
use crate::processing::binding::DataBinding;
use crate::processing::correction::{correct, CorrectedData};
use crate::processing::pdf::PtPdf;
use crate::processing::scoring::{
    centroid_tensor, evidence, score_mechanisms, BestSolution, Centroid, ScanResult,
};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{MetricsSnapshot, ScanMetrics};
use crate::tensor::decomposition::{Decomposer, EigenDecomposer};
use crate::tensor::mechanism::Mechanism;

/// Matches observed polarities against every mechanism of a cached grid.
pub struct SourceScan {
    config: ScanConfig,
    grid: MechanismGrid,
    binding: Option<DataBinding>,
    result: Option<ScanResult>,
    logger: LogManager,
    metrics: ScanMetrics,
}

impl SourceScan {
    pub fn new(config: ScanConfig) -> SourceResult<Self> {
        Self::with_decomposer(config, &EigenDecomposer)
    }

    /// Loads the grid for `config` from the cache, or builds and stores it.
    pub fn with_decomposer(
        config: ScanConfig,
        decomposer: &dyn Decomposer,
    ) -> SourceResult<Self> {
        config.validate()?;
        let logger = LogManager::new();
        let metrics = ScanMetrics::new();
        let key = GridKey::from_config(&config);
        let path = cache::cache_path(&config.resolved_grid_root(), &key);

        let cached = if config.reset {
            logger.record(&format!("reset requested, rebuilding {}", path.display()));
            None
        } else if path.exists() {
            match cache::load(&path, &key) {
                Ok(grid) => {
                    metrics.record_cache_hit();
                    logger.record(&format!("loaded mechanism grid from {}", path.display()));
                    Some(grid)
                }
                Err(err) => {
                    metrics.record_cache_rebuild();
                    logger.warn(&format!("{}; rebuilding the mechanism grid", err));
                    None
                }
            }
        } else {
            None
        };

        let grid = match cached {
            Some(grid) => grid,
            None => {
                let grid = MechanismGrid::build(key, decomposer)?;
                metrics.record_grid_built();
                logger.record(&format!(
                    "built {} mechanisms every {:.2} deg on {} directions",
                    grid.len(),
                    grid.precision(),
                    grid.observations().len()
                ));
                if let Err(err) = cache::save(&grid, &path) {
                    logger.warn(&format!("{}; continuing without a cache", err));
                }
                grid
            }
        };

        Ok(Self {
            config,
            grid,
            binding: None,
            result: None,
            logger,
            metrics,
        })
    }

    /// Scores every grid mechanism against `data`. Replaces any previous
    /// result.
    pub fn scan(&mut self, data: &ObservedData) -> SourceResult<&ScanResult> {
        let binding = DataBinding::bind(data, &self.grid, &self.logger)?;
        let scores = score_mechanisms(&self.grid, &binding)?;
        let rms: Vec<f64> = scores.iter().map(|s| s.rms).collect();
        let xcorr: Vec<f64> = scores.iter().map(|s| s.xcorr).collect();
        let misfit = StatsHelper::nan_sum(&scores.iter().map(|s| s.misfit).collect::<Vec<_>>());

        let likelihood: Vec<f64> = rms.iter().map(|r| r / binding.synthetic_power).collect();
        let prior = self.grid.prior();
        let evidence = evidence(&rms, &likelihood, prior);
        if !evidence.is_finite() || evidence == 0.0 {
            return Err(SourceError::InvalidInput(format!(
                "{} wavelets leave P(d) at {}; no mechanism can be ranked",
                binding.len(),
                evidence
            )));
        }
        let posterior: Vec<f64> = likelihood.iter().map(|l| l * prior / evidence).collect();

        let index = StatsHelper::nan_argmax(&posterior).ok_or_else(|| {
            SourceError::Internal("every posterior probability is NaN".to_string())
        })?;
        let best = BestSolution {
            index,
            mechanism: self.grid.mechanisms()[index],
            tensor: self.grid.tensors()[index],
            probability: posterior[index],
        };

        let centroid =
            centroid_tensor(&posterior, self.grid.tensors(), self.config.centroid_factor);
        let corrected = correct(&binding, &Mechanism::SixComponent(centroid), prior, evidence)?;

        self.metrics.record_scan(self.grid.len());
        self.logger.record(&format!(
            "scanned {} wavelets: best {:?} at P(Mt|d) {:.4}, centroid P(Mt|d) {:.4}",
            binding.len(),
            best.mechanism,
            best.probability,
            corrected.posterior
        ));

        let result = ScanResult {
            rms,
            xcorr,
            likelihood,
            prior,
            evidence,
            posterior,
            best,
            centroid: Centroid {
                tensor: centroid,
                probability: corrected.posterior,
            },
            coverage: binding.coverage,
            misfit,
        };
        self.binding = Some(binding);
        let stored = self.result.insert(result);
        Ok(&*stored)
    }

    /// Result of the latest scan.
    pub fn result(&self) -> Option<&ScanResult> {
        self.result.as_ref()
    }

    pub fn is_scanned(&self) -> bool {
        self.result.is_some()
    }

    /// P- and T-axis probability surfaces of the latest scan.
    pub fn pt_pdf(&self) -> SourceResult<PtPdf> {
        let result = self.scanned()?;
        PtPdf::build(self.grid.p_axes(), self.grid.t_axes(), &result.posterior)
    }

    /// Polarity-corrected data and probabilities of any mechanism, against the
    /// data of the latest scan.
    pub fn corrected_data(&self, mechanism: &Mechanism) -> SourceResult<CorrectedData> {
        let result = self.scanned()?;
        let binding = self
            .binding
            .as_ref()
            .ok_or_else(|| SourceError::Internal("scan result without bound data".into()))?;
        correct(binding, mechanism, result.prior, result.evidence)
    }

    /// Bound data of the latest scan.
    pub fn binding(&self) -> Option<&DataBinding> {
        self.binding.as_ref()
    }

    pub fn grid(&self) -> &MechanismGrid {
        &self.grid
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn scanned(&self) -> SourceResult<&ScanResult> {
        self.result
            .as_ref()
            .ok_or_else(|| SourceError::InvalidInput("no scan has been run yet".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::wavelet::Wavelet;
    use crate::math::signal::template_wavelet;
    use crate::prelude::RadiationModel;
    use crate::radiation::aki_richards::AkiRichards;
    use crate::radiation::wave::{Component, WaveType};
    use crate::tensor::mechanism::double_couple;
    use std::path::Path;

    fn config(root: &Path) -> ScanConfig {
        ScanConfig {
            waves: vec![WaveType::P],
            components: vec![vec![Component::Radial]],
            n_model: 400,
            n_obs: 300,
            grid_root: root.to_path_buf(),
            ..Default::default()
        }
    }

    /// P polarities of `tensor` on grid directions, as 20-sample wavelets.
    fn synthetic(scan: &SourceScan, tensor: [f64; 6], stride: usize) -> ObservedData {
        let observations = scan.grid().observations();
        let pattern = AkiRichards::from_tensor(tensor)
            .radpat(WaveType::P, observations)
            .unwrap();
        let template = template_wavelet(20);
        let wavelets = (0..observations.len())
            .step_by(stride)
            .map(|i| {
                let gamma = observations.cartesian().column(i);
                let polarity = pattern.displacement.column(i).dot(&gamma).signum();
                let sph = observations.spherical().column(i);
                Wavelet::new(
                    format!("S{:03}", i),
                    template.iter().map(|v| v * polarity).collect(),
                    [sph[0], sph[1], sph[2]],
                    WaveType::P,
                    Component::Radial,
                )
            })
            .collect();
        ObservedData::new(wavelets)
    }

    #[test]
    fn second_construction_hits_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let first = SourceScan::new(config(dir.path())).unwrap();
        assert_eq!(first.metrics().grids_built, 1);
        let second = SourceScan::new(config(dir.path())).unwrap();
        let metrics = second.metrics();
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.grids_built, 0);
        assert_eq!(first.grid(), second.grid());
    }

    #[test]
    fn reset_ignores_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        SourceScan::new(config(dir.path())).unwrap();
        let reset = SourceScan::new(ScanConfig {
            reset: true,
            ..config(dir.path())
        })
        .unwrap();
        assert_eq!(reset.metrics().grids_built, 1);
        assert_eq!(reset.metrics().cache_hits, 0);
    }

    #[test]
    fn corrupt_cache_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let key = GridKey::from_config(&config(dir.path()));
        std::fs::write(cache::cache_path(dir.path(), &key), b"garbage").unwrap();
        let scan = SourceScan::new(config(dir.path())).unwrap();
        let metrics = scan.metrics();
        assert_eq!(metrics.cache_rebuilds, 1);
        assert_eq!(metrics.grids_built, 1);
        assert!(cache::load(&cache::cache_path(dir.path(), &key), &key).is_ok());
    }

    #[test]
    fn higher_dimensional_scan_is_not_implemented() {
        let dir = tempfile::tempdir().unwrap();
        let result = SourceScan::new(ScanConfig {
            n_dims: 4,
            ..config(dir.path())
        });
        assert!(matches!(result, Err(SourceError::NotImplemented(_))));
    }

    #[test]
    fn empty_data_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let mut scan = SourceScan::new(config(dir.path())).unwrap();
        assert!(matches!(
            scan.scan(&ObservedData::default()),
            Err(SourceError::InvalidInput(_))
        ));
        assert!(!scan.is_scanned());
    }

    #[test]
    fn products_need_a_scan_first() {
        let dir = tempfile::tempdir().unwrap();
        let scan = SourceScan::new(config(dir.path())).unwrap();
        assert!(scan.pt_pdf().is_err());
        assert!(scan
            .corrected_data(&Mechanism::Angles([0.0, 45.0, 90.0]))
            .is_err());
    }

    #[test]
    fn grid_mechanism_data_is_recovered() {
        let dir = tempfile::tempdir().unwrap();
        let mut scan = SourceScan::new(config(dir.path())).unwrap();
        let truth = scan.grid().len() / 2 + 7;
        let tensor = scan.grid().tensors()[truth];
        let data = synthetic(&scan, tensor, 3);
        let result = scan.scan(&data).unwrap().clone();

        assert_eq!(result.posterior.len(), scan.grid().len());
        assert!(result.xcorr.iter().all(|v| v.is_nan() || v.abs() <= 1.0));
        let best = result.posterior[result.best.index];
        assert!(result.posterior.iter().all(|p| p.is_nan() || *p <= best));
        // the true cell stacks every wavelet coherently, so it ties the best
        assert!((result.rms[truth] - result.rms[result.best.index]).abs() < 1e-9);
        let corrected = scan
            .corrected_data(&Mechanism::SixComponent(tensor))
            .unwrap();
        assert!(corrected.polarities.iter().all(|p| *p != 0.0));
        assert!((corrected.rms - result.rms[truth]).abs() < 1e-9);
        assert_eq!(scan.metrics().scans, 1);
    }

    #[test]
    fn centroid_is_never_nan() {
        let dir = tempfile::tempdir().unwrap();
        let mut scan = SourceScan::new(config(dir.path())).unwrap();
        let data = synthetic(&scan, double_couple(30.0, 60.0, 90.0), 5);
        let result = scan.scan(&data).unwrap();
        assert!(result.centroid.tensor.iter().all(|v| v.is_finite()));
        assert!(result.centroid.probability.is_finite());
        assert!(result.coverage > 0.0 && result.coverage <= 1.0);
    }

    #[test]
    fn pt_pdf_follows_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        let mut scan = SourceScan::new(config(dir.path())).unwrap();
        let data = synthetic(&scan, double_couple(120.0, 40.0, -60.0), 4);
        scan.scan(&data).unwrap();
        let pdf = scan.pt_pdf().unwrap();
        assert_eq!(pdf.shape(), (50, 100));
        assert!(pdf.p_axis.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn rescanning_replaces_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut scan = SourceScan::new(config(dir.path())).unwrap();
        let first = synthetic(&scan, double_couple(10.0, 80.0, 0.0), 6);
        let second = synthetic(&scan, double_couple(100.0, 30.0, 90.0), 6);
        let a = scan.scan(&first).unwrap().best;
        let b = scan.scan(&second).unwrap().best;
        assert_ne!(a.index, b.index);
        assert_eq!(scan.metrics().scans, 2);
        assert_eq!(scan.result().map(|r| r.best.index), Some(b.index));
    }
}
