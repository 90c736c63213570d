use anyhow::Context;
use focalcore::prelude::ScanConfig;
use focalcore::tensor::Mechanism;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the observed wavelets of a run come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    Synthetic,
    Artificial,
    /// JSON-encoded observed data read from `DataConfig::path`.
    File,
}

/// Per-wavelet degradation ranges.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DegradeConfig {
    /// Time shift as a fraction of the wavelet length.
    pub shift: [f64; 2],
    pub snr: [f64; 2],
}

impl Default for DegradeConfig {
    fn default() -> Self {
        Self {
            shift: [-0.1, 0.1],
            snr: [0.5, 5.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub source: DataSource,
    pub stations: usize,
    pub full_sphere: bool,
    /// Station-free cone aperture; radians, or degrees when above π.
    pub gap: f64,
    /// Synthetic mechanism; a random double couple when absent.
    pub mechanism: Option<Mechanism>,
    pub seed: u64,
    pub degrade: Option<DegradeConfig>,
    pub path: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Synthetic,
            stations: 50,
            full_sphere: false,
            gap: 0.0,
            mechanism: None,
            seed: 0,
            degrade: None,
            path: None,
        }
    }
}

/// Which solution the benchmark scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solution {
    #[default]
    Best,
    Centroid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Values per sweep.
    pub steps: usize,
    /// Scans per value.
    pub bootstrap: usize,
    /// Station counts of the gap, SNR and shift sweeps.
    pub station_tests: Vec<usize>,
    pub non_dc_stations: usize,
    pub solution: Solution,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            steps: 20,
            bootstrap: 10,
            station_tests: vec![16, 32, 64, 128],
            non_dc_stations: 300,
            solution: Solution::Best,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub scan: ScanConfig,
    pub data: DataConfig,
    pub benchmark: BenchmarkConfig,
    /// Attach the P/T axis surfaces to the run result.
    pub pt_pdf: bool,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .scan
            .validate()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(stations: usize, n_model: usize, n_obs: usize) -> Self {
        Self {
            scan: ScanConfig {
                n_model,
                n_obs,
                ..ScanConfig::default()
            },
            data: DataConfig {
                stations,
                ..DataConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focalcore::radiation::{Component, WaveType};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_sets_grid_and_stations() {
        let cfg = WorkflowConfig::from_args(24, 800, 500);
        assert_eq!(cfg.data.stations, 24);
        assert_eq!(cfg.scan.n_model, 800);
        assert_eq!(cfg.scan.n_obs, 500);
        assert_eq!(cfg.data.source, DataSource::Synthetic);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"scan:\n  waves: [P]\n  components: [[L]]\n  n_model: 400\n\
data:\n  stations: 30\n  full_sphere: true\n  mechanism: [82, 5, 10]\n  \
degrade:\n    shift: [0.0, 0.0]\n    snr: [2.0, 2.0]\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.scan.waves, vec![WaveType::P]);
        assert_eq!(cfg.scan.components, vec![vec![Component::Radial]]);
        assert_eq!(cfg.scan.n_obs, 2000);
        assert_eq!(cfg.data.stations, 30);
        assert_eq!(cfg.data.mechanism, Some(Mechanism::Angles([82.0, 5.0, 10.0])));
        assert_eq!(cfg.data.degrade.map(|d| d.snr), Some([2.0, 2.0]));
        assert_eq!(cfg.benchmark, BenchmarkConfig::default());
    }

    #[test]
    fn config_load_rejects_unsupported_scans() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"scan:\n  n_dims: 5\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
