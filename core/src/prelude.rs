use crate::math::sphere::ObservationGrid;
use crate::radiation::energy::EnergyStats;
use crate::radiation::wave::{Component, WaveType};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default root directory of the mechanism grid cache.
pub const DEFAULT_GRID_ROOT: &str = "~/.config/seismic_source_grids";

/// Shared configuration of a source scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Wave types evaluated on the mechanism grid.
    pub waves: Vec<WaveType>,
    /// Polarization components evaluated for each wave, same order as `waves`.
    pub components: Vec<Vec<Component>>,
    pub n_dims: usize,
    pub n_model: usize,
    pub n_obs: usize,
    pub grid_root: PathBuf,
    /// Ignore any cached grid and rebuild it.
    pub reset: bool,
    pub centroid_factor: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            waves: vec![WaveType::P, WaveType::S],
            components: vec![
                vec![Component::Radial],
                vec![Component::Horizontal, Component::Meridian],
            ],
            n_dims: 3,
            n_model: 1500,
            n_obs: 2000,
            grid_root: PathBuf::from(DEFAULT_GRID_ROOT),
            reset: false,
            centroid_factor: 1.0,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> SourceResult<()> {
        if self.waves.len() != self.components.len() {
            return Err(SourceError::Dimension(format!(
                "{} wave types but {} component lists; expected one component list per wave",
                self.waves.len(),
                self.components.len()
            )));
        }
        if self.waves.is_empty() {
            return Err(SourceError::InvalidInput("no wave type requested".into()));
        }
        if let Some(index) = self.components.iter().position(|c| c.is_empty()) {
            return Err(SourceError::InvalidInput(format!(
                "no component requested for wave {}",
                self.waves[index]
            )));
        }
        match self.n_dims {
            3 => {}
            4 => {
                return Err(SourceError::NotImplemented(
                    "strike, dip, rake, DC% scan (n_dims = 4)".into(),
                ))
            }
            5 => {
                return Err(SourceError::NotImplemented(
                    "strike, dip, rake, DC%, ISO% scan (n_dims = 5)".into(),
                ))
            }
            6 => {
                return Err(SourceError::NotImplemented(
                    "full moment tensor scan (n_dims = 6)".into(),
                ))
            }
            other => {
                return Err(SourceError::NotImplemented(format!(
                    "{}-dimensional mechanism space; only 3 (strike, dip, rake) is supported",
                    other
                )))
            }
        }
        if self.n_model == 0 {
            return Err(SourceError::InvalidInput("n_model must be positive".into()));
        }
        if self.n_obs < 4 {
            return Err(SourceError::InvalidInput(format!(
                "n_obs must be at least 4, got {}",
                self.n_obs
            )));
        }
        if !(self.centroid_factor.is_finite()) {
            return Err(SourceError::InvalidInput(
                "centroid_factor must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Grid root with a leading `~` expanded from `$HOME`.
    pub fn resolved_grid_root(&self) -> PathBuf {
        let raw = self.grid_root.to_string_lossy();
        if let Some(rest) = raw.strip_prefix('~') {
            if let Some(home) = std::env::var_os("HOME") {
                let rest = rest.trim_start_matches('/');
                return PathBuf::from(home).join(rest);
            }
        }
        self.grid_root.clone()
    }

    /// Every (wave, component) pair in configuration order.
    pub fn pairs(&self) -> Vec<(WaveType, Component)> {
        wave_component_pairs(&self.waves, &self.components)
    }
}

/// Flattens per-wave component lists into (wave, component) pairs.
pub fn wave_component_pairs(
    waves: &[WaveType],
    components: &[Vec<Component>],
) -> Vec<(WaveType, Component)> {
    waves
        .iter()
        .zip(components.iter())
        .flat_map(|(wave, comps)| comps.iter().map(move |c| (*wave, *c)))
        .collect()
}

/// Displacement field produced by a forward model.
#[derive(Debug, Clone)]
pub struct RadiationPattern {
    /// 3 x n displacement vectors.
    pub displacement: Array2<f64>,
    /// 3 x n cartesian observation directions the field was evaluated at.
    pub observations: Array2<f64>,
}

/// Common error type for the source modeling core.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("dimension mismatch: {0}")]
    Dimension(String),
    #[error("unsupported option: {0}")]
    Unsupported(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("grid cache failure: {0}")]
    Cache(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Far-field radiation pattern engine.
pub trait RadiationModel {
    fn radpat(&self, wave: WaveType, observations: &ObservationGrid)
        -> SourceResult<RadiationPattern>;

    /// `[rms, norm, average]` of the amplitude field over the default sphere.
    fn energy(&self, wave: WaveType) -> SourceResult<EnergyStats> {
        let pattern = self.radpat(wave, ObservationGrid::default_sphere())?;
        Ok(EnergyStats::from_displacement(pattern.displacement.view()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ScanConfig::default();
        config.validate().unwrap();
        assert_eq!(config.pairs().len(), 3);
    }

    #[test]
    fn mismatched_components_are_rejected() {
        let config = ScanConfig {
            components: vec![vec![Component::Radial]],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SourceError::Dimension(_))));
    }

    #[test]
    fn higher_dimensional_scans_fail_fast() {
        for n_dims in [4, 5, 6] {
            let config = ScanConfig {
                n_dims,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(SourceError::NotImplemented(_))
            ));
        }
    }

    #[test]
    fn absolute_grid_root_is_left_alone() {
        let config = ScanConfig {
            grid_root: PathBuf::from("/tmp/grids"),
            ..Default::default()
        };
        assert_eq!(config.resolved_grid_root(), PathBuf::from("/tmp/grids"));
    }
}
