//! Precomputed forward-model predictions over a discretized mechanism space.

pub mod cache;
pub mod space;

pub use space::{MechanismSpace, ANTIPODAL_MULTIPLICITY};

use crate::math::geometry::{to_spherical, vector_normal};
use crate::math::sphere::ObservationGrid;
use crate::prelude::{
    wave_component_pairs, RadiationModel, ScanConfig, SourceError, SourceResult,
};
use crate::radiation::aki_richards::AkiRichards;
use crate::radiation::projection::project_signed;
use crate::radiation::wave::{Component, WaveType};
use crate::tensor::decomposition::Decomposer;
use crate::tensor::mechanism::double_couple;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration values that determine the content of a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridKey {
    pub waves: Vec<WaveType>,
    pub components: Vec<Vec<Component>>,
    pub n_dims: usize,
    pub n_model: usize,
    pub n_obs: usize,
}

impl GridKey {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            waves: config.waves.clone(),
            components: config.components.clone(),
            n_dims: config.n_dims,
            n_model: config.n_model,
            n_obs: config.n_obs,
        }
    }

    /// Cache file name, e.g. `Wtypes_P_S.Ch_L_T_Q.Nd_3.Nm_1500.No_2000.bin`.
    pub fn file_name(&self) -> String {
        let waves: Vec<String> = self.waves.iter().map(|w| w.cache_tag()).collect();
        let components: Vec<String> = self
            .components
            .iter()
            .flatten()
            .map(|c| c.tag().to_string())
            .collect();
        format!(
            "Wtypes_{}.Ch_{}.Nd_{}.Nm_{}.No_{}.bin",
            waves.join("_"),
            components.join("_"),
            self.n_dims,
            self.n_model,
            self.n_obs
        )
    }

    pub fn pairs(&self) -> Vec<(WaveType, Component)> {
        wave_component_pairs(&self.waves, &self.components)
    }
}

/// Signed amplitudes of one (wave, component) pair, mechanisms x observations.
#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeField {
    pub wave: WaveType,
    pub component: Component,
    pub values: Array2<f64>,
}

/// Per-cell forward model output gathered by the parallel build.
struct CellModel {
    tensor: [f64; 6],
    p_axis: [f64; 3],
    t_axis: [f64; 3],
    amplitudes: Vec<Vec<f64>>,
}

/// Mechanism grid with every per-cell quantity the scan reads.
#[derive(Debug, Clone, PartialEq)]
pub struct MechanismGrid {
    key: GridKey,
    precision: f64,
    mechanisms: Vec<[f64; 3]>,
    tensors: Vec<[f64; 6]>,
    p_axes: Vec<[f64; 3]>,
    t_axes: Vec<[f64; 3]>,
    fields: Vec<AmplitudeField>,
    observations: ObservationGrid,
}

impl MechanismGrid {
    /// Evaluates the Aki-Richards model for every cell of the strike/dip/rake
    /// space on a `globe(n_obs)` sampling.
    pub fn build(key: GridKey, decomposer: &dyn Decomposer) -> SourceResult<Self> {
        if key.n_dims != 3 {
            return Err(SourceError::NotImplemented(format!(
                "{}-dimensional mechanism grid",
                key.n_dims
            )));
        }
        let space = MechanismSpace::new(key.n_model);
        let mechanisms = space.cells();
        let observations = ObservationGrid::globe(1.0, key.n_obs);
        let pairs = key.pairs();

        let mut directions = Vec::with_capacity(pairs.len());
        for (_, component) in &pairs {
            directions.push(vector_normal(observations.cartesian().view(), *component)?);
        }
        let mut waves: Vec<WaveType> = Vec::new();
        for (wave, _) in &pairs {
            if !waves.contains(wave) {
                waves.push(*wave);
            }
        }

        let cells: Vec<CellModel> = mechanisms
            .par_iter()
            .map(|&[strike, dip, rake]| -> SourceResult<CellModel> {
                let tensor = double_couple(strike, dip, rake);
                let decomposition = decomposer.decompose(&tensor)?;
                let model = AkiRichards::from_tensor(tensor);
                let mut patterns = Vec::with_capacity(waves.len());
                for wave in &waves {
                    patterns.push(model.radpat(*wave, &observations)?);
                }
                let mut amplitudes = Vec::with_capacity(pairs.len());
                for ((wave, _), direction) in pairs.iter().zip(directions.iter()) {
                    let slot = waves.iter().position(|w| w == wave).ok_or_else(|| {
                        SourceError::Internal(format!("no pattern computed for {}", wave))
                    })?;
                    let projected =
                        project_signed(patterns[slot].displacement.view(), direction.view())?;
                    amplitudes.push(projected.amplitudes.to_vec());
                }
                Ok(CellModel {
                    tensor,
                    p_axis: to_spherical(decomposition.p_axis),
                    t_axis: to_spherical(decomposition.t_axis),
                    amplitudes,
                })
            })
            .collect::<SourceResult<Vec<_>>>()?;

        let n_obs = observations.len();
        let mut fields: Vec<AmplitudeField> = pairs
            .iter()
            .map(|&(wave, component)| AmplitudeField {
                wave,
                component,
                values: Array2::zeros((cells.len(), n_obs)),
            })
            .collect();
        let mut tensors = Vec::with_capacity(cells.len());
        let mut p_axes = Vec::with_capacity(cells.len());
        let mut t_axes = Vec::with_capacity(cells.len());
        for (row, cell) in cells.into_iter().enumerate() {
            for (field, amplitudes) in fields.iter_mut().zip(cell.amplitudes.iter()) {
                for (column, value) in amplitudes.iter().enumerate() {
                    field.values[[row, column]] = *value;
                }
            }
            tensors.push(cell.tensor);
            p_axes.push(cell.p_axis);
            t_axes.push(cell.t_axis);
        }

        Ok(Self {
            key,
            precision: space.precision(),
            mechanisms,
            tensors,
            p_axes,
            t_axes,
            fields,
            observations,
        })
    }

    /// Reassembles a grid from stored parts, checking every shape against
    /// the key.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        key: GridKey,
        precision: f64,
        mechanisms: Vec<[f64; 3]>,
        tensors: Vec<[f64; 6]>,
        p_axes: Vec<[f64; 3]>,
        t_axes: Vec<[f64; 3]>,
        fields: Vec<AmplitudeField>,
    ) -> SourceResult<Self> {
        let space = MechanismSpace::new(key.n_model);
        let count = space.len();
        let shape_error = |what: &str, got: usize| {
            SourceError::Dimension(format!(
                "stored {} has {} entries, expected {} for {}",
                what,
                got,
                count,
                key.file_name()
            ))
        };
        if mechanisms.len() != count {
            return Err(shape_error("mechanism array", mechanisms.len()));
        }
        if tensors.len() != count {
            return Err(shape_error("tensor array", tensors.len()));
        }
        if p_axes.len() != count || t_axes.len() != count {
            return Err(shape_error("axis array", p_axes.len().min(t_axes.len())));
        }
        let pairs = key.pairs();
        if fields.len() != pairs.len() {
            return Err(SourceError::Dimension(format!(
                "stored grid has {} amplitude fields, expected {}",
                fields.len(),
                pairs.len()
            )));
        }
        for (field, (wave, component)) in fields.iter().zip(pairs.iter()) {
            if field.wave != *wave || field.component != *component {
                return Err(SourceError::Dimension(format!(
                    "stored field {} {} where {} {} was expected",
                    field.wave, field.component, wave, component
                )));
            }
            if field.values.dim() != (count, key.n_obs) {
                return Err(SourceError::Dimension(format!(
                    "stored {} {} field is {:?}, expected ({}, {})",
                    wave,
                    component,
                    field.values.dim(),
                    count,
                    key.n_obs
                )));
            }
        }
        let observations = ObservationGrid::globe(1.0, key.n_obs);
        Ok(Self {
            key,
            precision,
            mechanisms,
            tensors,
            p_axes,
            t_axes,
            fields,
            observations,
        })
    }

    pub fn key(&self) -> &GridKey {
        &self.key
    }

    /// Angular step of the strike/dip/rake axes, degrees.
    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn len(&self) -> usize {
        self.mechanisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mechanisms.is_empty()
    }

    /// `(strike, dip, rake)` per cell, degrees.
    pub fn mechanisms(&self) -> &[[f64; 3]] {
        &self.mechanisms
    }

    pub fn tensors(&self) -> &[[f64; 6]] {
        &self.tensors
    }

    /// P axes as `(azimuth, polar, radius)`.
    pub fn p_axes(&self) -> &[[f64; 3]] {
        &self.p_axes
    }

    /// T axes as `(azimuth, polar, radius)`.
    pub fn t_axes(&self) -> &[[f64; 3]] {
        &self.t_axes
    }

    pub fn fields(&self) -> &[AmplitudeField] {
        &self.fields
    }

    pub fn field(&self, wave: WaveType, component: Component) -> Option<&AmplitudeField> {
        self.fields
            .iter()
            .find(|f| f.wave == wave && f.component == component)
    }

    pub fn observations(&self) -> &ObservationGrid {
        &self.observations
    }

    /// Prior probability of one cell, `P(Mt)`.
    pub fn prior(&self) -> f64 {
        if self.mechanisms.is_empty() {
            return f64::NAN;
        }
        ANTIPODAL_MULTIPLICITY / self.mechanisms.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::decomposition::EigenDecomposer;

    fn small_key() -> GridKey {
        GridKey {
            waves: vec![WaveType::P, WaveType::S],
            components: vec![vec![Component::Radial], vec![Component::Horizontal]],
            n_dims: 3,
            n_model: 200,
            n_obs: 60,
        }
    }

    #[test]
    fn file_name_lists_every_key_field() {
        let key = GridKey::from_config(&ScanConfig::default());
        assert_eq!(key.file_name(), "Wtypes_P_S.Ch_L_T_Q.Nd_3.Nm_1500.No_2000.bin");
    }

    #[test]
    fn key_pairs_follow_the_scan_config() {
        let config = ScanConfig::default();
        let pairs = GridKey::from_config(&config).pairs();
        assert_eq!(pairs, config.pairs());
        assert_eq!(
            pairs,
            vec![
                (WaveType::P, Component::Radial),
                (WaveType::S, Component::Horizontal),
                (WaveType::S, Component::Meridian),
            ]
        );
    }

    #[test]
    fn build_fills_every_pair() {
        let grid = MechanismGrid::build(small_key(), &EigenDecomposer).unwrap();
        let space = MechanismSpace::new(200);
        assert_eq!(grid.len(), space.len());
        assert_eq!(grid.fields().len(), 2);
        let field = grid.field(WaveType::P, Component::Radial).unwrap();
        assert_eq!(field.values.dim(), (grid.len(), 60));
        assert!(grid.field(WaveType::S, Component::Meridian).is_none());
        assert!((grid.prior() * grid.len() as f64 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn build_is_deterministic() {
        let first = MechanismGrid::build(small_key(), &EigenDecomposer).unwrap();
        let second = MechanismGrid::build(small_key(), &EigenDecomposer).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn p_field_matches_direct_forward_model() {
        let grid = MechanismGrid::build(small_key(), &EigenDecomposer).unwrap();
        let field = grid.field(WaveType::P, Component::Radial).unwrap();
        let row = grid.len() / 3;
        let model = AkiRichards::from_tensor(grid.tensors()[row]);
        let pattern = model.radpat(WaveType::P, grid.observations()).unwrap();
        for column in 0..grid.observations().len() {
            let gamma = grid.observations().cartesian().column(column);
            let radial: f64 = pattern.displacement.column(column).dot(&gamma);
            if radial.abs() > 1e-3 {
                assert_eq!(field.values[[row, column]].signum(), radial.signum());
                assert!((field.values[[row, column]].abs() - radial.abs()).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn higher_dimensions_are_not_built() {
        let key = GridKey {
            n_dims: 5,
            ..small_key()
        };
        assert!(matches!(
            MechanismGrid::build(key, &EigenDecomposer),
            Err(SourceError::NotImplemented(_))
        ));
    }
}
