//! On-disk snapshots of a [`MechanismGrid`].

use crate::grid::{AmplitudeField, GridKey, MechanismGrid};
use crate::prelude::{SourceError, SourceResult};
use crate::radiation::wave::{Component, WaveType};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Serialize, Deserialize)]
struct StoredField {
    wave: WaveType,
    component: Component,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl StoredField {
    fn from_field(field: &AmplitudeField) -> Self {
        let (rows, cols) = field.values.dim();
        Self {
            wave: field.wave,
            component: field.component,
            rows,
            cols,
            data: field.values.iter().copied().collect(),
        }
    }

    fn into_field(self) -> SourceResult<AmplitudeField> {
        let values = Array2::from_shape_vec((self.rows, self.cols), self.data).map_err(|err| {
            SourceError::Cache(format!(
                "{} {} field does not fit {} x {}: {}",
                self.wave, self.component, self.rows, self.cols, err
            ))
        })?;
        Ok(AmplitudeField {
            wave: self.wave,
            component: self.component,
            values,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct GridSnapshot {
    key: GridKey,
    precision: f64,
    mechanisms: Vec<[f64; 3]>,
    tensors: Vec<[f64; 6]>,
    p_axes: Vec<[f64; 3]>,
    t_axes: Vec<[f64; 3]>,
    fields: Vec<StoredField>,
}

/// Location of the cache file for `key` under `root`.
pub fn cache_path(root: &Path, key: &GridKey) -> PathBuf {
    root.join(key.file_name())
}

/// Writes `grid` to `path` through a temporary sibling file that is renamed
/// into place once complete.
pub fn save(grid: &MechanismGrid, path: &Path) -> SourceResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|err| {
        SourceError::Cache(format!("creating cache directory {}: {}", dir.display(), err))
    })?;

    let snapshot = GridSnapshot {
        key: grid.key().clone(),
        precision: grid.precision(),
        mechanisms: grid.mechanisms().to_vec(),
        tensors: grid.tensors().to_vec(),
        p_axes: grid.p_axes().to_vec(),
        t_axes: grid.t_axes().to_vec(),
        fields: grid.fields().iter().map(StoredField::from_field).collect(),
    };

    let temp = NamedTempFile::new_in(&dir).map_err(|err| {
        SourceError::Cache(format!("creating temporary file in {}: {}", dir.display(), err))
    })?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        bincode::serialize_into(&mut writer, &snapshot)
            .map_err(|err| SourceError::Cache(format!("encoding grid: {}", err)))?;
        writer
            .flush()
            .map_err(|err| SourceError::Cache(format!("flushing grid: {}", err)))?;
    }
    temp.persist(path).map_err(|err| {
        SourceError::Cache(format!("persisting grid to {}: {}", path.display(), err))
    })?;
    Ok(())
}

/// Reads the grid stored at `path`, rejecting snapshots written for another
/// key or whose arrays do not match the key's shapes.
pub fn load(path: &Path, key: &GridKey) -> SourceResult<MechanismGrid> {
    let file = File::open(path)
        .map_err(|err| SourceError::Cache(format!("opening {}: {}", path.display(), err)))?;
    let snapshot: GridSnapshot = bincode::deserialize_from(BufReader::new(file))
        .map_err(|err| SourceError::Cache(format!("decoding {}: {}", path.display(), err)))?;
    if snapshot.key != *key {
        return Err(SourceError::Cache(format!(
            "{} holds grid {}, expected {}",
            path.display(),
            snapshot.key.file_name(),
            key.file_name()
        )));
    }
    let fields = snapshot
        .fields
        .into_iter()
        .map(StoredField::into_field)
        .collect::<SourceResult<Vec<_>>>()?;
    MechanismGrid::from_parts(
        snapshot.key,
        snapshot.precision,
        snapshot.mechanisms,
        snapshot.tensors,
        snapshot.p_axes,
        snapshot.t_axes,
        fields,
    )
    .map_err(|err| SourceError::Cache(format!("{}: {}", path.display(), err)))
}
