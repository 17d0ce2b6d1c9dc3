use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use itertools::Itertools;
use ndarray::{Array2, ArrayView2};
use prost::Message;
use thiserror::Error;

use crate::algorithm::{validate_points, FittedModel};
use crate::error::ConfigError;

#[derive(Clone, PartialEq, Message)]
pub struct FloatList {
    #[prost(double, repeated, tag = "1")]
    pub values: Vec<f64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PointSet {
    #[prost(message, repeated, tag = "1")]
    pub points: Vec<FloatList>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ClusteredData {
    #[prost(message, repeated, tag = "1")]
    pub centers: Vec<FloatList>,
    #[prost(uint32, repeated, tag = "2")]
    pub labels: Vec<u32>,
    #[prost(bool, tag = "3")]
    pub converged: bool,
    #[prost(uint64, tag = "4")]
    pub iterations: u64,
    #[prost(double, tag = "5")]
    pub inertia: f64,
    #[prost(message, optional, tag = "6")]
    pub created_at: Option<prost_types::Timestamp>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to decode {}: {}", .path.display(), .source)]
    Decode {
        path: PathBuf,
        #[source]
        source: prost::DecodeError,
    },
    #[error(transparent)]
    Encode(#[from] prost::EncodeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn to_float_lists(rows: ArrayView2<f64>) -> Vec<FloatList> {
    rows.outer_iter().map(|row| FloatList { values: row.to_vec() }).collect_vec()
}

/// Stacks rows into a point matrix, rejecting ragged or non-finite input.
pub fn points_from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>, ConfigError> {
    let dimensions = rows.first().map(Vec::len).ok_or(ConfigError::EmptyPoints)?;
    if let Some((index, row)) = rows.iter().find_position(|row| row.len() != dimensions) {
        return Err(ConfigError::DimensionMismatch {
            index,
            expected: dimensions,
            got: row.len(),
        });
    }
    let flat = rows.iter().flatten().copied().collect_vec();
    let points = Array2::from_shape_vec((rows.len(), dimensions), flat)
        .map_err(|_| ConfigError::ZeroDimension)?;
    validate_points(points.view())?;
    Ok(points)
}

pub fn save_points(path: impl AsRef<Path>, points: ArrayView2<f64>) -> Result<(), LoadError> {
    let message = PointSet {
        points: to_float_lists(points),
    };
    let mut buf = Vec::with_capacity(message.encoded_len());
    message.encode(&mut buf)?;
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(&buf)?;
    file.flush()?;
    Ok(())
}

pub fn load_points(path: impl AsRef<Path>) -> Result<Array2<f64>, LoadError> {
    let path = path.as_ref();
    let mut buf_reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    buf_reader.read_to_end(&mut buf)?;

    let point_set = PointSet::decode(&*buf).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Loaded {} points from {}", point_set.points.len(), path.display());

    let rows = point_set.points.into_iter().map(|p| p.values).collect_vec();
    Ok(points_from_rows(&rows)?)
}

/// Writes `<dir>/<name>.bin` and returns the path.
pub fn save_model(dir: impl AsRef<Path>, name: &str, model: &FittedModel) -> Result<PathBuf, LoadError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let filepath = dir.join(format!("{}.bin", name));

    let data = ClusteredData {
        centers: to_float_lists(model.centers()),
        labels: model.labels().iter().map(|&l| l as u32).collect_vec(),
        converged: model.converged(),
        iterations: model.iterations() as u64,
        inertia: model.inertia(),
        created_at: Some(SystemTime::now().into()),
    };
    let mut buf = Vec::with_capacity(data.encoded_len());
    data.encode(&mut buf)?;
    let mut file = BufWriter::new(File::create(&filepath)?);
    file.write_all(&buf)?;
    file.flush()?;

    Ok(filepath)
}

pub fn load_model(path: impl AsRef<Path>) -> Result<ClusteredData, LoadError> {
    let path = path.as_ref();
    let buf = fs::read(path)?;
    ClusteredData::decode(&*buf).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
