use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("store already exists at {path}")]
    StorageInit { path: PathBuf },
    #[error("store error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: sled::Error,
    },
    #[error("duplicate record key {key}")]
    DuplicateKey { key: String },
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path} is {found:?} (rows, cols), expected {expected:?}")]
    DimensionMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no disparity maps found in {dir}")]
    NoDisparityMaps { dir: PathBuf },
    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("malformed record: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("record shape mismatch: {0}")]
    RecordShape(String),
}
