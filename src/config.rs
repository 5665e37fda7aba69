use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DatasetError, DatasetResult};
use crate::offset::OffsetRange;
use crate::sample::{SamplerParams, DEFAULT_STRIDE};

/// Dataset generation settings. Every field has a default, so a partial JSON file is enough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Left images, relative to the dataset root.
    pub left_dir: PathBuf,
    /// Right images, relative to the dataset root.
    pub right_dir: PathBuf,
    /// Ground-truth disparity maps, relative to the dataset root.
    pub disparity_dir: PathBuf,
    /// Extension shared by all three images of a triple.
    pub extension: String,
    pub stride: usize,
    pub negative_offset: OffsetRange,
    /// Fraction of the sorted disparity files that go to the train partition.
    pub train_fraction: f64,
    pub seed: u64,
    /// Abort on the first unreadable triple instead of skipping it.
    pub strict: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            left_dir: PathBuf::from("image_2"),
            right_dir: PathBuf::from("image_3"),
            disparity_dir: PathBuf::from("disp_noc_0"),
            extension: "png".to_string(),
            stride: DEFAULT_STRIDE,
            negative_offset: OffsetRange::default(),
            train_fraction: 0.6,
            seed: 0,
            strict: false,
        }
    }
}

impl DatasetConfig {
    pub fn load(path: &Path) -> DatasetResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| DatasetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: DatasetConfig =
            serde_json::from_str(&contents).map_err(|e| DatasetError::Config {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(config)
    }

    pub fn validate(&self) -> DatasetResult<()> {
        if self.stride == 0 {
            return Err(DatasetError::InvalidConfig("stride must be positive".into()));
        }
        let (low, high) = (self.negative_offset.low(), self.negative_offset.high());
        if low == 0 {
            return Err(DatasetError::InvalidConfig(
                "negative offset range must exclude 0".into(),
            ));
        }
        if low < 0 && high > 0 {
            return Err(DatasetError::InvalidConfig(format!(
                "negative offset range [{low}, {high}] contains 0"
            )));
        }
        if !(0.0..=1.0).contains(&self.train_fraction) {
            return Err(DatasetError::InvalidConfig(format!(
                "train fraction {} outside [0, 1]",
                self.train_fraction
            )));
        }
        if self.extension.is_empty() {
            return Err(DatasetError::InvalidConfig("extension is empty".into()));
        }
        Ok(())
    }

    pub fn sampler_params(&self) -> SamplerParams {
        SamplerParams {
            stride: self.stride,
            negative: self.negative_offset,
        }
    }
}
