//! Builds patch-pair training corpora for stereo matching networks.
//!
//! For every sampled pixel with a known disparity, a 9x9 patch from the left image is paired
//! with a 9x9 patch from the right image, once at the true disparity (label 1) and once at a
//! deliberately wrong one (label 0). Pairs are written to ordered key/value stores split into
//! train and test partitions.

pub mod config;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod io;
pub mod offset;
pub mod patch;
pub mod record;
pub mod sample;
pub mod store;

pub use config::DatasetConfig;
pub use dataset::{BuildReport, DatasetBuilder, PartitionKind, PartitionReport};
pub use error::{DatasetError, DatasetResult};
pub use grid::{ImageGrid, ImageTriple, TriplePaths};
pub use offset::{OffsetKind, OffsetRange, OffsetSampler};
pub use patch::{extract_patch, OutOfBounds, Patch, PATCH_SIZE};
pub use record::{Label, PatchPairRecord};
pub use sample::{generate, Sample, SampleStats, SamplerParams, Samples};
pub use store::{record_key, MemoryStore, RecordStore, SledStore};
