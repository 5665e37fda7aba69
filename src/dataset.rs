//! Train/test corpus assembly.
//!
//! The sorted list of disparity maps is split by count, each partition gets its own store, and
//! records are keyed by a per-partition counter starting at zero.
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::DatasetConfig;
use crate::error::{DatasetError, DatasetResult};
use crate::grid::{ImageTriple, TriplePaths};
use crate::io::{list_disparity_maps, load_triple, triple_paths};
use crate::offset::triple_seed;
use crate::sample::{generate, SampleStats};
use crate::store::{record_key, RecordStore, SledStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    Train,
    Test,
}

impl PartitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Train => "train",
            PartitionKind::Test => "test",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triples of one partition, with their index in the full sorted file list.
#[derive(Clone, Debug)]
pub struct Partition {
    pub kind: PartitionKind,
    pub items: Vec<(usize, TriplePaths)>,
}

/// Number of files that go to the train partition: `floor(fraction * total)`.
pub fn split_index(total: usize, train_fraction: f64) -> usize {
    ((train_fraction * total as f64).floor() as usize).min(total)
}

/// Splits `files` in order: the first `split_index` entries train, the rest test.
pub fn split<T: Clone>(files: &[T], train_fraction: f64) -> (Vec<T>, Vec<T>) {
    let at = split_index(files.len(), train_fraction);
    (files[..at].to_vec(), files[at..].to_vec())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTriple {
    pub disparity: PathBuf,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub kind: PartitionKind,
    pub store: PathBuf,
    pub triples: usize,
    pub records: u64,
    pub stats: SampleStats,
    pub skipped_triples: Vec<SkippedTriple>,
}

impl PartitionReport {
    fn new(kind: PartitionKind, store: PathBuf) -> Self {
        PartitionReport {
            kind,
            store,
            triples: 0,
            records: 0,
            stats: SampleStats::default(),
            skipped_triples: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub dataset_root: PathBuf,
    pub config: DatasetConfig,
    pub total_files: usize,
    pub partitions: Vec<PartitionReport>,
}

impl BuildReport {
    pub fn partition(&self, kind: PartitionKind) -> Option<&PartitionReport> {
        self.partitions.iter().find(|p| p.kind == kind)
    }

    pub fn skipped_triples(&self) -> usize {
        self.partitions
            .iter()
            .map(|p| p.skipped_triples.len())
            .sum()
    }
}

pub struct DatasetBuilder {
    config: DatasetConfig,
}

impl DatasetBuilder {
    pub fn new(config: DatasetConfig) -> DatasetResult<Self> {
        config.validate()?;
        Ok(DatasetBuilder { config })
    }

    /// Splits the sorted disparity maps under `root` into train and test partitions.
    pub fn partitions(&self, root: &Path) -> DatasetResult<(Partition, Partition)> {
        let disparity_dir = root.join(&self.config.disparity_dir);
        let files = list_disparity_maps(&disparity_dir, &self.config.extension)?;
        if files.is_empty() {
            return Err(DatasetError::NoDisparityMaps { dir: disparity_dir });
        }
        let indexed: Vec<(usize, TriplePaths)> = files
            .iter()
            .enumerate()
            .map(|(i, f)| (i, triple_paths(root, f, &self.config)))
            .collect();
        let (train, test) = split(&indexed, self.config.train_fraction);
        Ok((
            Partition {
                kind: PartitionKind::Train,
                items: train,
            },
            Partition {
                kind: PartitionKind::Test,
                items: test,
            },
        ))
    }

    /// Writes `<output>/train` and `<output>/test`. Neither store may exist beforehand.
    pub fn build(&self, root: &Path, output: &Path) -> DatasetResult<BuildReport> {
        let (train, test) = self.partitions(root)?;
        let total_files = train.items.len() + test.items.len();
        info!(
            "{} disparity maps: {} train, {} test",
            total_files,
            train.items.len(),
            test.items.len()
        );
        let mut partitions = Vec::with_capacity(2);
        for partition in [train, test] {
            let path = output.join(partition.kind.as_str());
            let mut store = SledStore::create(&path)?;
            let mut report = PartitionReport::new(partition.kind, path);
            self.write_partition(&partition, &mut store, &mut report, load_triple)?;
            partitions.push(report);
        }
        Ok(BuildReport {
            dataset_root: root.to_path_buf(),
            config: self.config.clone(),
            total_files,
            partitions,
        })
    }

    /// Streams every triple of `partition` into `store`, keys starting at zero.
    pub fn write_partition<S, L>(
        &self,
        partition: &Partition,
        store: &mut S,
        report: &mut PartitionReport,
        mut load: L,
    ) -> DatasetResult<()>
    where
        S: RecordStore,
        L: FnMut(&TriplePaths) -> DatasetResult<ImageTriple>,
    {
        let kind = partition.kind;
        let total = partition.items.len();
        if total == 0 {
            warn!("[{kind}] partition is empty");
        }
        let params = self.config.sampler_params();
        let mut counter: u64 = 0;
        for (n, (index, paths)) in partition.items.iter().enumerate() {
            let triple = match load(paths) {
                Ok(triple) => triple,
                Err(e) if !self.config.strict && is_triple_error(&e) => {
                    warn!("[{kind}] skipping {}: {e}", paths.disparity.display());
                    report.skipped_triples.push(SkippedTriple {
                        disparity: paths.disparity.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            let mut samples = generate(&triple, params, triple_seed(self.config.seed, *index));
            let mut written = 0usize;
            for sample in samples.by_ref() {
                store.put(&record_key(counter), &sample.record.encode())?;
                counter += 1;
                written += 1;
            }
            report.stats.merge(samples.stats());
            report.triples += 1;
            info!(
                "[{kind}] {}/{} {}: {} records",
                n + 1,
                total,
                paths.disparity.display(),
                written
            );
        }
        store.finish()?;
        report.records = counter;
        if !report.skipped_triples.is_empty() {
            warn!(
                "[{kind}] skipped {} of {} triples",
                report.skipped_triples.len(),
                total
            );
        }
        info!(
            "[{kind}] wrote {} records ({} positive, {} negative, {} out of bounds)",
            counter,
            report.stats.positives,
            report.stats.negatives,
            report.stats.skipped()
        );
        Ok(())
    }
}

fn is_triple_error(err: &DatasetError) -> bool {
    matches!(
        err,
        DatasetError::ImageLoad { .. } | DatasetError::DimensionMismatch { .. }
    )
}
