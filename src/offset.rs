use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, DatasetResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetKind {
    Positive,
    Negative,
}

/// Inclusive range of horizontal offsets in pixels. Always `low <= high`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOffsetRange")]
pub struct OffsetRange {
    low: i64,
    high: i64,
}

#[derive(Deserialize)]
struct RawOffsetRange {
    low: i64,
    high: i64,
}

impl TryFrom<RawOffsetRange> for OffsetRange {
    type Error = DatasetError;

    fn try_from(raw: RawOffsetRange) -> DatasetResult<Self> {
        OffsetRange::new(raw.low, raw.high)
    }
}

impl OffsetRange {
    pub fn new(low: i64, high: i64) -> DatasetResult<Self> {
        if low > high {
            return Err(DatasetError::InvalidConfig(format!(
                "offset range low {low} exceeds high {high}"
            )));
        }
        Ok(OffsetRange { low, high })
    }

    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }
}

impl Default for OffsetRange {
    fn default() -> Self {
        OffsetRange { low: 6, high: 10 }
    }
}

/// Draws horizontal lookup offsets for one image triple.
///
/// Positive offsets are always zero. Negative offsets are uniform over the configured range
/// and come from a ChaCha stream seeded explicitly, so a triple's draws are reproducible.
pub struct OffsetSampler {
    negative: OffsetRange,
    rng: ChaCha8Rng,
}

impl OffsetSampler {
    pub fn new(negative: OffsetRange, seed: u64) -> Self {
        OffsetSampler {
            negative,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn next_offset(&mut self, kind: OffsetKind) -> i64 {
        match kind {
            OffsetKind::Positive => 0,
            OffsetKind::Negative => self
                .rng
                .random_range(self.negative.low..=self.negative.high),
        }
    }
}

/// Seed for the triple at `index` of the sorted file list.
pub fn triple_seed(run_seed: u64, index: usize) -> u64 {
    let mut z = run_seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
