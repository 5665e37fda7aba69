//! Sparse sampling of labeled patch pairs from one stereo triple.
//!
//! The disparity grid is scanned on a fixed stride, rows outer and columns inner. Each
//! location with a known disparity `d` yields up to two records, negative first:
//!
//! - negative: right patch centered at `(c - d + o, r)` with `o` drawn from the negative range
//! - positive: right patch centered at `(c - d, r)`
//!
//! A record whose left or right footprint leaves its grid is skipped and counted.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::grid::ImageTriple;
use crate::offset::{OffsetKind, OffsetRange, OffsetSampler};
use crate::patch::extract_patch;
use crate::record::{Label, PatchPairRecord};

pub const DEFAULT_STRIDE: usize = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    LeftOutOfBounds,
    RightOutOfBounds,
}

/// One emitted record and where its patches came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    pub x: usize,
    pub y: usize,
    pub disparity: u8,
    pub offset: i64,
    /// Column of the right patch center.
    pub right_x: i64,
    pub record: PatchPairRecord,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleStats {
    pub locations: usize,
    pub zero_disparity: usize,
    pub negatives: usize,
    pub positives: usize,
    pub negative_left_out_of_bounds: usize,
    pub negative_right_out_of_bounds: usize,
    pub positive_left_out_of_bounds: usize,
    pub positive_right_out_of_bounds: usize,
}

impl SampleStats {
    pub fn records(&self) -> usize {
        self.negatives + self.positives
    }

    pub fn skipped(&self) -> usize {
        self.negative_left_out_of_bounds
            + self.negative_right_out_of_bounds
            + self.positive_left_out_of_bounds
            + self.positive_right_out_of_bounds
    }

    pub fn merge(&mut self, other: &SampleStats) {
        self.locations += other.locations;
        self.zero_disparity += other.zero_disparity;
        self.negatives += other.negatives;
        self.positives += other.positives;
        self.negative_left_out_of_bounds += other.negative_left_out_of_bounds;
        self.negative_right_out_of_bounds += other.negative_right_out_of_bounds;
        self.positive_left_out_of_bounds += other.positive_left_out_of_bounds;
        self.positive_right_out_of_bounds += other.positive_right_out_of_bounds;
    }

    fn record_skip(&mut self, kind: OffsetKind, reason: SkipReason) {
        let slot = match (kind, reason) {
            (OffsetKind::Negative, SkipReason::LeftOutOfBounds) => {
                &mut self.negative_left_out_of_bounds
            }
            (OffsetKind::Negative, SkipReason::RightOutOfBounds) => {
                &mut self.negative_right_out_of_bounds
            }
            (OffsetKind::Positive, SkipReason::LeftOutOfBounds) => {
                &mut self.positive_left_out_of_bounds
            }
            (OffsetKind::Positive, SkipReason::RightOutOfBounds) => {
                &mut self.positive_right_out_of_bounds
            }
        };
        *slot += 1;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SamplerParams {
    pub stride: usize,
    pub negative: OffsetRange,
}

impl Default for SamplerParams {
    fn default() -> Self {
        SamplerParams {
            stride: DEFAULT_STRIDE,
            negative: OffsetRange::default(),
        }
    }
}

/// Lazily yields the samples of one triple. Single pass.
pub struct Samples<'a> {
    triple: &'a ImageTriple,
    stride: usize,
    sampler: OffsetSampler,
    row: usize,
    col: usize,
    pending: Option<Sample>,
    stats: SampleStats,
}

pub fn generate(triple: &ImageTriple, params: SamplerParams, seed: u64) -> Samples<'_> {
    Samples {
        triple,
        stride: params.stride.max(1),
        sampler: OffsetSampler::new(params.negative, seed),
        row: 0,
        col: 0,
        pending: None,
        stats: SampleStats::default(),
    }
}

impl<'a> Samples<'a> {
    pub fn stats(&self) -> &SampleStats {
        &self.stats
    }

    fn next_location(&mut self) -> Option<(usize, usize)> {
        let disp = &self.triple.disparity;
        if self.col >= disp.cols() {
            self.col = 0;
            self.row += self.stride;
        }
        if self.row >= disp.rows() || disp.cols() == 0 {
            return None;
        }
        let loc = (self.col, self.row);
        self.col += self.stride;
        Some(loc)
    }

    fn sample_at(
        &mut self,
        x: usize,
        y: usize,
        disparity: u8,
        kind: OffsetKind,
        offset: i64,
    ) -> Option<Sample> {
        let cy = y as i64;
        let left = match extract_patch(&self.triple.left, x as i64, cy) {
            Ok(patch) => patch,
            Err(_) => {
                self.skip(x, y, kind, SkipReason::LeftOutOfBounds);
                return None;
            }
        };
        let right_x = x as i64 - disparity as i64 + offset;
        let right = match extract_patch(&self.triple.right, right_x, cy) {
            Ok(patch) => patch,
            Err(_) => {
                self.skip(x, y, kind, SkipReason::RightOutOfBounds);
                return None;
            }
        };
        let label = match kind {
            OffsetKind::Negative => {
                self.stats.negatives += 1;
                Label::Negative
            }
            OffsetKind::Positive => {
                self.stats.positives += 1;
                Label::Positive
            }
        };
        Some(Sample {
            x,
            y,
            disparity,
            offset,
            right_x,
            record: PatchPairRecord::new(&left, &right, label),
        })
    }

    fn skip(&mut self, x: usize, y: usize, kind: OffsetKind, reason: SkipReason) {
        debug!("skipping {kind:?} sample at ({x}, {y}): {reason:?}");
        self.stats.record_skip(kind, reason);
    }
}

impl<'a> Iterator for Samples<'a> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        loop {
            if let Some(sample) = self.pending.take() {
                return Some(sample);
            }
            let (x, y) = self.next_location()?;
            let d = self.triple.disparity.at(x, y);
            if d == 0 {
                self.stats.zero_disparity += 1;
                continue;
            }
            self.stats.locations += 1;
            // one draw per known-disparity location, before extraction
            let negative_offset = self.sampler.next_offset(OffsetKind::Negative);
            let positive_offset = self.sampler.next_offset(OffsetKind::Positive);
            let negative = self.sample_at(x, y, d, OffsetKind::Negative, negative_offset);
            let positive = self.sample_at(x, y, d, OffsetKind::Positive, positive_offset);
            match (negative, positive) {
                (Some(sample), pending) => {
                    self.pending = pending;
                    return Some(sample);
                }
                (None, Some(sample)) => return Some(sample),
                (None, None) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{ImageGrid, TriplePaths};
    use crate::record::RECORD_BYTES;
    use ndarray::Array2;
    use std::path::PathBuf;

    fn textured(rows: usize, cols: usize) -> ImageGrid {
        ImageGrid::new(Array2::from_shape_fn((rows, cols), |(r, c)| {
            ((r * 31 + c * 7) % 251) as u8
        }))
    }

    fn triple(disparity: ImageGrid) -> ImageTriple {
        let (rows, cols) = disparity.dims();
        let paths = TriplePaths {
            left: PathBuf::from("left.png"),
            right: PathBuf::from("right.png"),
            disparity: PathBuf::from("disp.png"),
        };
        ImageTriple::new(textured(rows, cols), textured(rows, cols), disparity, &paths).unwrap()
    }

    #[test]
    fn all_zero_disparity_yields_nothing() {
        let t = triple(ImageGrid::zeros(120, 160));
        let mut samples = generate(&t, SamplerParams::default(), 1);
        assert!(samples.next().is_none());
        assert_eq!(samples.stats().zero_disparity, 5 * 7);
        assert_eq!(samples.stats().locations, 0);
    }

    #[test]
    fn single_known_pixel_yields_negative_then_positive() {
        let mut disp = Array2::<u8>::zeros((50, 50));
        disp[(25, 25)] = 5;
        let t = triple(ImageGrid::new(disp));
        let samples: Vec<Sample> = generate(&t, SamplerParams::default(), 9).collect();
        assert_eq!(samples.len(), 2);

        let negative = &samples[0];
        assert_eq!(negative.record.label(), Label::Negative);
        assert!((21..=25).contains(&negative.right_x));
        assert_eq!(negative.right_x, 20 + negative.offset);

        let positive = &samples[1];
        assert_eq!(positive.record.label(), Label::Positive);
        assert_eq!(positive.right_x, 20);
        assert_eq!(positive.offset, 0);
        assert_eq!(
            positive.record.right(),
            extract_patch(&t.right, 20, 25).unwrap().as_bytes()
        );
        assert_eq!(
            positive.record.left(),
            extract_patch(&t.left, 25, 25).unwrap().as_bytes()
        );
    }

    #[test]
    fn records_respect_geometry_across_a_dense_grid() {
        let disp = Array2::from_shape_fn((200, 300), |(r, c)| ((r + c) % 40) as u8);
        let t = triple(ImageGrid::new(disp));
        let mut samples = generate(&t, SamplerParams::default(), 3);
        let mut count = 0;
        for sample in samples.by_ref() {
            count += 1;
            assert_ne!(sample.disparity, 0);
            assert_eq!(sample.record.data().len(), RECORD_BYTES);
            assert_eq!(sample.x % DEFAULT_STRIDE, 0);
            assert_eq!(sample.y % DEFAULT_STRIDE, 0);
            let base = sample.x as i64 - sample.disparity as i64;
            match sample.record.label() {
                Label::Positive => assert_eq!(sample.right_x, base),
                Label::Negative => assert!((base + 6..=base + 10).contains(&sample.right_x)),
            }
        }
        let stats = samples.stats();
        assert!(count > 0);
        assert_eq!(stats.records(), count);
        assert_eq!(
            stats.negatives + stats.negative_left_out_of_bounds + stats.negative_right_out_of_bounds,
            stats.locations
        );
        assert_eq!(
            stats.positives + stats.positive_left_out_of_bounds + stats.positive_right_out_of_bounds,
            stats.locations
        );
    }

    #[test]
    fn border_locations_are_counted_not_emitted() {
        let disp = Array2::from_elem((60, 60), 5u8);
        let t = triple(ImageGrid::new(disp));
        let mut samples = generate(&t, SamplerParams::default(), 0);
        let emitted: Vec<Sample> = samples.by_ref().collect();
        // only columns and rows 25 and 50 keep the left patch inside
        assert_eq!(emitted.len(), 8);
        let stats = samples.stats();
        assert_eq!(stats.locations, 9);
        assert_eq!(stats.negative_left_out_of_bounds, 5);
        assert_eq!(stats.positive_left_out_of_bounds, 5);
        assert_eq!(stats.skipped(), 10);
    }

    #[test]
    fn positive_survives_when_negative_falls_off_the_right_edge() {
        let mut disp = Array2::<u8>::zeros((30, 30));
        disp[(25, 25)] = 1;
        let t = triple(ImageGrid::new(disp));
        let samples: Vec<Sample> = generate(&t, SamplerParams::default(), 5).collect();
        // left patch at (25, 25) needs x, y up to 29
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].record.label(), Label::Positive);
        assert_eq!(samples[0].right_x, 24);
    }

    #[test]
    fn same_seed_reproduces_samples() {
        let disp = Array2::from_elem((100, 100), 12u8);
        let t = triple(ImageGrid::new(disp));
        let a: Vec<Sample> = generate(&t, SamplerParams::default(), 77).collect();
        let b: Vec<Sample> = generate(&t, SamplerParams::default(), 77).collect();
        assert_eq!(a, b);
    }
}
