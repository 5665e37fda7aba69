//! Labeled patch pairs and their on-store encoding.
//!
//! Records are written as a protobuf message whose field numbers match Caffe's `Datum`, so
//! the stores can be fed to Caffe-style data layers unchanged.
use prost::Message;

use crate::error::{DatasetError, DatasetResult};
use crate::patch::{Patch, PATCH_SIZE, PIXEL_COUNT};

pub const CHANNELS: usize = 2;
pub const RECORD_BYTES: usize = CHANNELS * PIXEL_COUNT;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    /// Right patch taken at a deliberately wrong disparity.
    Negative = 0,
    /// Right patch taken at the ground-truth disparity.
    Positive = 1,
}

impl Label {
    pub fn value(self) -> i32 {
        self as i32
    }

    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(Label::Negative),
            1 => Some(Label::Positive),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Datum {
    #[prost(int32, tag = "1")]
    pub channels: i32,
    #[prost(int32, tag = "2")]
    pub height: i32,
    #[prost(int32, tag = "3")]
    pub width: i32,
    #[prost(bytes = "vec", tag = "4")]
    pub data: Vec<u8>,
    #[prost(int32, tag = "5")]
    pub label: i32,
    #[prost(bool, tag = "7")]
    pub encoded: bool,
}

/// Two-channel 9x9 record: left patch bytes followed by right patch bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchPairRecord {
    data: Vec<u8>,
    label: Label,
}

impl PatchPairRecord {
    pub fn new(left: &Patch, right: &Patch, label: Label) -> Self {
        let mut data = Vec::with_capacity(RECORD_BYTES);
        data.extend_from_slice(left.as_bytes());
        data.extend_from_slice(right.as_bytes());
        PatchPairRecord { data, label }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn left(&self) -> &[u8] {
        &self.data[..PIXEL_COUNT]
    }

    pub fn right(&self) -> &[u8] {
        &self.data[PIXEL_COUNT..]
    }

    pub fn to_datum(&self) -> Datum {
        Datum {
            channels: CHANNELS as i32,
            height: PATCH_SIZE as i32,
            width: PATCH_SIZE as i32,
            data: self.data.clone(),
            label: self.label.value(),
            encoded: false,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_datum().encode_to_vec()
    }

    /// Parses a stored value, rejecting anything that is not a 2x9x9 raw pair.
    pub fn decode(bytes: &[u8]) -> DatasetResult<Self> {
        let datum = Datum::decode(bytes)?;
        if datum.channels != CHANNELS as i32
            || datum.height != PATCH_SIZE as i32
            || datum.width != PATCH_SIZE as i32
            || datum.data.len() != RECORD_BYTES
        {
            return Err(DatasetError::RecordShape(format!(
                "{}x{}x{} with {} bytes",
                datum.channels,
                datum.height,
                datum.width,
                datum.data.len()
            )));
        }
        let label = Label::from_value(datum.label)
            .ok_or_else(|| DatasetError::RecordShape(format!("label {}", datum.label)))?;
        Ok(PatchPairRecord {
            data: datum.data,
            label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ImageGrid;
    use crate::patch::extract_patch;
    use ndarray::Array2;

    fn patches() -> (Patch, Patch) {
        let left = ImageGrid::new(Array2::from_elem((9, 9), 3u8));
        let right = ImageGrid::new(Array2::from_shape_fn((9, 9), |(r, c)| (r * 9 + c) as u8));
        (
            extract_patch(&left, 4, 4).unwrap(),
            extract_patch(&right, 4, 4).unwrap(),
        )
    }

    #[test]
    fn data_is_left_then_right() {
        let (left, right) = patches();
        let record = PatchPairRecord::new(&left, &right, Label::Positive);
        assert_eq!(record.data().len(), RECORD_BYTES);
        assert!(record.left().iter().all(|&v| v == 3));
        assert_eq!(record.right()[0], 0);
        assert_eq!(record.right()[80], 80);
    }

    #[test]
    fn encoded_record_carries_datum_fields() {
        let (left, right) = patches();
        let record = PatchPairRecord::new(&left, &right, Label::Negative);
        let datum = Datum::decode(record.encode().as_slice()).unwrap();
        assert_eq!(datum.channels, 2);
        assert_eq!(datum.height, 9);
        assert_eq!(datum.width, 9);
        assert_eq!(datum.label, 0);
        assert!(!datum.encoded);
        assert_eq!(PatchPairRecord::decode(&record.encode()).unwrap(), record);
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        let datum = Datum {
            channels: 1,
            height: 9,
            width: 9,
            data: vec![0; 81],
            label: 1,
            encoded: false,
        };
        let err = PatchPairRecord::decode(&datum.encode_to_vec()).unwrap_err();
        assert!(matches!(err, DatasetError::RecordShape(_)));
    }
}
