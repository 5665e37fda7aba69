//! Ordered key/value stores that receive encoded records.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{DatasetError, DatasetResult};

/// Fixed-width hex key, so lexicographic order equals insertion order.
pub fn record_key(counter: u64) -> String {
    format!("{:016x}", counter)
}

/// Append-only sink for `(key, value)` pairs.
pub trait RecordStore {
    fn put(&mut self, key: &str, value: &[u8]) -> DatasetResult<()>;

    /// Flushes pending writes. Called once after the last `put`.
    fn finish(&mut self) -> DatasetResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.entries
    }
}

impl RecordStore for MemoryStore {
    fn put(&mut self, key: &str, value: &[u8]) -> DatasetResult<()> {
        if self.entries.contains_key(key) {
            return Err(DatasetError::DuplicateKey {
                key: key.to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// On-disk store backed by sled.
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
}

impl SledStore {
    /// Creates a fresh store. Fails with `StorageInit` if anything already exists at `path`.
    pub fn create(path: &Path) -> DatasetResult<Self> {
        if path.exists() {
            return Err(DatasetError::StorageInit {
                path: path.to_path_buf(),
            });
        }
        let db = sled::Config::new()
            .path(path)
            .create_new(true)
            .open()
            .map_err(|e| storage_error(path, e))?;
        Ok(SledStore {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Reads every entry of an existing store in key order.
    pub fn read_all(path: &Path) -> DatasetResult<Vec<(String, Vec<u8>)>> {
        if !path.exists() {
            return Err(DatasetError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        let db = sled::Config::new()
            .path(path)
            .open()
            .map_err(|e| storage_error(path, e))?;
        let mut entries = Vec::with_capacity(db.len());
        for item in db.iter() {
            let (key, value) = item.map_err(|e| storage_error(path, e))?;
            entries.push((String::from_utf8_lossy(&key).into_owned(), value.to_vec()));
        }
        Ok(entries)
    }
}

impl RecordStore for SledStore {
    fn put(&mut self, key: &str, value: &[u8]) -> DatasetResult<()> {
        self.db
            .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(value))
            .map_err(|e| storage_error(&self.path, e))?
            .map_err(|_| DatasetError::DuplicateKey {
                key: key.to_string(),
            })
    }

    fn finish(&mut self) -> DatasetResult<()> {
        self.db
            .flush()
            .map_err(|e| storage_error(&self.path, e))?;
        Ok(())
    }
}

fn storage_error(path: &Path, source: sled::Error) -> DatasetError {
    DatasetError::Storage {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_zero_padded_hex() {
        assert_eq!(record_key(0), "0000000000000000");
        assert_eq!(record_key(255), "00000000000000ff");
        assert_eq!(record_key(u64::MAX), "ffffffffffffffff");
        assert!(record_key(9) < record_key(10));
        assert!(record_key(0xff) < record_key(0x100));
    }

    #[test]
    fn memory_store_rejects_duplicate_keys() {
        let mut store = MemoryStore::new();
        store.put(&record_key(0), b"a").unwrap();
        let err = store.put(&record_key(0), b"b").unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateKey { .. }));
        assert_eq!(store.entries()[&record_key(0)], b"a".to_vec());
    }

    #[test]
    fn sled_store_rejects_duplicate_keys_without_overwriting() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("train");
        {
            let mut store = SledStore::create(&path).unwrap();
            store.put(&record_key(0), b"a").unwrap();
            let err = store.put(&record_key(0), b"b").unwrap_err();
            assert!(matches!(err, DatasetError::DuplicateKey { .. }));
            store.put(&record_key(1), b"c").unwrap();
            store.finish().unwrap();
        }
        assert_eq!(
            SledStore::read_all(&path).unwrap(),
            vec![(record_key(0), b"a".to_vec()), (record_key(1), b"c".to_vec())]
        );
    }

    #[test]
    fn sled_store_refuses_existing_path_and_keeps_data() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("train");
        {
            let mut store = SledStore::create(&path).unwrap();
            store.put(&record_key(0), b"first").unwrap();
            store.put(&record_key(1), b"second").unwrap();
            store.finish().unwrap();
        }
        let err = SledStore::create(&path).err().unwrap();
        assert!(matches!(err, DatasetError::StorageInit { .. }));

        let entries = SledStore::read_all(&path).unwrap();
        assert_eq!(
            entries,
            vec![
                (record_key(0), b"first".to_vec()),
                (record_key(1), b"second".to_vec()),
            ]
        );
    }
}
