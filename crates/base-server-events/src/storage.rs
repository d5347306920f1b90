//! Storage backends for persisted units.
//!
//! [`UnitStorage`] is the seam between the event store and wherever units
//! actually live. Two implementations ship with the crate:
//!
//! - [`FsStorage`] -- one file per unit inside a directory, created on
//!   first write. Units are staged aside and hard-linked into place, so a
//!   unit is either absent or complete and is never replaced.
//! - [`MemoryStorage`] -- a sorted map, used by tests and ephemeral runs.
//!
//! Backends deal in raw bytes; encoding and decoding events is the store's
//! job, so a backend can hold a corrupt unit and the store will skip it.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::error::StorageError;
use crate::key::{UNIT_EXTENSION, UnitKey};

/// Extension of in-progress unit files.
const STAGING_EXTENSION: &str = "tmp";

/// A keyed collection of immutable units.
///
/// Implementations must be safe to call from many request handlers at
/// once. No ordering is promised between a `list_units` call and a
/// concurrent `write_unit`.
pub trait UnitStorage: Send + Sync {
    /// Persist a new unit. Must fail with [`StorageError::AlreadyExists`]
    /// rather than replace an existing unit under the same key.
    fn write_unit(&self, key: &UnitKey, contents: &[u8]) -> Result<(), StorageError>;

    /// List every unit key currently present, in no particular order.
    ///
    /// An absent storage area is an empty list, not an error.
    fn list_units(&self) -> Result<Vec<UnitKey>, StorageError>;

    /// Read the raw contents of one unit.
    fn read_unit(&self, key: &UnitKey) -> Result<Vec<u8>, StorageError>;
}

/// Directory-backed storage: `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FsStorage {
    dir: PathBuf,
}

impl FsStorage {
    /// Create a backend rooted at `dir`. The directory is not touched
    /// until the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The storage area this backend writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn unit_path(&self, key: &UnitKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Hidden sibling a unit is written to before it is linked into place.
    /// Its extension keeps it out of [`UnitStorage::list_units`].
    fn staging_path(&self, key: &UnitKey) -> PathBuf {
        self.dir.join(format!(".{}.{STAGING_EXTENSION}", key.file_name()))
    }
}

impl UnitStorage for FsStorage {
    fn write_unit(&self, key: &UnitKey, contents: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.unit_path(key);
        if path.exists() {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }

        // Write aside, then link into place so a unit never appears partial.
        let staging = self.staging_path(key);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&staging) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(key.to_string()));
            }
            Err(e) => return Err(StorageError::Io(e)),
        };
        let written = file.write_all(contents).and_then(|()| file.sync_all());
        drop(file);

        let linked = written.and_then(|()| fs::hard_link(&staging, &path));
        if let Err(e) = fs::remove_file(&staging) {
            debug!(path = %staging.display(), error = %e, "failed to remove staging file");
        }
        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn list_units(&self) -> Result<Vec<UnitKey>, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(UNIT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(UnitKey::from_raw(stem));
            }
        }
        Ok(keys)
    }

    fn read_unit(&self, key: &UnitKey) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.unit_path(key)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// In-memory storage keyed by [`UnitKey`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    units: RwLock<BTreeMap<UnitKey, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units held.
    pub fn len(&self) -> usize {
        self.units.read().map_or(0, |units| units.len())
    }

    /// Whether no units are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UnitStorage for MemoryStorage {
    fn write_unit(&self, key: &UnitKey, contents: &[u8]) -> Result<(), StorageError> {
        let mut units = self.units.write().map_err(|_poisoned| StorageError::Poisoned)?;
        if units.contains_key(key) {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }
        units.insert(key.clone(), contents.to_vec());
        Ok(())
    }

    fn list_units(&self) -> Result<Vec<UnitKey>, StorageError> {
        let units = self.units.read().map_err(|_poisoned| StorageError::Poisoned)?;
        Ok(units.keys().cloned().collect())
    }

    fn read_unit(&self, key: &UnitKey) -> Result<Vec<u8>, StorageError> {
        let units = self.units.read().map_err(|_poisoned| StorageError::Poisoned)?;
        units
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_refuses_to_overwrite() {
        let storage = MemoryStorage::new();
        let key = UnitKey::from_raw("1700000000.000001-000001");

        assert!(storage.write_unit(&key, b"{}").is_ok());
        let second = storage.write_unit(&key, b"{\"other\":1}");
        assert!(matches!(second, Err(StorageError::AlreadyExists(_))));
        assert_eq!(storage.read_unit(&key).ok().as_deref(), Some(&b"{}"[..]));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn memory_storage_missing_unit() {
        let storage = MemoryStorage::new();
        let result = storage.read_unit(&UnitKey::from_raw("nope"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(storage.is_empty());
    }

    #[test]
    fn fs_storage_absent_directory_lists_nothing() {
        let root = tempfile::tempdir().ok();
        let Some(root) = root else { return };
        let storage = FsStorage::new(root.path().join("never").join("created"));

        let keys = storage.list_units();
        assert!(matches!(keys.as_deref(), Ok([])));
        assert!(!storage.dir().exists());
    }

    #[test]
    fn fs_storage_creates_directory_and_ignores_foreign_files() {
        let root = tempfile::tempdir().ok();
        let Some(root) = root else { return };
        let dir = root.path().join("storage").join("events");
        let storage = FsStorage::new(&dir);
        let key = UnitKey::from_raw("1700000000.000001-000000");

        assert!(storage.write_unit(&key, b"{}").is_ok());
        assert!(dir.join("1700000000.000001-000000.json").is_file());

        fs::write(dir.join("notes.txt"), "not a unit").ok();
        let keys = storage.list_units().unwrap_or_default();
        assert_eq!(keys, vec![key.clone()]);

        let again = storage.write_unit(&key, b"{}");
        assert!(matches!(again, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn fs_storage_leaves_only_complete_units() {
        let root = tempfile::tempdir().ok();
        let Some(root) = root else { return };
        let storage = FsStorage::new(root.path());
        let stalled = UnitKey::from_raw("1700000000.000001-000000");
        let fresh = UnitKey::from_raw("1700000000.000001-000001");

        // A write that died half way leaves only its staging file behind.
        fs::write(storage.staging_path(&stalled), b"{\"route\":").ok();
        assert_eq!(storage.list_units().unwrap_or_default(), Vec::<UnitKey>::new());
        let blocked = storage.write_unit(&stalled, b"{}");
        assert!(matches!(blocked, Err(StorageError::AlreadyExists(_))));
        assert!(!root.path().join(stalled.file_name()).exists());

        assert!(storage.write_unit(&fresh, b"{\"ok\":true}").is_ok());
        assert_eq!(storage.list_units().unwrap_or_default(), vec![fresh.clone()]);
        assert_eq!(
            storage.read_unit(&fresh).ok().as_deref(),
            Some(&b"{\"ok\":true}"[..])
        );
        assert!(!storage.staging_path(&fresh).exists());
    }
}
