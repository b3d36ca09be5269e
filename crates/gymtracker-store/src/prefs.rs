//! Device-local key-value preferences.
//!
//! A [`PreferenceStore`] is a small namespaced map of JSON values that
//! outlives the process. It backs the login session and lives outside the
//! SQLite database.
//!
//! Two implementations are provided:
//!
//! - [`FilePreferences`]: one JSON file per namespace, rewritten on commit.
//! - [`MemoryPreferences`]: a process-local map, for tests and throwaway runs.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

type PrefMap = BTreeMap<String, Value>;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Persistent, namespaced key-value storage with get / set / clear semantics.
///
/// The typed getters mirror the usual preference APIs: a missing key, or a
/// value of the wrong type, yields the caller's default.
pub trait PreferenceStore: Send + Sync {
    /// Read a raw value, `None` if the key is unset.
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Write several keys as one commit.
    fn commit(&self, values: Vec<(&str, Value)>) -> StoreResult<()>;

    /// Remove every key in the namespace.
    fn clear(&self) -> StoreResult<()>;

    /// Write a single key.
    fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        self.commit(vec![(key, value)])
    }

    fn get_i64(&self, key: &str, default: i64) -> StoreResult<i64> {
        Ok(self.get(key)?.and_then(|v| v.as_i64()).unwrap_or(default))
    }

    fn get_bool(&self, key: &str, default: bool) -> StoreResult<bool> {
        Ok(self.get(key)?.and_then(|v| v.as_bool()).unwrap_or(default))
    }

    fn get_string(&self, key: &str, default: &str) -> StoreResult<String> {
        Ok(self
            .get(key)?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| default.to_string()))
    }
}

fn lock(map: &Mutex<PrefMap>) -> StoreResult<MutexGuard<'_, PrefMap>> {
    map.lock()
        .map_err(|e| StoreError::Lock(format!("preferences mutex poisoned: {e}")))
}

// ---------------------------------------------------------------------------
// File-backed preferences
// ---------------------------------------------------------------------------

/// Preferences persisted as `<dir>/<namespace>.json`.
///
/// The whole map is cached in memory and the file is rewritten (via a
/// temporary file and rename) on every commit.
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<PrefMap>,
}

impl FilePreferences {
    /// Open the namespace stored under `dir`, loading any existing values.
    ///
    /// A missing file is an empty namespace. An unreadable or corrupt file
    /// is logged and treated as empty.
    pub fn open(dir: impl AsRef<Path>, namespace: &str) -> StoreResult<Self> {
        validate_namespace(namespace)?;
        let path = dir.as_ref().join(format!("{namespace}.json"));

        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<PrefMap>(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt preferences file, starting empty");
                    PrefMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PrefMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        debug!(path = %path.display(), keys = values.len(), "preferences loaded");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &PrefMap) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        match std::fs::remove_file(&tmp) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }

        let mut file = create_private(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(values)?)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(lock(&self.values)?.get(key).cloned())
    }

    fn commit(&self, values: Vec<(&str, Value)>) -> StoreResult<()> {
        let mut map = lock(&self.values)?;
        let mut next = map.clone();
        for (key, value) in values {
            next.insert(key.to_string(), value);
        }
        self.persist(&next)?;
        *map = next;
        debug!(path = %self.path.display(), "preferences committed");
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut map = lock(&self.values)?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }
        map.clear();
        debug!(path = %self.path.display(), "preferences cleared");
        Ok(())
    }
}

/// Create a new file readable and writable by the owner only.
///
/// The mode is set at creation, so the contents are never exposed under
/// the process umask.
fn create_private(path: &Path) -> std::io::Result<std::fs::File> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// Namespaces become file names, so keep them to a safe character set.
fn validate_namespace(namespace: &str) -> StoreResult<()> {
    let valid = !namespace.is_empty()
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidArgument(format!(
            "invalid preferences namespace: {namespace:?}"
        )))
    }
}

// ---------------------------------------------------------------------------
// In-memory preferences
// ---------------------------------------------------------------------------

/// Preferences that live only as long as the value.
#[derive(Default)]
pub struct MemoryPreferences {
    values: Mutex<PrefMap>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(lock(&self.values)?.get(key).cloned())
    }

    fn commit(&self, values: Vec<(&str, Value)>) -> StoreResult<()> {
        let mut map = lock(&self.values)?;
        for (key, value) in values {
            map.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        lock(&self.values)?.clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
