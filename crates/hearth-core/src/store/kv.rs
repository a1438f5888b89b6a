//! Key-value persistence for logs, preferences, timer state and catalog
//! overrides.
//!
//! Values are opaque JSON strings. [`FileKvStore`] keeps one file per key:
//!
//! ```text
//! .hearth/data/
//!   logs.v1.json
//!   prefs.v1.json
//!   timer.v1.json
//!   config_override.v1.json
//!   .lock              # advisory lock held around every write
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::lock::StoreLock;

/// Logical keys used by the session.
pub mod keys {
    pub const LOGS: &str = "logs.v1";
    pub const PREFS: &str = "prefs.v1";
    pub const TIMER: &str = "timer.v1";
    pub const CONFIG_OVERRIDE: &str = "config_override.v1";
}

const LOCK_FILE: &str = ".lock";
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw persistent storage: get/set/clear of string values per key.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn clear(&self, key: &str) -> Result<()>;

    /// Read-modify-write of one key. Implementations backed by shared
    /// storage hold their lock for the whole closure.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        let next = apply(self.get(key)?)?;
        self.set(key, &next)
    }
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

/// Decode the value stored under `key`.
///
/// A corrupt value is logged and treated as absent so one bad file never
/// blocks the rest of the app.
pub fn read_json<T: DeserializeOwned>(kv: &dyn KvStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = kv.get(key)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() || raw.trim() == "null" {
        return Ok(None);
    }
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring unreadable stored value");
            Ok(None)
        }
    }
}

pub fn write_json<T: Serialize + ?Sized>(kv: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    kv.set(key, &raw)
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// One JSON file per key under a data directory.
///
/// Writes go through a temp file and an atomic rename while holding an
/// exclusive lock on `<dir>/.lock`.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileKvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn lock(&self) -> Result<StoreLock> {
        Ok(StoreLock::acquire(&self.dir.join(LOCK_FILE), self.lock_timeout)?)
    }

    fn read_unlocked(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_unlocked(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value.as_bytes())?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(key, path = %path.display(), bytes = value.len(), "kv value written");
        Ok(())
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.read_unlocked(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock()?;
        self.write_unlocked(key, value)
    }

    fn clear(&self, key: &str) -> Result<()> {
        let _guard = self.lock()?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        let _guard = self.lock()?;
        let next = apply(self.read_unlocked(key)?)?;
        self.write_unlocked(key, &next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_store_get_set_clear() {
        let kv = MemoryKvStore::new();
        assert_eq!(kv.get("a").expect("get"), None);
        kv.set("a", "1").expect("set");
        assert_eq!(kv.get("a").expect("get").as_deref(), Some("1"));
        kv.clear("a").expect("clear");
        assert_eq!(kv.get("a").expect("get"), None);
    }

    #[test]
    fn file_store_persists_one_file_per_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let kv = FileKvStore::new(dir.path().join("data"));
        write_json(&kv, keys::PREFS, &json!({"route": "week"})).expect("write");

        assert!(kv.path_for(keys::PREFS).exists());
        let reopened = FileKvStore::new(dir.path().join("data"));
        let value: Option<serde_json::Value> = read_json(&reopened, keys::PREFS).expect("read");
        assert_eq!(value, Some(json!({"route": "week"})));

        reopened.clear(keys::PREFS).expect("clear");
        assert!(!kv.path_for(keys::PREFS).exists());
        reopened.clear(keys::PREFS).expect("clearing twice is fine");
    }

    #[test]
    fn corrupt_value_reads_as_absent() {
        let kv = MemoryKvStore::new();
        kv.set(keys::LOGS, "{not json").expect("set");
        let value: Option<Vec<serde_json::Value>> = read_json(&kv, keys::LOGS).expect("read");
        assert_eq!(value, None);
    }

    #[test]
    fn null_value_reads_as_absent() {
        let kv = MemoryKvStore::new();
        kv.set(keys::TIMER, "null").expect("set");
        let value: Option<serde_json::Value> = read_json(&kv, keys::TIMER).expect("read");
        assert_eq!(value, None);
    }

    #[test]
    fn update_sees_previous_value() {
        let dir = tempfile::tempdir().expect("tempdir");
        let kv = FileKvStore::new(dir.path());
        kv.set("n", "1").expect("set");
        kv.update("n", &mut |prev| {
            let n: i32 = prev.as_deref().unwrap_or("0").parse().unwrap_or(0);
            Ok((n + 1).to_string())
        })
        .expect("update");
        assert_eq!(kv.get("n").expect("get").as_deref(), Some("2"));
    }
}
