// Cache store for reading and writing cached resources.
// Handles JSON serialization, read-time TTL checking, and filesystem operations.
// Caching is best-effort: every failure mode degrades to "absent" so callers
// fall through to the network path.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::paths;

/// Cache key for the course map resource.
pub const COURSES_KEY: &str = "courses";
/// Cache key for the to-do list resource.
pub const TODO_KEY: &str = "todo";

/// Wrapper for a cached payload with its write timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// When the payload was written.
    pub written_at: DateTime<Utc>,
    /// The cached payload.
    pub payload: T,
}

impl<T> CacheEntry<T> {
    pub fn new(payload: T) -> Self {
        Self {
            written_at: Utc::now(),
            payload,
        }
    }

    /// Check whether this entry is still fresh for the given max age.
    /// Staleness is evaluated against the clock at read time.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        let elapsed = Utc::now()
            .signed_duration_since(self.written_at)
            .to_std()
            .unwrap_or(Duration::MAX);
        elapsed <= max_age
    }
}

/// Keyed resource cache backed by one JSON file per key.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open a store rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open a store at the default project cache directory, if resolvable.
    pub fn at_default_location() -> Option<Self> {
        paths::cache_dir().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        paths::resource_path(&self.dir, key)
    }

    /// Store a value under `key`, stamped with the current time.
    /// Overwrites any prior entry. Persistence failures are swallowed;
    /// the cache must never block the read path.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(err) = self.write_entry(key, value) {
            tracing::debug!(key, %err, "cache write failed, skipping");
        }
    }

    fn write_entry<T: Serialize>(&self, key: &str, value: &T) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let entry = CacheEntry::new(value);
        let json = serde_json::to_string_pretty(&entry).map_err(std::io::Error::other)?;

        // Write atomically via temp file
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Read the payload under `key` if an entry exists and was written no
    /// more than `max_age` ago. Missing files, unreadable JSON, and stale
    /// entries all return `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, max_age: Duration) -> Option<T> {
        let entry = self.read_entry::<T>(key)?;
        if entry.is_fresh(max_age) {
            Some(entry.payload)
        } else {
            None
        }
    }

    fn read_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let path = self.path_for(key);
        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// When the entry under `key` was written, regardless of freshness.
    pub fn written_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.read_entry::<serde_json::Value>(key)
            .map(|entry| entry.written_at)
    }

    /// Remove the entry under `key`. Missing entries are fine.
    pub fn delete(&self, key: &str) {
        let path = self.path_for(key);
        if path.exists() {
            if let Err(err) = fs::remove_file(&path) {
                tracing::debug!(key, %err, "cache delete failed, skipping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn sample() -> TestData {
        TestData {
            name: "algebra".to_string(),
            value: 42,
        }
    }

    /// Rewrite an entry's timestamp so freshness checks see an old write.
    fn backdate(store: &CacheStore, key: &str, age: chrono::Duration) {
        let path = paths::resource_path(store.dir(), key);
        let contents = fs::read_to_string(&path).unwrap();
        let mut entry: CacheEntry<TestData> = serde_json::from_str(&contents).unwrap();
        entry.written_at = Utc::now() - age;
        fs::write(&path, serde_json::to_string(&entry).unwrap()).unwrap();
    }

    #[test]
    fn test_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.set("todo", &sample());
        let read: Option<TestData> = store.get("todo", Duration::MAX);
        assert_eq!(read, Some(sample()));
    }

    #[test]
    fn test_fresh_entry_is_served() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.set("todo", &sample());
        backdate(&store, "todo", chrono::Duration::milliseconds(4_500));

        let read: Option<TestData> = store.get("todo", Duration::from_millis(5_000));
        assert_eq!(read, Some(sample()));
    }

    #[test]
    fn test_stale_entry_is_absent() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.set("todo", &sample());
        backdate(&store, "todo", chrono::Duration::milliseconds(5_001));

        let read: Option<TestData> = store.get("todo", Duration::from_millis(5_000));
        assert_eq!(read, None);
    }

    #[test]
    fn test_delete_makes_entry_absent() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.set("courses", &sample());
        store.delete("courses");

        let read: Option<TestData> = store.get("courses", Duration::MAX);
        assert_eq!(read, None);

        // Deleting again is a no-op
        store.delete("courses");
    }

    #[test]
    fn test_overwrite_replaces_entry() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.set("todo", &sample());
        let updated = TestData {
            name: "geometry".to_string(),
            value: 7,
        };
        store.set("todo", &updated);

        let read: Option<TestData> = store.get("todo", Duration::MAX);
        assert_eq!(read, Some(updated));
    }

    #[test]
    fn test_corrupt_entry_is_absent() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        fs::write(paths::resource_path(store.dir(), "todo"), "not json").unwrap();

        let read: Option<TestData> = store.get("todo", Duration::MAX);
        assert_eq!(read, None);
    }

    #[test]
    fn test_written_at_ignores_freshness() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        assert!(store.written_at("todo").is_none());
        store.set("todo", &sample());
        backdate(&store, "todo", chrono::Duration::hours(48));
        assert!(store.written_at("todo").is_some());
    }
}
