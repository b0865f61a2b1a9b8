// Local done/snooze bookkeeping.
// These are capability interfaces the pipeline consults, not server
// state: the LMS is never written back to. Keyed by the stable item key.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::paths;

/// Read/write access to the local "done" flags.
pub trait DoneStore {
    fn is_done(&self, key: &str) -> bool;
    fn set_done(&mut self, key: &str, done: bool);
}

/// Read/write access to the local snooze timestamps.
pub trait SnoozeStore {
    fn snoozed_until(&self, key: &str) -> Option<DateTime<Utc>>;
    fn set_snooze(&mut self, key: &str, until: Option<DateTime<Utc>>);
}

/// In-memory marks, used in tests and as a default substitute.
#[derive(Debug, Clone, Default)]
pub struct MemoryMarks {
    done: BTreeSet<String>,
    snooze: BTreeMap<String, DateTime<Utc>>,
}

impl MemoryMarks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DoneStore for MemoryMarks {
    fn is_done(&self, key: &str) -> bool {
        self.done.contains(key)
    }

    fn set_done(&mut self, key: &str, done: bool) {
        if done {
            self.done.insert(key.to_string());
        } else {
            self.done.remove(key);
        }
    }
}

impl SnoozeStore for MemoryMarks {
    fn snoozed_until(&self, key: &str) -> Option<DateTime<Utc>> {
        self.snooze.get(key).copied()
    }

    fn set_snooze(&mut self, key: &str, until: Option<DateTime<Utc>>) {
        match until {
            Some(ts) => {
                self.snooze.insert(key.to_string(), ts);
            }
            None => {
                self.snooze.remove(key);
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MarksRecord {
    #[serde(default)]
    done: BTreeSet<String>,
    #[serde(default)]
    snooze: BTreeMap<String, DateTime<Utc>>,
}

/// Marks persisted to a JSON file next to the cache. Writes are
/// best-effort; an unreadable file starts over empty.
#[derive(Debug, Clone)]
pub struct FileMarks {
    path: PathBuf,
    record: MarksRecord,
}

impl FileMarks {
    pub fn load(dir: &Path) -> Self {
        let path = paths::marks_path(dir);
        let record = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default();
        Self { path, record }
    }

    fn persist(&self) {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(&self.record).map_err(std::io::Error::other)?;

            // Write atomically via temp file
            let temp_path = self.path.with_extension("tmp");
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)?;
            Ok(())
        };
        if let Err(err) = write() {
            tracing::debug!(%err, "marks write failed, skipping");
        }
    }
}

impl DoneStore for FileMarks {
    fn is_done(&self, key: &str) -> bool {
        self.record.done.contains(key)
    }

    fn set_done(&mut self, key: &str, done: bool) {
        if done {
            self.record.done.insert(key.to_string());
        } else {
            self.record.done.remove(key);
        }
        self.persist();
    }
}

impl SnoozeStore for FileMarks {
    fn snoozed_until(&self, key: &str) -> Option<DateTime<Utc>> {
        self.record.snooze.get(key).copied()
    }

    fn set_snooze(&mut self, key: &str, until: Option<DateTime<Utc>>) {
        match until {
            Some(ts) => {
                self.record.snooze.insert(key.to_string(), ts);
            }
            None => {
                self.record.snooze.remove(key);
            }
        }
        self.persist();
    }
}
