use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::ConfigField;
use crate::error::StoreError;

/// Entry kinds kept per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEntry {
    Config(ConfigField),
    Value,
}

impl StoreEntry {
    fn prefix(&self) -> &'static str {
        match self {
            StoreEntry::Config(ConfigField::Min) => "ch_min",
            StoreEntry::Config(ConfigField::Max) => "ch_max",
            StoreEntry::Config(ConfigField::Hysteresis) => "ch_hyst",
            StoreEntry::Value => "ch_val",
        }
    }
}

/// Store key of `entry` for `channel`, e.g. `ch_min3`.
pub fn key(entry: StoreEntry, channel: usize) -> String {
    format!("{}{}", entry.prefix(), channel)
}

/// Durable integer key/value store.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<i32>, StoreError>;

    fn set(&self, key: &str, value: i32) -> Result<(), StoreError>;

    /// Writes all entries as one update. Stores that cannot do better
    /// write them one by one.
    fn set_many(&self, entries: &[(String, i32)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, *value)?;
        }
        Ok(())
    }
}

/// Store kept as a JSON object in a single file.
///
/// Every update rewrites the file through a temporary sibling and a rename,
/// so the file on disk always holds a complete set of entries.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, i32>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(Some(entries)) => {
                info!(path = %path.display(), count = entries.len(), "Loaded store");
                entries
            }
            Ok(None) => {
                info!(path = %path.display(), "No store file yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Store file unreadable, starting empty");
                BTreeMap::new()
            }
        };

        JsonFileStore {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn read_entries(path: &Path) -> Result<Option<BTreeMap<String, i32>>, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write_entries(&self, entries: &BTreeMap<String, i32>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<i32>, StoreError> {
        Ok(self.entries.lock().get(key).copied())
    }

    fn set(&self, key: &str, value: i32) -> Result<(), StoreError> {
        self.set_many(&[(key.to_string(), value)])
    }

    fn set_many(&self, updates: &[(String, i32)]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        for (key, value) in updates {
            next.insert(key.clone(), *value);
        }
        if next == *entries {
            return Ok(());
        }
        self.write_entries(&next)?;
        *entries = next;
        Ok(())
    }
}
