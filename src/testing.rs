//! In-memory collaborators for deterministic tests.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::adc::{ADC_INPUTS, SampleSource};
use crate::error::{AdcError, StoreError};
use crate::store::ConfigStore;

/// Store that records every write and can be switched into failure.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, i32>>,
    writes: Mutex<Vec<(String, i32)>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryStore::default())
    }

    pub fn with_entries(entries: &[(&str, i32)]) -> Arc<Self> {
        let store = MemoryStore::default();
        {
            let mut map = store.entries.lock();
            for (key, value) in entries {
                map.insert(key.to_string(), *value);
            }
        }
        Arc::new(store)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn value(&self, key: &str) -> Option<i32> {
        self.entries.lock().get(key).copied()
    }

    pub fn writes(&self) -> Vec<(String, i32)> {
        self.writes.lock().clone()
    }

    pub fn writes_to(&self, key: &str) -> Vec<i32> {
        self.writes
            .lock()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| *v)
            .collect()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(io::Error::other("memory store switched off").into())
        } else {
            Ok(())
        }
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<i32>, StoreError> {
        self.check()?;
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: i32) -> Result<(), StoreError> {
        self.check()?;
        self.entries.lock().insert(key.to_string(), value);
        self.writes.lock().push((key.to_string(), value));
        Ok(())
    }
}

/// Sample source whose readings are set from the test. Every input reads
/// zero until set.
#[derive(Clone)]
pub struct ScriptedSource {
    readings: Arc<Mutex<[Option<u16>; ADC_INPUTS]>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        ScriptedSource {
            readings: Arc::new(Mutex::new([Some(0); ADC_INPUTS])),
        }
    }

    pub fn set(&self, channel: usize, raw: u16) {
        self.readings.lock()[channel] = Some(raw);
    }

    /// Makes reads of `channel` fail until it is set again.
    pub fn fail(&self, channel: usize) {
        self.readings.lock()[channel] = None;
    }
}

impl SampleSource for ScriptedSource {
    fn read_raw(&mut self, channel: usize) -> Result<u16, AdcError> {
        self.readings
            .lock()
            .get(channel)
            .copied()
            .flatten()
            .ok_or(AdcError::InvalidChannel(channel))
    }
}
