use std::sync::Arc;

use tracing::{info, warn};

use crate::channel::{Channel, ChannelBank};
use crate::config::{ChannelConfig, ConfigField};
use crate::error::ConfigError;
use crate::state::ChannelSnapshot;
use crate::store::{ConfigStore, StoreEntry, key};

/// Target of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSelection {
    One(usize),
    All,
}

impl From<Option<usize>> for ChannelSelection {
    fn from(channel: Option<usize>) -> Self {
        channel.map_or(ChannelSelection::All, ChannelSelection::One)
    }
}

/// Operator-facing configuration operations.
///
/// Every call validates its input before touching any state. Calls on the
/// same channel are serialized, including their store writes, so the
/// store never holds a bound pair that was not applied together.
#[derive(Clone)]
pub struct ConfigInterface {
    bank: Arc<ChannelBank>,
    store: Arc<dyn ConfigStore>,
}

impl ConfigInterface {
    pub fn new(bank: Arc<ChannelBank>, store: Arc<dyn ConfigStore>) -> Self {
        ConfigInterface { bank, store }
    }

    fn select(&self, selection: ChannelSelection) -> Result<Vec<&Channel>, ConfigError> {
        match selection {
            ChannelSelection::One(index) => Ok(vec![self.bank.get(index)?]),
            ChannelSelection::All => Ok(self.bank.iter().collect()),
        }
    }

    pub fn get_config(&self, channel: usize) -> Result<ChannelConfig, ConfigError> {
        Ok(self.bank.get(channel)?.config())
    }

    pub fn set_bounds(&self, channel: usize, lower: i32, upper: i32) -> Result<ChannelConfig, ConfigError> {
        let target = self.bank.get(channel)?;
        let lower = ConfigField::Min.validate(lower)?;
        let upper = ConfigField::Max.validate(upper)?;
        self.apply(target, |config| ChannelConfig {
            lower_bound: lower,
            upper_bound: upper,
            ..config
        })
    }

    pub fn set_hysteresis(&self, channel: usize, value: i32) -> Result<ChannelConfig, ConfigError> {
        let target = self.bank.get(channel)?;
        let value = ConfigField::Hysteresis.validate(value)?;
        self.apply(target, |config| ChannelConfig {
            hysteresis: value,
            ..config
        })
    }

    /// Sets a single field. A single bound is paired with the other
    /// current bound and ordered like [`set_bounds`](Self::set_bounds).
    pub fn set_field(&self, channel: usize, field: ConfigField, value: i32) -> Result<ChannelConfig, ConfigError> {
        let target = self.bank.get(channel)?;
        let value = field.validate(value)?;
        self.apply(target, |mut config| {
            config.set(field, value);
            config
        })
    }

    fn apply(
        &self,
        channel: &Channel,
        update: impl FnOnce(ChannelConfig) -> ChannelConfig,
    ) -> Result<ChannelConfig, ConfigError> {
        let _writer = channel.lock_writer();
        let index = channel.index();

        let current = channel.config();
        let requested = update(current);
        let next = requested.with_ordered_bounds();
        if next != requested {
            warn!(
                channel = index,
                min = requested.lower_bound,
                max = requested.upper_bound,
                "min > max, swapping bounds"
            );
        }
        if next == current {
            return Ok(next);
        }

        let mut entries = Vec::with_capacity(3);
        if (current.lower_bound, current.upper_bound) != (next.lower_bound, next.upper_bound) {
            entries.push((key(StoreEntry::Config(ConfigField::Min), index), next.lower_bound));
            entries.push((key(StoreEntry::Config(ConfigField::Max), index), next.upper_bound));
        }
        if current.hysteresis != next.hysteresis {
            entries.push((key(StoreEntry::Config(ConfigField::Hysteresis), index), next.hysteresis));
        }
        // Memory only follows a successful store write.
        self.store.set_many(&entries)?;

        channel.replace_config(next);
        for field in ConfigField::ALL {
            if current.get(field) != next.get(field) {
                info!(channel = index, %field, old = current.get(field), new = next.get(field), "Channel setting changed");
            }
        }

        Ok(next)
    }

    /// Replaces the in-memory configuration with the stored one. Missing,
    /// unreadable or out-of-range entries fall back to their defaults.
    pub fn load_from_store(&self, selection: ChannelSelection) -> Result<Vec<ChannelConfig>, ConfigError> {
        let mut loaded = Vec::new();
        for channel in self.select(selection)? {
            let _writer = channel.lock_writer();
            let index = channel.index();

            let mut config = ChannelConfig::default();
            for field in ConfigField::ALL {
                config.set(field, self.read_field(index, field));
            }

            let ordered = config.with_ordered_bounds();
            if ordered != config {
                warn!(
                    channel = index,
                    min = config.lower_bound,
                    max = config.upper_bound,
                    "Stored min > max, swapping bounds"
                );
            }

            channel.replace_config(ordered);
            info!(
                channel = index,
                min = ordered.lower_bound,
                max = ordered.upper_bound,
                hyst = ordered.hysteresis,
                "Loaded channel settings"
            );
            loaded.push(ordered);
        }
        Ok(loaded)
    }

    fn read_field(&self, channel: usize, field: ConfigField) -> i32 {
        let entry = key(StoreEntry::Config(field), channel);
        match self.store.get(&entry) {
            Ok(Some(value)) => match field.validate(value) {
                Ok(value) => value,
                Err(e) => {
                    warn!(key = %entry, error = %e, "Stored value rejected, using default");
                    field.default_value()
                }
            },
            Ok(None) => field.default_value(),
            Err(e) => {
                warn!(key = %entry, error = %e, "Store read failed, using default");
                field.default_value()
            }
        }
    }

    /// Writes the in-memory configuration of the selected channels.
    pub fn save_to_store(&self, selection: ChannelSelection) -> Result<(), ConfigError> {
        for channel in self.select(selection)? {
            let _writer = channel.lock_writer();
            let index = channel.index();
            let config = channel.config();
            let entries: Vec<(String, i32)> = ConfigField::ALL
                .iter()
                .map(|field| (key(StoreEntry::Config(*field), index), config.get(*field)))
                .collect();
            self.store.set_many(&entries)?;
            info!(channel = index, "Saved channel settings");
        }
        Ok(())
    }

    pub fn snapshot(&self, channel: usize) -> Result<ChannelSnapshot, ConfigError> {
        Ok(self.bank.get(channel)?.snapshot())
    }

    pub fn snapshots(&self, selection: ChannelSelection) -> Result<Vec<ChannelSnapshot>, ConfigError> {
        match selection {
            ChannelSelection::One(index) => Ok(vec![self.snapshot(index)?]),
            ChannelSelection::All => Ok(self.bank.iter().map(Channel::snapshot).collect()),
        }
    }

    /// Latest scaled output of a channel.
    pub fn value(&self, channel: usize) -> Result<i32, ConfigError> {
        Ok(self.bank.get(channel)?.state().scaled)
    }

    /// Filtered reading of a channel as a fraction of full scale.
    pub fn normalized(&self, channel: usize) -> Result<f32, ConfigError> {
        Ok(self.bank.get(channel)?.state().normalized())
    }
}
