use parking_lot::{Mutex, MutexGuard};

use crate::adc::ADC_INPUTS;
use crate::config::ChannelConfig;
use crate::error::ConfigError;
use crate::state::{ChannelSnapshot, SampleState};

/// One analog input with its configuration and pipeline state.
///
/// The configuration triple and the sampling state sit behind separate
/// locks: the engine holds `state` for a tick and only copies `config`,
/// writers replace `config` as a whole between ticks. `writer` orders
/// configuration writers of this channel, including their store writes.
pub struct Channel {
    index: usize,
    config: Mutex<ChannelConfig>,
    state: Mutex<SampleState>,
    writer: Mutex<()>,
}

impl Channel {
    fn new(index: usize) -> Self {
        Channel {
            index,
            config: Mutex::new(ChannelConfig::default()),
            state: Mutex::new(SampleState::default()),
            writer: Mutex::new(()),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn config(&self) -> ChannelConfig {
        *self.config.lock()
    }

    /// Installs a new triple, returning the previous one. Waits for a
    /// running tick so a tick never mixes two configurations.
    pub fn replace_config(&self, config: ChannelConfig) -> ChannelConfig {
        let _state = self.state.lock();
        std::mem::replace(&mut *self.config.lock(), config)
    }

    pub fn state(&self) -> SampleState {
        *self.state.lock()
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SampleState> {
        self.state.lock()
    }

    pub(crate) fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock()
    }

    /// State and configuration as of the same tick.
    pub fn snapshot(&self) -> ChannelSnapshot {
        let state = self.state.lock();
        let config = self.config();
        ChannelSnapshot::new(self.index, &state, config)
    }
}

/// Fixed set of channels, sized once at startup.
pub struct ChannelBank {
    channels: Vec<Channel>,
}

impl ChannelBank {
    pub fn new(count: usize) -> Result<Self, ConfigError> {
        if count == 0 || count > ADC_INPUTS {
            return Err(ConfigError::InvalidChannelCount {
                count,
                max: ADC_INPUTS,
            });
        }
        Ok(ChannelBank {
            channels: (0..count).map(Channel::new).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn valid(&self, index: usize) -> bool {
        index < self.channels.len()
    }

    pub fn get(&self, index: usize) -> Result<&Channel, ConfigError> {
        if !self.valid(index) {
            return Err(ConfigError::InvalidChannel {
                index,
                count: self.channels.len(),
            });
        }
        Ok(&self.channels[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }
}
