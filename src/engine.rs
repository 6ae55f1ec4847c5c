use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::adc::SampleSource;
use crate::channel::{Channel, ChannelBank};
use crate::store::{ConfigStore, StoreEntry, key};

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(200);

/// Periodic sampler: reads every channel, runs the filter pipeline and
/// writes changed outputs through to the store.
pub struct Engine<S> {
    bank: Arc<ChannelBank>,
    store: Arc<dyn ConfigStore>,
    source: S,
    period: Duration,
}

impl<S: SampleSource> Engine<S> {
    pub fn new(
        bank: Arc<ChannelBank>,
        store: Arc<dyn ConfigStore>,
        source: S,
        period: Duration,
    ) -> Self {
        Engine {
            bank,
            store,
            source,
            period,
        }
    }

    /// Runs for the lifetime of the process.
    pub fn run(mut self) {
        info!(
            channels = self.bank.len(),
            period_ms = self.period.as_millis() as u64,
            "ADC engine started"
        );
        loop {
            self.tick();
            thread::sleep(self.period);
        }
    }

    /// One pass over all channels in index order.
    pub fn tick(&mut self) {
        for channel in self.bank.iter() {
            let raw = match self.source.read_raw(channel.index()) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(channel = channel.index(), error = %e, "Sample read failed, channel skipped");
                    continue;
                }
            };

            if let Some(scaled) = sample_channel(channel, raw) {
                persist_value(self.store.as_ref(), channel.index(), scaled);
            }
        }
    }
}

/// Advances the channel's pipeline; returns the scaled value when it
/// needs to be written out.
fn sample_channel(channel: &Channel, raw: u16) -> Option<i32> {
    let mut state = channel.lock_state();
    let config = channel.config();
    state.advance(raw, &config);
    state.take_unpersisted()
}

// A failed write is not retried until the value changes again.
fn persist_value(store: &dyn ConfigStore, channel: usize, scaled: i32) {
    match store.set(&key(StoreEntry::Value, channel), scaled) {
        Ok(()) => debug!(channel, scaled, "Persisted channel value"),
        Err(e) => warn!(channel, scaled, error = %e, "Failed to persist channel value"),
    }
}
