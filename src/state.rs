use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::{ADC_MAX, ChannelConfig};

/// Divisor of the running average.
pub const SMOOTHING: i32 = 10;

/// Sampling pipeline state of one channel, owned by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleState {
    pub raw: i32,
    pub average: i32,
    pub filtered: i32,
    pub scaled: i32,
    pub last_persisted: i32,
}

impl SampleState {
    /// Runs one sample through smoothing, the hysteresis band and scaling.
    pub fn advance(&mut self, raw: u16, config: &ChannelConfig) -> i32 {
        self.raw = i32::from(raw).clamp(0, ADC_MAX);
        self.average = self.average - self.average / SMOOTHING + self.raw / SMOOTHING;

        if self.average > self.filtered + config.hysteresis
            || self.average < self.filtered - config.hysteresis
        {
            self.filtered = self.average;
        }

        self.scaled = config.scale(self.filtered);
        self.scaled
    }

    /// Returns the scaled value if it differs from the last one handed out
    /// for persistence, and marks it as handed out.
    pub fn take_unpersisted(&mut self) -> Option<i32> {
        if self.scaled != self.last_persisted {
            self.last_persisted = self.scaled;
            Some(self.scaled)
        } else {
            None
        }
    }

    pub fn normalized(&self) -> f32 {
        self.filtered as f32 / ADC_MAX as f32
    }
}

/// Read-only diagnostic view of a channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelSnapshot {
    pub channel: usize,
    pub raw: i32,
    pub average: i32,
    pub filtered: i32,
    pub scaled: i32,
    pub config: ChannelConfig,
    pub taken_at: DateTime<Local>,
}

impl ChannelSnapshot {
    pub fn new(channel: usize, state: &SampleState, config: ChannelConfig) -> Self {
        ChannelSnapshot {
            channel,
            raw: state.raw,
            average: state.average,
            filtered: state.filtered,
            scaled: state.scaled,
            config,
            taken_at: Local::now(),
        }
    }
}
