use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Full scale of the 12-bit converter.
pub const ADC_MAX: i32 = 4095;
pub const HYSTERESIS_MAX: i32 = 500;

pub const DEFAULT_LOWER_BOUND: i32 = 0;
pub const DEFAULT_UPPER_BOUND: i32 = ADC_MAX;
pub const DEFAULT_HYSTERESIS: i32 = 10;

/// Output range and noise band of one channel.
///
/// Always handled as a whole: readers copy the triple, writers replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub lower_bound: i32,
    pub upper_bound: i32,
    pub hysteresis: i32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            lower_bound: DEFAULT_LOWER_BOUND,
            upper_bound: DEFAULT_UPPER_BOUND,
            hysteresis: DEFAULT_HYSTERESIS,
        }
    }
}

impl ChannelConfig {
    /// Maps a raw-domain value in `[0, ADC_MAX]` onto `[lower_bound, upper_bound]`.
    pub fn scale(&self, filtered: i32) -> i32 {
        if self.upper_bound > self.lower_bound {
            self.lower_bound + (filtered * (self.upper_bound - self.lower_bound)) / ADC_MAX
        } else {
            self.lower_bound
        }
    }

    /// Returns the config with its bounds in ascending order.
    pub fn with_ordered_bounds(self) -> Self {
        if self.lower_bound > self.upper_bound {
            ChannelConfig {
                lower_bound: self.upper_bound,
                upper_bound: self.lower_bound,
                hysteresis: self.hysteresis,
            }
        } else {
            self
        }
    }

    pub fn get(&self, field: ConfigField) -> i32 {
        match field {
            ConfigField::Min => self.lower_bound,
            ConfigField::Max => self.upper_bound,
            ConfigField::Hysteresis => self.hysteresis,
        }
    }

    pub fn set(&mut self, field: ConfigField, value: i32) {
        match field {
            ConfigField::Min => self.lower_bound = value,
            ConfigField::Max => self.upper_bound = value,
            ConfigField::Hysteresis => self.hysteresis = value,
        }
    }
}

/// One configurable attribute of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigField {
    Min,
    Max,
    Hysteresis,
}

impl ConfigField {
    pub const ALL: [ConfigField; 3] = [ConfigField::Min, ConfigField::Max, ConfigField::Hysteresis];

    /// Accepted values, inclusive.
    pub fn range(&self) -> (i32, i32) {
        match self {
            Self::Min | Self::Max => (0, ADC_MAX),
            Self::Hysteresis => (0, HYSTERESIS_MAX),
        }
    }

    pub fn default_value(&self) -> i32 {
        ChannelConfig::default().get(*self)
    }

    pub fn validate(&self, value: i32) -> Result<i32, ConfigError> {
        let (min, max) = self.range();
        if (min..=max).contains(&value) {
            Ok(value)
        } else {
            Err(ConfigError::OutOfRange {
                field: *self,
                value,
                min,
                max,
            })
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Hysteresis => "hyst",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
