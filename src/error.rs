use std::io;

use thiserror::Error;

use crate::config::ConfigField;

/// Errors returned by the configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid channel {index} (valid: 0..{count})")]
    InvalidChannel { index: usize, count: usize },
    #[error("invalid {field} value {value} (valid: {min}..={max})")]
    OutOfRange {
        field: ConfigField,
        value: i32,
        min: i32,
        max: i32,
    },
    #[error("invalid channel count {count} (valid: 1..={max})")]
    InvalidChannelCount { count: usize, max: usize },
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Errors raised by a [`ConfigStore`](crate::store::ConfigStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("store encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AdcError {
    #[error("converter has no input {0}")]
    InvalidChannel(usize),
    #[error("spi transfer failed: {0}")]
    Spi(#[from] rppal::spi::Error),
}
