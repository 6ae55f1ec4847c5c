use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rppal::spi::{Bus, SlaveSelect};

use crate::adc::ADC_INPUTS;
use crate::engine::DEFAULT_PERIOD;

#[derive(Debug, Parser, Clone)]
#[command(name = "adc-monitor")]
#[command(about = "Samples, filters and rescales ADC channels with persisted per-channel settings")]
pub struct Cli {
    /// JSON file holding channel settings and values.
    #[arg(long, default_value = "adc_store.json")]
    pub store: PathBuf,

    /// Number of channels sampled, starting at converter input 0.
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(1..=ADC_INPUTS as i64))]
    pub channels: u8,

    /// Sampling period in milliseconds.
    #[arg(long, default_value_t = DEFAULT_PERIOD.as_millis() as u64, value_parser = clap::value_parser!(u64).range(1..))]
    pub period_ms: u64,

    /// SPI bus of the converter.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=6))]
    pub spi_bus: u8,

    /// SPI chip select line of the converter.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub slave_select: u8,

    /// SPI clock in Hz.
    #[arg(long, default_value_t = 1_000_000)]
    pub spi_clock: u32,

    /// Serve channel snapshots over WebSocket on this address, e.g. 0.0.0.0:10013.
    #[arg(long)]
    pub status_addr: Option<String>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    pub log: String,
}

impl Cli {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn bus(&self) -> Bus {
        match self.spi_bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            3 => Bus::Spi3,
            4 => Bus::Spi4,
            5 => Bus::Spi5,
            _ => Bus::Spi6,
        }
    }

    pub fn slave_select(&self) -> SlaveSelect {
        match self.slave_select {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            _ => SlaveSelect::Ss2,
        }
    }
}
