mod adc;
mod args;
mod channel;
mod config;
mod console;
mod engine;
mod error;
mod interface;
mod state;
mod store;
mod websocket;

#[cfg(test)]
mod testing;

use std::io;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use adc::AdcReader;
use args::Cli;
use channel::ChannelBank;
use console::Console;
use engine::Engine;
use interface::{ChannelSelection, ConfigInterface};
use store::{ConfigStore, JsonFileStore};

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    info!("Starting ADC channel monitor");

    let store: Arc<dyn ConfigStore> = Arc::new(JsonFileStore::open(&cli.store));
    let bank = Arc::new(ChannelBank::new(usize::from(cli.channels))?);
    let interface = ConfigInterface::new(Arc::clone(&bank), Arc::clone(&store));
    interface.load_from_store(ChannelSelection::All)?;

    let adc_reader = AdcReader::new(cli.bus(), cli.slave_select(), cli.spi_clock)
        .context("opening MCP3208 on SPI")?;
    let engine = Engine::new(Arc::clone(&bank), Arc::clone(&store), adc_reader, cli.period());
    thread::Builder::new()
        .name("adc-engine".to_string())
        .spawn(move || engine.run())
        .context("spawning ADC engine thread")?;

    if let Some(addr) = &cli.status_addr {
        let listener = websocket::bind(addr).with_context(|| format!("binding status server on {}", addr))?;
        let status_interface = interface.clone();
        thread::Builder::new()
            .name("status".to_string())
            .spawn(move || websocket::status_thread(listener, status_interface))
            .context("spawning status thread")?;
    }

    let console = Console::new(interface);
    console.run(io::stdin().lock(), io::stdout()).context("console i/o")?;

    info!("Console closed, exiting");
    Ok(())
}
