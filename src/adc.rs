use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::info;

use crate::error::AdcError;

/// Inputs available on the MCP3208.
pub const ADC_INPUTS: usize = 8;

/// Something that yields one quantized reading per channel.
pub trait SampleSource: Send {
    fn read_raw(&mut self, channel: usize) -> Result<u16, AdcError>;
}

/// MCP3208 12-bit converter on SPI, single-ended inputs.
pub struct AdcReader {
    spi: Spi,
}

impl AdcReader {
    pub fn new(bus: Bus, slave_select: SlaveSelect, clock_hz: u32) -> Result<Self, AdcError> {
        let spi = Spi::new(bus, slave_select, clock_hz, Mode::Mode0)?;
        info!(?bus, ?slave_select, clock_hz, "MCP3208 ADC initialized");
        Ok(AdcReader { spi })
    }
}

/// Command bytes selecting a single-ended conversion on `channel`.
fn request(channel: u8) -> [u8; 3] {
    [0x06 | (channel >> 2), (channel & 0x03) << 6, 0x00]
}

fn decode(rx: [u8; 3]) -> u16 {
    (((rx[1] & 0x0F) as u16) << 8) | (rx[2] as u16)
}

impl SampleSource for AdcReader {
    fn read_raw(&mut self, channel: usize) -> Result<u16, AdcError> {
        if channel >= ADC_INPUTS {
            return Err(AdcError::InvalidChannel(channel));
        }

        let tx_buffer = request(channel as u8);
        let mut rx_buffer = [0u8; 3];
        self.spi.transfer(&mut rx_buffer, &tx_buffer)?;

        Ok(decode(rx_buffer))
    }
}
