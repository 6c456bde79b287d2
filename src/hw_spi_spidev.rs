// src/hw_spi_spidev.rs
use linux_embedded_hal::spidev::{SpiModeFlags, Spidev, SpidevOptions};
use std::io::Write;
use std::path::Path;
use weather_strip_lib::epd7in5_v2::{EpdError, SoftwareSpi};

/// spidev's default `bufsiz`; larger writes are rejected by the kernel.
const SPIDEV_CHUNK: usize = 4096;

/// Kernel SPI device; chip select is toggled by the driver.
pub struct SpidevHwSpi {
    dev: Spidev,
}

impl SpidevHwSpi {
    pub fn open(path: &Path, speed_hz: u32) -> Result<Self, EpdError> {
        let mut dev = Spidev::open(path).map_err(|e| EpdError(e.to_string()))?;

        let opts = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(speed_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&opts).map_err(|e| EpdError(e.to_string()))?;
        Ok(Self { dev })
    }
}

impl SoftwareSpi for SpidevHwSpi {
    fn write_byte(&mut self, data: u8) -> Result<(), EpdError> {
        self.write_bytes(&[data])
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), EpdError> {
        for chunk in data.chunks(SPIDEV_CHUNK) {
            self.dev
                .write_all(chunk)
                .map_err(|e| EpdError(e.to_string()))?;
        }
        Ok(())
    }
}
