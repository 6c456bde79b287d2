//! Custom EPD 7.5" V2 (800×480, black/white) Driver
//!
//! Talks to the UC8179 controller through three tiny traits so the same code runs
//! over Linux spidev/GPIO character devices on the Pi and over recording mocks in
//! tests.
//!
//! Frame data uses the [`crate::canvas::Canvas`] layout: packed rows, MSB first,
//! 1 = black. The controller's "new data" register (0x13) takes that directly; the
//! "old data" register (0x10) gets the inverted frame.

use log::{debug, warn};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Display dimensions
pub const EPD_WIDTH: u32 = 800;
pub const EPD_HEIGHT: u32 = 480;

/// Busy polls before giving up (a full refresh takes ~4 s).
const BUSY_MAX_POLLS: u32 = 1500;
const BUSY_POLL_INTERVAL: Duration = Duration::from_millis(20);

// UC8179 commands
const PANEL_SETTING: u8 = 0x00;
const POWER_SETTING: u8 = 0x01;
const POWER_OFF: u8 = 0x02;
const POWER_ON: u8 = 0x04;
const BOOSTER_SOFT_START: u8 = 0x06;
const DEEP_SLEEP: u8 = 0x07;
const DATA_START_OLD: u8 = 0x10;
const DISPLAY_REFRESH: u8 = 0x12;
const DATA_START_NEW: u8 = 0x13;
const DUAL_SPI: u8 = 0x15;
const VCOM_DATA_INTERVAL: u8 = 0x50;
const TCON_SETTING: u8 = 0x60;
const RESOLUTION: u8 = 0x61;
const GET_STATUS: u8 = 0x71;
const CASCADE_SETTING: u8 = 0xE0;
const FORCE_TEMPERATURE: u8 = 0xE5;

/// Hardware error with the underlying cause as text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("EPD error: {0}")]
pub struct EpdError(pub String);

/// Byte-wise SPI write access
pub trait SoftwareSpi {
    fn write_byte(&mut self, data: u8) -> Result<(), EpdError>;

    /// Write a run of bytes; override when the bus supports bulk transfers.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), EpdError> {
        for &byte in data {
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

/// Trait for GPIO pin interface
pub trait GpioPin {
    fn set_high(&mut self) -> Result<(), EpdError>;
    fn set_low(&mut self) -> Result<(), EpdError>;
}

/// Trait for input pin interface
pub trait InputPin {
    fn is_high(&self) -> Result<bool, EpdError>;
}

/// EPD 7.5" V2 display driver
pub struct Epd7in5V2<SPI, CS, DC, RST, BUSY> {
    spi: SPI,
    cs_pin: CS,
    dc_pin: DC,
    rst_pin: RST,
    busy_pin: BUSY,
    width: u32,
    height: u32,
    busy_max_polls: u32,
}

impl<SPI, CS, DC, RST, BUSY> Epd7in5V2<SPI, CS, DC, RST, BUSY>
where
    SPI: SoftwareSpi,
    CS: GpioPin,
    DC: GpioPin,
    RST: GpioPin,
    BUSY: InputPin,
{
    pub fn new(spi: SPI, cs_pin: CS, dc_pin: DC, rst_pin: RST, busy_pin: BUSY) -> Self {
        Self {
            spi,
            cs_pin,
            dc_pin,
            rst_pin,
            busy_pin,
            width: EPD_WIDTH,
            height: EPD_HEIGHT,
            busy_max_polls: BUSY_MAX_POLLS,
        }
    }

    /// Give up waiting for the controller after `polls` status reads.
    pub fn with_busy_limit(mut self, polls: u32) -> Self {
        self.busy_max_polls = polls.max(1);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes in one full frame.
    pub fn buffer_len(&self) -> usize {
        (self.width.div_ceil(8) * self.height) as usize
    }

    fn reset(&mut self) -> Result<(), EpdError> {
        self.rst_pin.set_high()?;
        thread::sleep(Duration::from_millis(20));
        self.rst_pin.set_low()?;
        thread::sleep(Duration::from_millis(2));
        self.rst_pin.set_high()?;
        thread::sleep(Duration::from_millis(20));
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> Result<(), EpdError> {
        self.dc_pin.set_low()?; // Command mode
        self.cs_pin.set_low()?;
        self.spi.write_byte(command)?;
        self.cs_pin.set_high()?;
        Ok(())
    }

    fn send_data(&mut self, data: &[u8]) -> Result<(), EpdError> {
        self.dc_pin.set_high()?; // Data mode
        self.cs_pin.set_low()?;
        self.spi.write_bytes(data)?;
        self.cs_pin.set_high()?;
        Ok(())
    }

    fn command_with(&mut self, command: u8, data: &[u8]) -> Result<(), EpdError> {
        self.send_command(command)?;
        self.send_data(data)
    }

    /// BUSY is low while the controller works; poll its status until it goes high.
    fn wait_until_idle(&mut self) -> Result<(), EpdError> {
        let mut polls = 0;
        loop {
            self.send_command(GET_STATUS)?;
            if self.busy_pin.is_high()? {
                break;
            }
            polls += 1;
            if polls >= self.busy_max_polls {
                warn!("EPD still busy after {} polls", polls);
                return Err(EpdError("busy timeout".to_string()));
            }
            thread::sleep(BUSY_POLL_INTERVAL);
        }
        debug!("EPD idle after {} polls", polls);
        Ok(())
    }

    fn power_on(&mut self) -> Result<(), EpdError> {
        self.send_command(POWER_ON)?;
        thread::sleep(Duration::from_millis(100));
        self.wait_until_idle()
    }

    fn refresh(&mut self) -> Result<(), EpdError> {
        self.send_command(DISPLAY_REFRESH)?;
        thread::sleep(Duration::from_millis(100));
        self.wait_until_idle()
    }

    /// Full initialisation with the standard waveform.
    pub fn init(&mut self) -> Result<(), EpdError> {
        debug!("EPD init");
        self.reset()?;
        self.command_with(POWER_SETTING, &[0x07, 0x07, 0x3F, 0x3F])?;
        self.command_with(BOOSTER_SOFT_START, &[0x17, 0x17, 0x28, 0x17])?;
        self.power_on()?;
        self.command_with(PANEL_SETTING, &[0x1F])?; // KW mode, LUT from OTP
        self.command_with(
            RESOLUTION,
            &[
                (self.width >> 8) as u8,
                self.width as u8,
                (self.height >> 8) as u8,
                self.height as u8,
            ],
        )?;
        self.command_with(DUAL_SPI, &[0x00])?;
        self.command_with(VCOM_DATA_INTERVAL, &[0x10, 0x07])?;
        self.command_with(TCON_SETTING, &[0x22])?;
        Ok(())
    }

    /// Shorter initialisation for the once-a-minute refresh.
    pub fn init_fast(&mut self) -> Result<(), EpdError> {
        debug!("EPD fast init");
        self.reset()?;
        self.command_with(PANEL_SETTING, &[0x1F])?;
        self.command_with(VCOM_DATA_INTERVAL, &[0x10, 0x07])?;
        self.power_on()?;
        self.command_with(BOOSTER_SOFT_START, &[0x27, 0x27, 0x18, 0x17])?;
        self.command_with(CASCADE_SETTING, &[0x02])?;
        self.command_with(FORCE_TEMPERATURE, &[0x5A])?;
        Ok(())
    }

    /// Write a full frame (1 = black) and refresh the panel.
    pub fn display(&mut self, frame: &[u8]) -> Result<(), EpdError> {
        if frame.len() != self.buffer_len() {
            return Err(EpdError(format!(
                "frame is {} bytes, panel needs {}",
                frame.len(),
                self.buffer_len()
            )));
        }

        let inverted: Vec<u8> = frame.iter().map(|b| !b).collect();
        self.command_with(DATA_START_OLD, &inverted)?;
        self.command_with(DATA_START_NEW, frame)?;
        self.refresh()
    }

    /// Blank the panel to white.
    pub fn clear(&mut self) -> Result<(), EpdError> {
        let len = self.buffer_len();
        self.command_with(DATA_START_OLD, &vec![0xFF; len])?;
        self.command_with(DATA_START_NEW, &vec![0x00; len])?;
        self.refresh()
    }

    /// Power off and enter deep sleep; the image stays on the panel.
    ///
    /// A hardware reset ([`init`](Self::init) or [`init_fast`](Self::init_fast)) wakes it.
    pub fn sleep(&mut self) -> Result<(), EpdError> {
        debug!("EPD sleep");
        self.command_with(VCOM_DATA_INTERVAL, &[0xF7])?;
        self.send_command(POWER_OFF)?;
        self.wait_until_idle()?;
        self.command_with(DEEP_SLEEP, &[0xA5])?;
        thread::sleep(Duration::from_millis(2000));
        Ok(())
    }
}
