//! Display panels
//!
//! A [`Panel`] takes finished 1-bit frames. The backend is chosen from
//! configuration: a PBM file for development machines, or the 7.5" e-paper panel
//! on the Pi. The e-paper adapter is generic over the driver's bus traits; the
//! Linux spidev/GPIO implementations live with the binary.

use crate::canvas::Canvas;
use crate::config::DisplayConfig;
use crate::epd7in5_v2::{Epd7in5V2, EpdError, GpioPin, InputPin, SoftwareSpi};
use embedded_graphics::prelude::Size;
use log::{debug, info};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("panel IO: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Epd(#[from] EpdError),

    #[error("frame is {actual:?}, panel is {expected:?}")]
    FrameSize { expected: Size, actual: Size },

    /// Backend requested that this build cannot drive
    #[error("unsupported display backend: {0}")]
    Unsupported(String),
}

/// Something that shows 1-bit frames.
pub trait Panel {
    fn size(&self) -> Size;

    fn show(&mut self, frame: &Canvas) -> Result<(), PanelError>;

    /// Put the device in its lowest-power state; the last frame stays visible.
    fn sleep(&mut self) -> Result<(), PanelError>;

    fn check_size(&self, frame: &Canvas) -> Result<(), PanelError> {
        let actual = Size::new(frame.width(), frame.height());
        if actual != self.size() {
            return Err(PanelError::FrameSize {
                expected: self.size(),
                actual,
            });
        }
        Ok(())
    }
}

/// Writes every frame to a binary PBM image, replacing the previous one.
pub struct FilePanel {
    path: PathBuf,
    size: Size,
    frames: u64,
}

impl FilePanel {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            size: Size::new(width, height),
            frames: 0,
        }
    }

    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(&config.output_path, config.width, config.height)
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Panel for FilePanel {
    fn size(&self) -> Size {
        self.size
    }

    fn show(&mut self, frame: &Canvas) -> Result<(), PanelError> {
        self.check_size(frame)?;
        // Write beside the target and rename, so viewers never see half a file
        let partial = self.path.with_extension("pbm.partial");
        fs::write(&partial, frame.to_pbm())?;
        fs::rename(&partial, &self.path)?;
        self.frames += 1;
        debug!("Frame {} written to {}", self.frames, self.path.display());
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), PanelError> {
        Ok(())
    }
}

/// 7.5" V2 e-paper panel.
///
/// Each frame wakes the controller with the fast init, writes the frame and puts it
/// back into deep sleep, so the panel draws no power between refreshes.
pub struct EpdPanel<SPI, CS, DC, RST, BUSY> {
    epd: Epd7in5V2<SPI, CS, DC, RST, BUSY>,
}

impl<SPI, CS, DC, RST, BUSY> EpdPanel<SPI, CS, DC, RST, BUSY>
where
    SPI: SoftwareSpi,
    CS: GpioPin,
    DC: GpioPin,
    RST: GpioPin,
    BUSY: InputPin,
{
    /// Full init and a white clear.
    pub fn new(mut epd: Epd7in5V2<SPI, CS, DC, RST, BUSY>) -> Result<Self, PanelError> {
        info!("Initializing {}x{} e-paper panel", epd.width(), epd.height());
        epd.init()?;
        epd.clear()?;
        Ok(Self { epd })
    }
}

impl<SPI, CS, DC, RST, BUSY> Panel for EpdPanel<SPI, CS, DC, RST, BUSY>
where
    SPI: SoftwareSpi,
    CS: GpioPin,
    DC: GpioPin,
    RST: GpioPin,
    BUSY: InputPin,
{
    fn size(&self) -> Size {
        Size::new(self.epd.width(), self.epd.height())
    }

    fn show(&mut self, frame: &Canvas) -> Result<(), PanelError> {
        self.check_size(frame)?;
        self.epd.init_fast()?;
        self.epd.display(frame.bytes())?;
        self.epd.sleep()?;
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), PanelError> {
        self.epd.sleep()?;
        Ok(())
    }
}
