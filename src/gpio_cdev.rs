// src/gpio_cdev.rs
use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use weather_strip_lib::epd7in5_v2::{EpdError, GpioPin, InputPin};

const CONSUMER: &str = "weather-strip";

pub struct CdevOutputPin {
    line: LineHandle,
}

pub struct CdevInputPin {
    line: LineHandle,
}

/// Stand-in for chip select when the kernel SPI driver owns the CE line.
pub struct KernelChipSelect;

fn request(chip: &mut Chip, offset: u32, flags: LineRequestFlags) -> Result<LineHandle, EpdError> {
    chip.get_line(offset)
        .map_err(|e| EpdError(e.to_string()))?
        .request(flags, 0, CONSUMER)
        .map_err(|e| EpdError(format!("GPIO {}: {}", offset, e)))
}

impl CdevOutputPin {
    pub fn new(chip: &mut Chip, offset: u32) -> Result<Self, EpdError> {
        Ok(Self {
            line: request(chip, offset, LineRequestFlags::OUTPUT)?,
        })
    }
}

impl CdevInputPin {
    pub fn new(chip: &mut Chip, offset: u32) -> Result<Self, EpdError> {
        Ok(Self {
            line: request(chip, offset, LineRequestFlags::INPUT)?,
        })
    }
}

impl GpioPin for CdevOutputPin {
    fn set_high(&mut self) -> Result<(), EpdError> {
        self.line.set_value(1).map_err(|e| EpdError(e.to_string()))
    }
    fn set_low(&mut self) -> Result<(), EpdError> {
        self.line.set_value(0).map_err(|e| EpdError(e.to_string()))
    }
}

impl GpioPin for KernelChipSelect {
    fn set_high(&mut self) -> Result<(), EpdError> {
        Ok(())
    }
    fn set_low(&mut self) -> Result<(), EpdError> {
        Ok(())
    }
}

impl InputPin for CdevInputPin {
    fn is_high(&self) -> Result<bool, EpdError> {
        Ok(self.line.get_value().map_err(|e| EpdError(e.to_string()))? == 1)
    }
}
