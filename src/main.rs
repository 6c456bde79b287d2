//! # Weather Strip Application Entry Point
//!
//! This binary coordinates the forecast source, the sensors, the strip renderer and
//! the display panel. It runs a minute-aligned loop: the clock is redrawn every
//! minute and the forecast is refreshed once an hour (at minute 1, after the
//! provider has published its new run).
//!
//! `--stdout` prints the forecast and an ASCII preview of the strip instead of
//! driving a panel, for development without hardware. `--write-config` dumps the
//! effective configuration so it can be edited.

#[cfg(test)]
mod tests;

#[cfg(all(target_os = "linux", feature = "hardware"))]
mod gpio_cdev;
#[cfg(all(target_os = "linux", feature = "hardware"))]
mod hw_spi_spidev;

use anyhow::Context;
use chrono::{DateTime, FixedOffset, Local, Timelike};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use weather_strip_lib::canvas::Canvas;
use weather_strip_lib::config::{Config, DisplayBackend, DisplayConfig, DEFAULT_CONFIG_PATH};
use weather_strip_lib::dashboard::{self, Readings};
use weather_strip_lib::display::{FilePanel, Panel};
use weather_strip_lib::renderer::{draw_ascii, ForecastStripRenderer};
use weather_strip_lib::sensor::{self, ClimateSensor};
use weather_strip_lib::{fallback, forecast, ForecastSnapshot};

/// Minute of the hour at which the forecast is refreshed.
const REFRESH_MINUTE: u32 = 1;

const SPLASH_TEXT: &str = "STARTING";

#[derive(Parser, Debug)]
#[command(name = "weather-strip", version, about = "Weather forecast strip for e-paper displays")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Show one frame and exit
    #[arg(long)]
    once: bool,

    /// Print the forecast and an ASCII strip preview instead of driving a panel
    #[arg(long)]
    stdout: bool,

    /// Pixels per character in the --stdout preview (1 = full resolution)
    #[arg(long, default_value_t = 4)]
    ascii_step: u32,

    /// Write the effective configuration to the --config path and exit
    #[arg(long)]
    write_config: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn now_local() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Time left until the next full minute.
fn until_next_minute<T: Timelike>(now: &T) -> Duration {
    let elapsed = Duration::new(u64::from(now.second()), now.nanosecond().min(999_999_999));
    Duration::from_secs(60).saturating_sub(elapsed)
}

fn write_config(config: &Config, path: &Path) -> anyhow::Result<()> {
    config
        .save_to_path(path)
        .map_err(|e| anyhow::anyhow!("write {}: {}", path.display(), e))
}

/// Fetch a snapshot, falling back to the offline approximation on any failure.
async fn load_snapshot(config: &Config) -> ForecastSnapshot {
    match forecast::fetch(config).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Forecast fetch failed: {}", e);
            warn!("Falling back to offline sun times");
            fallback::approximate(config, now_local())
        }
    }
}

fn build_panel(display: &DisplayConfig) -> anyhow::Result<Box<dyn Panel>> {
    match display.backend {
        DisplayBackend::File => {
            info!("Writing frames to {}", display.output_path.display());
            Ok(Box::new(FilePanel::from_config(display)))
        }
        DisplayBackend::Epd => epd_panel(display),
    }
}

/// Open the e-paper panel on the HAT's SPI bus and GPIO lines.
#[cfg(all(target_os = "linux", feature = "hardware"))]
fn epd_panel(display: &DisplayConfig) -> anyhow::Result<Box<dyn Panel>> {
    use crate::gpio_cdev::{CdevInputPin, CdevOutputPin, KernelChipSelect};
    use crate::hw_spi_spidev::SpidevHwSpi;
    use linux_embedded_hal::gpio_cdev::Chip;
    use weather_strip_lib::display::EpdPanel;
    use weather_strip_lib::epd7in5_v2::Epd7in5V2;

    let hw = &display.hardware;
    info!(
        "E-paper on {} (DC {}, RST {}, BUSY {})",
        hw.spi_device.display(),
        hw.dc_pin,
        hw.rst_pin,
        hw.busy_pin
    );

    let mut chip = Chip::new(&hw.gpio_chip)
        .with_context(|| format!("open {}", hw.gpio_chip.display()))?;
    let dc = CdevOutputPin::new(&mut chip, hw.dc_pin)?;
    let rst = CdevOutputPin::new(&mut chip, hw.rst_pin)?;
    let busy = CdevInputPin::new(&mut chip, hw.busy_pin)?;
    let spi = SpidevHwSpi::open(&hw.spi_device, hw.spi_speed_hz)?;

    let epd = Epd7in5V2::new(spi, KernelChipSelect, dc, rst, busy);
    let panel = EpdPanel::new(epd).context("initialize e-paper panel")?;
    Ok(Box::new(panel))
}

#[cfg(not(all(target_os = "linux", feature = "hardware")))]
fn epd_panel(_display: &DisplayConfig) -> anyhow::Result<Box<dyn Panel>> {
    use weather_strip_lib::display::PanelError;

    Err(PanelError::Unsupported(
        "epd needs a Linux build with --features hardware".to_string(),
    )
    .into())
}

/// Long-lived state of the dashboard loop.
struct App {
    config: Config,
    renderer: ForecastStripRenderer,
    panel: Box<dyn Panel>,
    sensor: Option<Box<dyn ClimateSensor>>,
    snapshot: ForecastSnapshot,
    strip: Canvas,
}

impl App {
    fn width(&self) -> u32 {
        self.panel.size().width
    }

    /// Re-render the strip from the current snapshot. A failure keeps the old strip.
    fn render_strip(&mut self) -> anyhow::Result<()> {
        self.strip = self
            .renderer
            .render_snapshot(&self.snapshot, self.width())
            .context("render forecast strip")?;
        Ok(())
    }

    async fn refresh(&mut self) {
        info!("Refreshing forecast for {}", self.config.location.label);
        self.snapshot = load_snapshot(&self.config).await;
        if let Err(e) = self.render_strip() {
            error!("{:#}", e);
        }
    }

    fn sample_indoor(&mut self) -> Option<sensor::ClimateReading> {
        let sensor = self.sensor.as_mut()?;
        match sensor.sample() {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!("Sensor {} failed: {}", sensor.name(), e);
                None
            }
        }
    }

    async fn show(&mut self, now: DateTime<FixedOffset>) -> anyhow::Result<()> {
        let readings = Readings {
            indoor: self.sample_indoor(),
            remote: sensor::read_remote(&self.config.sensor).await,
            current: self.snapshot.current,
            offline: self.snapshot.offline,
        };
        let size = self.panel.size();
        let frame = dashboard::compose(&self.strip, now.time(), &readings, size.width, size.height);
        self.panel.show(&frame).context("show dashboard")?;
        Ok(())
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => info!("SIGINT received, shutting down"),
        _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Interrupted, shutting down");
    Ok(())
}

async fn run(app: &mut App, once: bool) -> anyhow::Result<()> {
    app.show(now_local()).await?;
    if once {
        return Ok(());
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let wait = until_next_minute(&now_local());
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            result = &mut shutdown => {
                result.context("install signal handlers")?;
                return Ok(());
            }
        }

        let now = now_local();
        if now.minute() == REFRESH_MINUTE {
            app.refresh().await;
        }
        if let Err(e) = app.show(now).await {
            error!("{:#}", e);
        }
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(if args.verbose {
        "debug"
    } else {
        "info"
    }))
    .format_timestamp_secs()
    .init();

    info!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Config::load_from_path(&args.config);
    if args.write_config {
        return write_config(&config, &args.config);
    }

    let renderer = ForecastStripRenderer::new(config.strip);
    let rt = tokio::runtime::Runtime::new().context("start tokio runtime")?;

    // Development mode: ASCII output for testing
    if args.stdout {
        let snapshot = rt.block_on(load_snapshot(&config));
        let strip = renderer
            .render_snapshot(&snapshot, config.display.width)
            .context("render forecast strip")?;
        draw_ascii(&snapshot, &strip, args.ascii_step);
        return Ok(());
    }

    let mut panel = build_panel(&config.display)?;
    let size = panel.size();
    panel
        .show(&dashboard::splash(SPLASH_TEXT, size.width, size.height))
        .context("show splash screen")?;

    let sensor = sensor::build_sensor(&config.sensor);
    match &sensor {
        Some(s) => info!("Indoor sensor: {}", s.name()),
        None => info!("No indoor sensor configured"),
    }

    let snapshot = rt.block_on(load_snapshot(&config));
    let mut app = App {
        strip: Canvas::new(size.width, renderer.layout().height),
        config,
        renderer,
        panel,
        sensor,
        snapshot,
    };
    app.render_strip()?;

    let result = rt.block_on(run(&mut app, args.once));
    if let Err(e) = app.panel.sleep() {
        error!("Panel sleep failed: {}", e);
    }
    result
}
