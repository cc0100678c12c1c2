//! Indicator LED firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  EspGpio (GpioPort)         esp_idf_logger (log sink)     │
//! │  ───────────────── Port Trait Boundary ─────────────────  │
//! │  DeviceRegistry ──▶ IndicatorLed × N (pure logic)         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Boot resolves the board description, brings up every enabled indicator
//! instance, then parks in the edge-dispatch loop.
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{LevelFilter, info, warn};

use indicator_led::adapters::esp_gpio::EspGpio;
use indicator_led::app::registry::DeviceRegistry;
use indicator_led::config::BoardConfig;
use indicator_led::pins;

const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Board description baked into the image.
const BOARD_JSON: &str = include_str!("../boards/esp32s3-devkit.json");

/// Period of the edge-dispatch loop.
const DISPATCH_PERIOD_MS: u32 = 5;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    log::set_max_level(LOG_LEVEL);

    info!("Indicator LED v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Resolve the board description ──────────────────────
    let board = match BoardConfig::from_json(BOARD_JSON) {
        Ok(board) => board,
        Err(e) => {
            warn!("Board description rejected ({}), using factory wiring", e);
            pins::default_board()
        }
    };

    // ── 3. Bring up every enabled instance ────────────────────
    let gpio = EspGpio::new().map_err(|e| anyhow::anyhow!("GPIO ISR service: {e}"))?;
    let registry = DeviceRegistry::bring_up(&gpio, &board);
    info!(
        "{}/{} indicator instance(s) ready",
        registry.ready_count(),
        registry.len()
    );
    for dev in registry.devices().filter(|d| !d.is_ready()) {
        warn!("{}: offline (status {})", dev.name(), dev.status());
    }

    // ── 4. Edge dispatch ──────────────────────────────────────
    loop {
        gpio.dispatch_pending();
        FreeRtos::delay_ms(DISPATCH_PERIOD_MS);
    }
}
