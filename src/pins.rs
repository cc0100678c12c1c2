//! Default GPIO assignments for the indicator board (ESP32-S3 DevKitC).
//!
//! Used when the embedded board description fails to parse, so the board
//! always comes up with its factory wiring.  Change a pin here and in
//! `boards/esp32s3-devkit.json` together.

use crate::config::{ActiveLevel, BoardConfig, ControllerConfig, PinSpec};

/// The ESP32-S3 has a single GPIO controller.
pub const GPIO_PORT: u8 = 0;

// ---------------------------------------------------------------------------
// Indicator LED (discrete LED + series resistor to GND)
// ---------------------------------------------------------------------------

/// Digital output: HIGH = LED lit.
pub const LED_GPIO: u8 = 21;

// ---------------------------------------------------------------------------
// Charger status lines
// ---------------------------------------------------------------------------

/// Charger STAT1 line, buffered to push-pull, HIGH = asserted.
pub const STAT1_GPIO: u8 = 4;
/// Charger STAT2 line, buffered to push-pull, HIGH = asserted.
pub const STAT2_GPIO: u8 = 5;

pub const STAT_ACTIVE: ActiveLevel = ActiveLevel::High;

pub const DEFAULT_INSTANCE: &str = "indicator";

pub const fn default_config() -> ControllerConfig {
    ControllerConfig {
        led: PinSpec::active_high(GPIO_PORT, LED_GPIO),
        stat1: PinSpec::new(GPIO_PORT, STAT1_GPIO, STAT_ACTIVE),
        stat2: PinSpec::new(GPIO_PORT, STAT2_GPIO, STAT_ACTIVE),
    }
}

/// Single-instance board using the factory wiring.
pub fn default_board() -> BoardConfig {
    BoardConfig::single(DEFAULT_INSTANCE, default_config()).unwrap_or_default()
}
