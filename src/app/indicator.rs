//! Indicator controller: LED on while both charger status lines are asserted.
//!
//! ```text
//!  STAT1 edge ──┐
//!               ├──▶ reevaluate() ──▶ read STAT1, STAT2 ──▶ write LED
//!  STAT2 edge ──┘
//! ```
//!
//! The controller keeps no history.  Every re-evaluation reads both status
//! pins fresh from the port and writes a freshly computed LED level, so
//! back-to-back or overlapping edge handlers cannot leave a stale result
//! behind and no locking is needed here.
//!
//! ## State machine
//!
//! | Condition                         | LED       |
//! |-----------------------------------|-----------|
//! | STAT1 asserted AND STAT2 asserted | `On`      |
//! | anything else                     | `Off`     |
//! | either read fails                 | unchanged |

use core::fmt;

use embedded_hal::digital::PinState;
use log::{debug, error, info};

use crate::app::ports::{CallbackId, EdgeMode, GpioPort, PinMode};
use crate::config::{ControllerConfig, PinSpec};
use crate::error::{ConfigStage, InitError, PinRole, ReadError};

// ───────────────────────────────────────────────────────────────
// LED state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedState {
    #[default]
    Off,
    On,
}

impl LedState {
    /// The combinational rule: on iff both inputs are asserted.
    pub fn from_inputs(stat1: PinState, stat2: PinState) -> Self {
        if stat1 == PinState::High && stat2 == PinState::High {
            Self::On
        } else {
            Self::Off
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

impl From<LedState> for PinState {
    fn from(s: LedState) -> Self {
        match s {
            LedState::On => PinState::High,
            LedState::Off => PinState::Low,
        }
    }
}

impl fmt::Display for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(self.is_on()))
    }
}

fn bit(level: PinState) -> u8 {
    u8::from(level == PinState::High)
}

// ───────────────────────────────────────────────────────────────
// Re-evaluation
// ───────────────────────────────────────────────────────────────

fn sample<G: GpioPort>(gpio: &G, config: &ControllerConfig) -> Result<(PinState, PinState), ReadError> {
    let stat1 = gpio.read(&config.stat1);
    let stat2 = gpio.read(&config.stat2);
    let stat1 = stat1.map_err(|status| ReadError {
        role: PinRole::Stat1,
        status,
    })?;
    let stat2 = stat2.map_err(|status| ReadError {
        role: PinRole::Stat2,
        status,
    })?;
    Ok((stat1, stat2))
}

/// Read both status pins and drive the LED accordingly.
///
/// Safe to call from edge-handler context: it never blocks and holds no
/// state between calls.  A failed read is logged and leaves the LED
/// untouched; the next edge retries.  Returns the level written, if any.
pub fn reevaluate<G: GpioPort>(gpio: &G, config: &ControllerConfig) -> Option<LedState> {
    let (stat1, stat2) = match sample(gpio, config) {
        Ok(levels) => levels,
        Err(e) => {
            error!("{e}");
            return None;
        }
    };

    let led = LedState::from_inputs(stat1, stat2);
    // Best-effort: the LED pin was configured as an output during init.
    let _ = gpio.write(&config.led, led.into());
    debug!("STAT1={}, STAT2={} -> LED={}", bit(stat1), bit(stat2), led);
    Some(led)
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// One brought-up indicator instance.
///
/// Owns the two edge subscriptions; dropping the controller unsubscribes
/// them and disarms both status edges.  The LED keeps its last level.
pub struct IndicatorLed<'g, G: GpioPort + 'static> {
    gpio: &'g G,
    config: ControllerConfig,
    stat1_cb: CallbackId,
    stat2_cb: CallbackId,
}

impl<'g, G: GpioPort + 'static> IndicatorLed<'g, G> {
    /// Configure the pins, subscribe to status edges and push the initial
    /// LED level.
    ///
    /// Stops at the first failing step.  The failure is logged before it is
    /// returned; [`InitError::code`] gives the platform status.
    pub fn init(gpio: &'g G, config: ControllerConfig) -> Result<Self, InitError> {
        let result = Self::bring_up(gpio, config);
        match &result {
            Ok(_) => info!("Indicator LED initialized"),
            Err(e) => error!("{e}"),
        }
        result
    }

    fn bring_up(gpio: &'g G, config: ControllerConfig) -> Result<Self, InitError> {
        if !gpio.is_ready(&config.led) {
            return Err(InitError::DeviceNotReady(PinRole::Led));
        }
        gpio.configure(&config.led, PinMode::OutputInactive)
            .map_err(|status| InitError::Configuration {
                role: PinRole::Led,
                stage: ConfigStage::Direction,
                status,
            })?;

        configure_status_pin(gpio, &config.stat1, PinRole::Stat1)?;
        configure_status_pin(gpio, &config.stat2, PinRole::Stat2)?;

        let stat1_cb = subscribe(gpio, &config.stat1, PinRole::Stat1, config)?;
        let stat2_cb = match subscribe(gpio, &config.stat2, PinRole::Stat2, config) {
            Ok(id) => id,
            Err(e) => {
                gpio.remove_callback(stat1_cb);
                return Err(e);
            }
        };

        // Inputs may already be asserted before the edges were armed.
        reevaluate(gpio, &config);

        Ok(Self {
            gpio,
            config,
            stat1_cb,
            stat2_cb,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn subscriptions(&self) -> (CallbackId, CallbackId) {
        (self.stat1_cb, self.stat2_cb)
    }

    /// Run a re-evaluation outside of edge context.
    pub fn refresh(&self) -> Option<LedState> {
        reevaluate(self.gpio, &self.config)
    }
}

impl<G: GpioPort + 'static> Drop for IndicatorLed<'_, G> {
    fn drop(&mut self) {
        self.gpio.remove_callback(self.stat1_cb);
        self.gpio.remove_callback(self.stat2_cb);
        // Nothing to report a disarm failure to.
        let _ = self.gpio.configure_interrupt(&self.config.stat1, EdgeMode::Disabled);
        let _ = self.gpio.configure_interrupt(&self.config.stat2, EdgeMode::Disabled);
    }
}

fn configure_status_pin<G: GpioPort>(gpio: &G, pin: &PinSpec, role: PinRole) -> Result<(), InitError> {
    if !gpio.is_ready(pin) {
        return Err(InitError::DeviceNotReady(role));
    }
    gpio.configure(pin, PinMode::Input)
        .map_err(|status| InitError::Configuration {
            role,
            stage: ConfigStage::Direction,
            status,
        })?;
    gpio.configure_interrupt(pin, EdgeMode::Both)
        .map_err(|status| InitError::Configuration {
            role,
            stage: ConfigStage::Interrupt,
            status,
        })
}

fn subscribe<G: GpioPort + 'static>(
    gpio: &G,
    pin: &PinSpec,
    role: PinRole,
    config: ControllerConfig,
) -> Result<CallbackId, InitError> {
    gpio.add_callback(
        pin,
        Box::new(move |port: &G| {
            reevaluate(port, &config);
        }),
    )
    .map_err(|status| InitError::Configuration {
        role,
        stage: ConfigStage::Callback,
        status,
    })
}
