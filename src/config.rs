//! Pin bindings and the board description.
//!
//! A [`ControllerConfig`] names the three pins of one indicator instance.
//! The board description ([`BoardConfig`]) lists every instance and is
//! resolved once at boot, before any controller is initialised.

use embedded_hal::digital::PinState;
use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Maximum number of indicator instances one board may declare.
pub const MAX_INSTANCES: usize = 4;

/// Instance name capacity (bytes).
pub const NAME_CAPACITY: usize = 16;

/// Electrical polarity of a pin's active (asserted) state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveLevel {
    #[default]
    High,
    Low,
}

/// Identity and polarity of one physical pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSpec {
    /// GPIO controller (port) index.
    pub port: u8,
    /// Pin number within the port.
    pub pin: u8,
    #[serde(default)]
    pub active: ActiveLevel,
}

impl PinSpec {
    pub const fn new(port: u8, pin: u8, active: ActiveLevel) -> Self {
        Self { port, pin, active }
    }

    pub const fn active_high(port: u8, pin: u8) -> Self {
        Self::new(port, pin, ActiveLevel::High)
    }

    pub const fn active_low(port: u8, pin: u8) -> Self {
        Self::new(port, pin, ActiveLevel::Low)
    }

    /// Convert an electrical level into the logical (asserted = `High`) level.
    pub fn to_logical(&self, physical: PinState) -> PinState {
        match self.active {
            ActiveLevel::High => physical,
            ActiveLevel::Low => !physical,
        }
    }

    /// Convert a logical level into the level to drive on the wire.
    pub fn to_physical(&self, logical: PinState) -> PinState {
        // Polarity inversion is its own inverse.
        self.to_logical(logical)
    }

    /// Same port and pin, regardless of polarity.
    pub fn same_pin(&self, other: &PinSpec) -> bool {
        self.port == other.port && self.pin == other.pin
    }
}

/// The three pin bindings of one indicator controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub led: PinSpec,
    pub stat1: PinSpec,
    pub stat2: PinSpec,
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.led.same_pin(&self.stat1) {
            return Err(BoardError::PinConflict("led/stat1"));
        }
        if self.led.same_pin(&self.stat2) {
            return Err(BoardError::PinConflict("led/stat2"));
        }
        if self.stat1.same_pin(&self.stat2) {
            return Err(BoardError::PinConflict("stat1/stat2"));
        }
        Ok(())
    }
}

fn enabled_default() -> bool {
    true
}

/// One declared indicator instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub name: heapless::String<NAME_CAPACITY>,
    /// Disabled instances are declared but never brought up.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    pub led: PinSpec,
    pub stat1: PinSpec,
    pub stat2: PinSpec,
}

impl InstanceConfig {
    pub fn pins(&self) -> ControllerConfig {
        ControllerConfig {
            led: self.led,
            stat1: self.stat1,
            stat2: self.stat2,
        }
    }
}

/// Every indicator instance on the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub instances: Vec<InstanceConfig>,
}

impl BoardConfig {
    /// Parse and validate a JSON board description.
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        let board: BoardConfig = serde_json::from_str(json).map_err(|_| BoardError::Malformed)?;
        board.validate()?;
        Ok(board)
    }

    /// Board with a single enabled instance.
    pub fn single(name: &str, pins: ControllerConfig) -> Result<Self, BoardError> {
        let mut board = Self::default();
        board.push(name, pins)?;
        Ok(board)
    }

    pub fn push(&mut self, name: &str, pins: ControllerConfig) -> Result<(), BoardError> {
        if self.instances.len() >= MAX_INSTANCES {
            return Err(BoardError::TooManyInstances);
        }
        let mut n = heapless::String::new();
        n.push_str(name).map_err(|_| BoardError::Malformed)?;
        self.instances.push(InstanceConfig {
            name: n,
            enabled: true,
            led: pins.led,
            stat1: pins.stat1,
            stat2: pins.stat2,
        });
        if let Err(e) = self.validate() {
            self.instances.pop();
            return Err(e);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if self.instances.len() > MAX_INSTANCES {
            return Err(BoardError::TooManyInstances);
        }
        for (i, inst) in self.instances.iter().enumerate() {
            inst.pins().validate()?;
            if self.instances[..i].iter().any(|o| o.name == inst.name) {
                return Err(BoardError::DuplicateName);
            }
        }
        Ok(())
    }

    pub fn enabled(&self) -> impl Iterator<Item = &InstanceConfig> {
        self.instances.iter().filter(|i| i.enabled)
    }
}
