//! Port traits: the boundary between the indicator logic and the platform.
//!
//! ```text
//!   GPIO adapter ──▶ GpioPort ──▶ IndicatorLed (domain)
//! ```
//!
//! The controller never touches registers.  Every pin operation goes
//! through [`GpioPort`], which the ESP-IDF adapter implements on the device
//! and the simulation adapter implements on the host.
//!
//! All levels crossing this boundary are **logical**: `PinState::High`
//! means asserted, whatever the pin's electrical polarity.  Adapters apply
//! [`PinSpec::to_logical`](crate::config::PinSpec::to_logical) and
//! [`PinSpec::to_physical`](crate::config::PinSpec::to_physical).

use embedded_hal::digital::PinState;

use crate::config::PinSpec;
use crate::error::GpioError;

// ───────────────────────────────────────────────────────────────
// Pin configuration
// ───────────────────────────────────────────────────────────────

/// Direction requested at configure time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    /// Output, initially driven to its inactive level.
    OutputInactive,
}

impl PinMode {
    pub fn is_output(self) -> bool {
        self == Self::OutputInactive
    }
}

/// Edge notification setting for an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    /// No notifications; the state of a pin that was never armed.
    Disabled,
    /// Rising and falling transitions.
    Both,
}

impl EdgeMode {
    /// Whether a transition from `from` to `to` fires under this mode.
    pub fn fires(self, from: PinState, to: PinState) -> bool {
        self == Self::Both && from != to
    }
}

// ───────────────────────────────────────────────────────────────
// Edge callbacks
// ───────────────────────────────────────────────────────────────

/// Handle for a registered edge callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u32);

/// Edge handler.  The port passes a reference to itself so the handler can
/// read and write pins without owning a handle to the port.
///
/// Handlers may run in interrupt (or deferred interrupt) context and must
/// not block.
pub type EdgeHandler<P> = Box<dyn Fn(&P) + Send + Sync + 'static>;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain ↔ pins)
// ───────────────────────────────────────────────────────────────

/// Pin read / write / interrupt primitives.
///
/// Methods take `&self`: the port is shared between the controllers that
/// use it and the edge handlers it invokes, so implementations provide
/// their own interior synchronisation.
pub trait GpioPort: Sized {
    /// Has the pin's backing controller completed bring-up?
    fn is_ready(&self, pin: &PinSpec) -> bool;

    /// Set the pin direction.
    fn configure(&self, pin: &PinSpec, mode: PinMode) -> Result<(), GpioError>;

    /// Arm (or disarm) edge notifications.
    fn configure_interrupt(&self, pin: &PinSpec, edge: EdgeMode) -> Result<(), GpioError>;

    /// Current logical level.
    fn read(&self, pin: &PinSpec) -> Result<PinState, GpioError>;

    /// Drive a logical level.
    fn write(&self, pin: &PinSpec, level: PinState) -> Result<(), GpioError>;

    /// Subscribe `handler` to edge notifications on `pin`.
    fn add_callback(
        &self,
        pin: &PinSpec,
        handler: EdgeHandler<Self>,
    ) -> Result<CallbackId, GpioError>;

    /// Drop a subscription.  Unknown ids are ignored.
    fn remove_callback(&self, id: CallbackId);
}
