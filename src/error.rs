//! Error types for the indicator firmware.
//!
//! All variants are `Copy` so they can be logged from edge-handler context
//! and handed back to the device registry without allocation.  Platform
//! status codes follow the negative-errno convention: `0` is success and
//! every failure is a negative integer.

use core::fmt;

// ---------------------------------------------------------------------------
// Errno values used by the GPIO adapters
// ---------------------------------------------------------------------------

/// I/O error.
pub const EIO: i32 = 5;
/// Invalid argument.
pub const EINVAL: i32 = 22;
/// No such device (backing controller not ready).
pub const ENODEV: i32 = 19;
/// Operation not supported by the pin.
pub const ENOTSUP: i32 = 134;

// ---------------------------------------------------------------------------
// GPIO status
// ---------------------------------------------------------------------------

/// Negative status code returned by the pin abstraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(i32);

impl GpioError {
    /// Wrap a platform status.  Positive values are folded to their negative
    /// form so callers can rely on `code() < 0`.
    pub const fn new(code: i32) -> Self {
        if code > 0 { Self(-code) } else { Self(code) }
    }

    pub const fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Pin roles
// ---------------------------------------------------------------------------

/// Which of the controller's three pins an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    Led,
    Stat1,
    Stat2,
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Led => write!(f, "LED"),
            Self::Stat1 => write!(f, "STAT1"),
            Self::Stat2 => write!(f, "STAT2"),
        }
    }
}

/// The configuration request the platform rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStage {
    /// Pin direction (input / output with initial level).
    Direction,
    /// Edge-interrupt configuration.
    Interrupt,
    /// Edge-callback registration.
    Callback,
}

// ---------------------------------------------------------------------------
// Initialisation errors
// ---------------------------------------------------------------------------

/// Fatal errors during controller bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The pin's backing GPIO controller has not completed bring-up.
    DeviceNotReady(PinRole),
    /// The platform rejected a configuration request.
    Configuration {
        role: PinRole,
        stage: ConfigStage,
        status: GpioError,
    },
}

impl InitError {
    /// Negative status code surfaced to the device registry.
    pub const fn code(&self) -> i32 {
        match self {
            Self::DeviceNotReady(_) => -ENODEV,
            Self::Configuration { status, .. } => status.code(),
        }
    }

    pub const fn role(&self) -> PinRole {
        match self {
            Self::DeviceNotReady(role) | Self::Configuration { role, .. } => *role,
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotReady(role) => write!(f, "{role} GPIO not ready"),
            Self::Configuration {
                role,
                stage: ConfigStage::Direction,
                status,
            } => write!(f, "Failed to configure {role} GPIO: {status}"),
            Self::Configuration {
                role,
                stage: ConfigStage::Interrupt,
                status,
            } => write!(f, "Failed to configure {role} interrupt: {status}"),
            Self::Configuration {
                role,
                stage: ConfigStage::Callback,
                status,
            } => write!(f, "Failed to register {role} callback: {status}"),
        }
    }
}

/// Map a bring-up result onto the platform's integer status convention.
pub fn status_code<T>(result: &core::result::Result<T, InitError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.code(),
    }
}

// ---------------------------------------------------------------------------
// Runtime read errors
// ---------------------------------------------------------------------------

/// A status pin could not be read during re-evaluation.  Recoverable: the
/// next edge retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadError {
    pub role: PinRole,
    pub status: GpioError,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to read {} pin: {}", self.role, self.status)
    }
}

// ---------------------------------------------------------------------------
// Board description errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// The description is not valid JSON or does not match the schema.
    Malformed,
    /// More instances than the registry can hold.
    TooManyInstances,
    /// Two roles of one instance are bound to the same physical pin.
    PinConflict(&'static str),
    /// Two instances share a name.
    DuplicateName,
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed board description"),
            Self::TooManyInstances => write!(f, "too many indicator instances"),
            Self::PinConflict(which) => write!(f, "pin conflict: {which}"),
            Self::DuplicateName => write!(f, "duplicate instance name"),
        }
    }
}
