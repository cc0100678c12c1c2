//! Application core: indicator logic, zero direct I/O.
//!
//! The controller and the registry reach hardware only through the
//! [`ports::GpioPort`] trait, so the whole layer runs on the host against
//! the simulation adapter.

pub mod indicator;
pub mod ports;
pub mod registry;
