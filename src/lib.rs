//! Indicator LED firmware library.
//!
//! Lights an LED while both charger status lines (STAT1, STAT2) are
//! asserted.  Exposes the pure-logic modules for integration testing; all
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod pins;
