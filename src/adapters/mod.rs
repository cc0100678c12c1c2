//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements | Connects to                    |
//! |------------|------------|--------------------------------|
//! | `esp_gpio` | GpioPort   | ESP-IDF GPIO driver + ISR      |
//! | `sim_gpio` | GpioPort   | In-memory pins (host builds)   |

#[cfg(target_os = "espidf")]
pub mod esp_gpio;
#[cfg(not(target_os = "espidf"))]
pub mod sim_gpio;
