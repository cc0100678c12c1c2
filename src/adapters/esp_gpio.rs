//! ESP-IDF GPIO adapter.
//!
//! Implements [`GpioPort`] with raw `esp_idf_svc::sys` GPIO calls.  The
//! ESP32-S3 exposes a single GPIO controller, so every pin lives on port 0.
//!
//! ## Edge delivery
//!
//! ```text
//! GPIO ISR ──▶ PENDING bitmask (atomic) ──▶ dispatch_pending() ──▶ handlers
//!  (IRAM)                                    (main task)
//! ```
//!
//! The ISR only records which pin fired.  Handlers log, and ESP-IDF logging
//! is not permitted from interrupt context, so they run from
//! [`EspGpio::dispatch_pending`] in task context instead.

use core::ffi::c_void;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::PinState;
use esp_idf_svc::sys::*;
use log::info;

use crate::app::ports::{CallbackId, EdgeHandler, EdgeMode, GpioPort, PinMode};
use crate::config::{ActiveLevel, MAX_INSTANCES, PinSpec};
use crate::error::{EINVAL, EIO, ENODEV, ENOTSUP, GpioError};

/// Two subscriptions per indicator instance.
const MAX_CALLBACKS: usize = 2 * MAX_INSTANCES;

/// Out of memory (callback table full).
const ENOMEM: i32 = 12;

/// Pending-edge bitmask, one bit per GPIO.  Written by the ISR, drained by
/// the main task.  Two words cover GPIO 0-63.
static PENDING: [AtomicU32; 2] = [AtomicU32::new(0), AtomicU32::new(0)];

/// GPIO ISR: `arg` carries the GPIO number.  Lock-free.
unsafe extern "C" fn edge_isr(arg: *mut c_void) {
    let gpio = arg as usize;
    PENDING[gpio / 32].fetch_or(1 << (gpio % 32), Ordering::AcqRel);
}

fn esp_status(ret: esp_err_t) -> Result<(), GpioError> {
    if ret == ESP_OK as i32 {
        return Ok(());
    }
    let errno = match ret {
        r if r == ESP_ERR_INVALID_ARG as i32 => EINVAL,
        r if r == ESP_ERR_NOT_SUPPORTED as i32 => ENOTSUP,
        r if r == ESP_ERR_INVALID_STATE as i32 => ENODEV,
        _ => EIO,
    };
    Err(GpioError::new(-errno))
}

type SharedHandler = Arc<dyn Fn(&EspGpio) + Send + Sync + 'static>;

struct Registration {
    id: CallbackId,
    gpio: u8,
    handler: SharedHandler,
}

pub struct EspGpio {
    handlers: Mutex<heapless::Vec<Registration, MAX_CALLBACKS>>,
    next_id: AtomicU32,
}

impl EspGpio {
    /// Install the per-pin GPIO ISR service.
    ///
    /// `ESP_ERR_INVALID_STATE` means another component already installed it,
    /// which is fine.
    pub fn new() -> Result<Self, GpioError> {
        // SAFETY: called once from main() before any edge is armed.
        let ret = unsafe { gpio_install_isr_service(0) };
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(GpioError::new(-EIO));
        }
        info!("esp_gpio: ISR service installed");
        Ok(Self {
            handlers: Mutex::new(heapless::Vec::new()),
            next_id: AtomicU32::new(1),
        })
    }

    fn handlers(&self) -> MutexGuard<'_, heapless::Vec<Registration, MAX_CALLBACKS>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gpio_num(pin: &PinSpec) -> Result<gpio_num_t, GpioError> {
        if pin.port != 0 || u32::from(pin.pin) >= SOC_GPIO_PIN_COUNT {
            return Err(GpioError::new(-EINVAL));
        }
        Ok(gpio_num_t::from(pin.pin))
    }

    /// Run the handlers of every pin whose edge fired since the last call.
    /// Call from the main task.  Returns the number of handlers invoked.
    pub fn dispatch_pending(&self) -> usize {
        let mut invoked = 0;
        for (word, pending) in PENDING.iter().enumerate() {
            let mut bits = pending.swap(0, Ordering::AcqRel);
            while bits != 0 {
                let bit = bits.trailing_zeros();
                bits &= bits - 1;
                let gpio = (word as u32 * 32 + bit) as u8;

                let ready: heapless::Vec<SharedHandler, MAX_CALLBACKS> = self
                    .handlers()
                    .iter()
                    .filter(|r| r.gpio == gpio)
                    .map(|r| Arc::clone(&r.handler))
                    .collect();

                // Lock released: handlers call back into the port.
                for handler in &ready {
                    handler(self);
                    invoked += 1;
                }
            }
        }
        invoked
    }
}

impl GpioPort for EspGpio {
    fn is_ready(&self, pin: &PinSpec) -> bool {
        Self::gpio_num(pin).is_ok()
    }

    fn configure(&self, pin: &PinSpec, mode: PinMode) -> Result<(), GpioError> {
        let gpio = Self::gpio_num(pin)?;

        if mode.is_output() {
            // Latch the inactive level before the driver is enabled.
            let level = u32::from(pin.to_physical(PinState::Low) == PinState::High);
            // SAFETY: gpio was range-checked above.
            esp_status(unsafe { gpio_set_level(gpio, level) })?;
        }

        // Open-drain status lines idle high through the pull-up.
        let pull_up = !mode.is_output() && pin.active == ActiveLevel::Low;

        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin.pin,
            mode: if mode.is_output() {
                gpio_mode_t_GPIO_MODE_INPUT_OUTPUT
            } else {
                gpio_mode_t_GPIO_MODE_INPUT
            },
            pull_up_en: if pull_up {
                gpio_pullup_t_GPIO_PULLUP_ENABLE
            } else {
                gpio_pullup_t_GPIO_PULLUP_DISABLE
            },
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            ..Default::default()
        };
        // SAFETY: cfg is a valid, fully initialised config for one pin.
        esp_status(unsafe { gpio_config(&cfg) })
    }

    fn configure_interrupt(&self, pin: &PinSpec, edge: EdgeMode) -> Result<(), GpioError> {
        let gpio = Self::gpio_num(pin)?;

        if edge == EdgeMode::Disabled {
            // SAFETY: gpio range-checked; the ISR service is installed.
            unsafe {
                esp_status(gpio_intr_disable(gpio))?;
                esp_status(gpio_isr_handler_remove(gpio))?;
            }
            return Ok(());
        }

        // Any-edge is symmetric, so polarity does not change the trigger.
        // SAFETY: gpio range-checked; edge_isr only touches the PENDING
        // atomics, and the GPIO number is passed by value in `arg`.
        unsafe {
            esp_status(gpio_set_intr_type(gpio, gpio_int_type_t_GPIO_INTR_ANYEDGE))?;
            esp_status(gpio_isr_handler_add(
                gpio,
                Some(edge_isr),
                pin.pin as usize as *mut c_void,
            ))?;
            esp_status(gpio_intr_enable(gpio))
        }
    }

    fn read(&self, pin: &PinSpec) -> Result<PinState, GpioError> {
        let gpio = Self::gpio_num(pin)?;
        // SAFETY: register read on a range-checked pin.
        let raw = unsafe { gpio_get_level(gpio) };
        Ok(pin.to_logical(PinState::from(raw != 0)))
    }

    fn write(&self, pin: &PinSpec, level: PinState) -> Result<(), GpioError> {
        let gpio = Self::gpio_num(pin)?;
        let level = u32::from(pin.to_physical(level) == PinState::High);
        // SAFETY: register write on a range-checked pin.
        esp_status(unsafe { gpio_set_level(gpio, level) })
    }

    fn add_callback(
        &self,
        pin: &PinSpec,
        handler: EdgeHandler<Self>,
    ) -> Result<CallbackId, GpioError> {
        Self::gpio_num(pin)?;
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers()
            .push(Registration {
                id,
                gpio: pin.pin,
                handler: Arc::from(handler),
            })
            .map_err(|_| GpioError::new(-ENOMEM))?;
        Ok(id)
    }

    fn remove_callback(&self, id: CallbackId) {
        self.handlers().retain(|r| r.id != id);
    }
}
