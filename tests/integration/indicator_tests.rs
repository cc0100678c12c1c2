//! Integration tests for the indicator controller against the simulated port.
//!
//! Covers the end-to-end edge → re-evaluation → LED pipeline, including the
//! diagnostics each step emits.

use std::sync::Barrier;
use std::thread;

use embedded_hal::digital::PinState;
use log::Level;

use indicator_led::adapters::sim_gpio::{GpioCall, SimGpio};
use indicator_led::app::indicator::{IndicatorLed, LedState, reevaluate};
use indicator_led::app::ports::PinMode;
use indicator_led::config::{ControllerConfig, PinSpec};
use indicator_led::error::{EIO, ENODEV, status_code};

use super::log_capture;

const LED: PinSpec = PinSpec::active_high(0, 21);
const STAT1: PinSpec = PinSpec::active_high(0, 4);
const STAT2: PinSpec = PinSpec::active_high(0, 5);

const PINS: ControllerConfig = ControllerConfig {
    led: LED,
    stat1: STAT1,
    stat2: STAT2,
};

// ── Charger walk-through ──────────────────────────────────────

#[test]
fn charger_status_walkthrough() {
    log_capture::install();
    let gpio = SimGpio::new();

    // STAT1=1, STAT2=0 at startup → LED=0.
    gpio.drive(&STAT1, PinState::High);
    let _led = IndicatorLed::init(&gpio, PINS).unwrap();
    assert_eq!(gpio.level(&LED), PinState::Low);

    // STAT2 → 1 → LED=1.
    gpio.drive(&STAT2, PinState::High);
    assert_eq!(gpio.level(&LED), PinState::High);

    // STAT1 → 0 → LED=0.
    gpio.drive(&STAT1, PinState::Low);
    assert_eq!(gpio.level(&LED), PinState::Low);

    // STAT1 read errors while STAT2=1 → LED stays 0, error logged.
    log_capture::clear();
    gpio.fail_read(&STAT1, Some(-EIO));
    gpio.drive(&STAT2, PinState::Low);
    gpio.drive(&STAT2, PinState::High);
    assert_eq!(gpio.level(&LED), PinState::Low);
    assert_eq!(gpio.write_count(&LED), 3, "no LED write after the fault");
    assert!(log_capture::contains(Level::Error, "Failed to read STAT1 pin: -5"));
    assert_eq!(log_capture::count(Level::Error), 2, "one per failed edge");
}

#[test]
fn active_low_charger_asserted_before_boot() {
    let stat1 = PinSpec::active_low(0, 4);
    let stat2 = PinSpec::active_low(0, 5);
    let pins = ControllerConfig { stat1, stat2, ..PINS };
    let gpio = SimGpio::new();

    // Charger already pulling both lines low at power-up.
    gpio.drive(&stat1, PinState::High);
    gpio.drive(&stat2, PinState::High);
    let _led = IndicatorLed::init(&gpio, pins).unwrap();
    assert_eq!(gpio.level(&LED), PinState::High);

    gpio.drive(&stat2, PinState::Low);
    assert_eq!(gpio.physical_level(&stat2), PinState::High);
    assert_eq!(gpio.level(&LED), PinState::Low);
}

// ── Diagnostics ───────────────────────────────────────────────

#[test]
fn successful_init_logs_info() {
    log_capture::install();
    let gpio = SimGpio::new();
    let result = IndicatorLed::init(&gpio, PINS);
    assert_eq!(status_code(&result), 0);
    assert!(log_capture::contains(Level::Info, "Indicator LED initialized"));
    assert_eq!(log_capture::count(Level::Error), 0);
}

#[test]
fn reevaluation_logs_levels_at_debug() {
    log_capture::install();
    let gpio = SimGpio::new();
    let _led = IndicatorLed::init(&gpio, PINS).unwrap();
    assert!(log_capture::contains(Level::Debug, "STAT1=0, STAT2=0 -> LED=0"));

    gpio.drive(&STAT1, PinState::High);
    gpio.drive(&STAT2, PinState::High);
    assert!(log_capture::contains(Level::Debug, "STAT1=1, STAT2=1 -> LED=1"));
}

#[test]
fn init_failure_is_logged_before_return() {
    log_capture::install();
    let gpio = SimGpio::new();
    let led = PinSpec::active_high(3, 0);
    gpio.set_port_ready(3, false);

    let result = IndicatorLed::init(&gpio, ControllerConfig { led, ..PINS });
    assert_eq!(status_code(&result), -ENODEV);
    assert!(log_capture::contains(Level::Error, "LED GPIO not ready"));
    assert!(!log_capture::contains(Level::Info, "initialized"));
}

#[test]
fn led_direction_failure_is_logged_with_status() {
    log_capture::install();
    let gpio = SimGpio::new();
    gpio.fail_configure(&LED, -16);

    let result = IndicatorLed::init(&gpio, PINS);
    assert_eq!(status_code(&result), -16);
    assert!(log_capture::contains(
        Level::Error,
        "Failed to configure LED GPIO: -16"
    ));
    assert_eq!(
        gpio.journal().last(),
        Some(&GpioCall::Configure(LED, PinMode::OutputInactive))
    );
}

#[test]
fn stat1_not_ready_is_logged() {
    log_capture::install();
    let gpio = SimGpio::new();
    let stat1 = PinSpec::active_high(2, 4);
    gpio.set_port_ready(2, false);

    let result = IndicatorLed::init(&gpio, ControllerConfig { stat1, ..PINS });
    assert_eq!(status_code(&result), -ENODEV);
    assert!(log_capture::contains(Level::Error, "STAT1 GPIO not ready"));
    assert_eq!(gpio.journal().last(), Some(&GpioCall::IsReady(stat1)));
}

#[test]
fn stat1_callback_failure_leaves_no_subscription() {
    log_capture::install();
    let gpio = SimGpio::new();
    gpio.fail_callback(&STAT1, -12);

    let result = IndicatorLed::init(&gpio, PINS);
    assert_eq!(status_code(&result), -12);
    assert!(log_capture::contains(
        Level::Error,
        "Failed to register STAT1 callback: -12"
    ));
    assert_eq!(gpio.callback_count(&STAT1), 0);
    assert_eq!(gpio.callback_count(&STAT2), 0);
}

#[test]
fn stat1_interrupt_failure_is_logged_with_status() {
    log_capture::install();
    let gpio = SimGpio::new();
    gpio.fail_interrupt(&STAT1, -134);

    let result = IndicatorLed::init(&gpio, PINS);
    assert_eq!(status_code(&result), -134);
    assert!(log_capture::contains(
        Level::Error,
        "Failed to configure STAT1 interrupt: -134"
    ));
    // Nothing after the failing step ran.
    assert!(
        !gpio
            .journal()
            .iter()
            .any(|c| matches!(c, GpioCall::IsReady(p) if *p == STAT2))
    );
}

#[test]
fn stat2_direction_failure_is_logged_with_status() {
    log_capture::install();
    let gpio = SimGpio::new();
    gpio.fail_configure(&STAT2, -16);

    let result = IndicatorLed::init(&gpio, PINS);
    assert_eq!(status_code(&result), -16);
    assert!(log_capture::contains(
        Level::Error,
        "Failed to configure STAT2 GPIO: -16"
    ));
}

// ── Reactivity ────────────────────────────────────────────────

#[test]
fn redundant_edges_repeat_only_diagnostics() {
    log_capture::install();
    let gpio = SimGpio::new();
    let led = IndicatorLed::init(&gpio, PINS).unwrap();
    gpio.drive(&STAT1, PinState::High);
    gpio.drive(&STAT2, PinState::High);

    log_capture::clear();
    assert_eq!(led.refresh(), Some(LedState::On));
    assert_eq!(led.refresh(), Some(LedState::On));
    assert_eq!(gpio.level(&LED), PinState::High);
    assert_eq!(log_capture::count(Level::Debug), 2);
}

#[test]
fn concurrent_reevaluations_agree() {
    let gpio = SimGpio::new();
    let _led = IndicatorLed::init(&gpio, PINS).unwrap();
    gpio.drive(&STAT1, PinState::High);
    gpio.drive(&STAT2, PinState::High);

    let barrier = Barrier::new(4);
    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                barrier.wait();
                for _ in 0..50 {
                    assert_eq!(reevaluate(&gpio, &PINS), Some(LedState::On));
                }
            });
        }
    });
    assert_eq!(gpio.level(&LED), PinState::High);
}

#[test]
fn subscriptions_are_distinct_and_released() {
    let gpio = SimGpio::new();
    let led = IndicatorLed::init(&gpio, PINS).unwrap();
    let (s1, s2) = led.subscriptions();
    assert_ne!(s1, s2);
    assert_eq!(led.config(), &PINS);

    drop(led);
    let journal = gpio.journal();
    assert!(journal.contains(&GpioCall::RemoveCallback(s1)));
    assert!(journal.contains(&GpioCall::RemoveCallback(s2)));
}
