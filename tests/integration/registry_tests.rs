//! Integration tests for board-driven bring-up.

use embedded_hal::digital::PinState;
use log::Level;

use indicator_led::adapters::sim_gpio::SimGpio;
use indicator_led::app::registry::DeviceRegistry;
use indicator_led::config::{BoardConfig, ControllerConfig, MAX_INSTANCES, PinSpec};
use indicator_led::error::{BoardError, ENODEV};
use indicator_led::pins;

use super::log_capture;

const DEVKIT: &str = include_str!("../../boards/esp32s3-devkit.json");

const TWO_CHARGERS: &str = r#"{
    "instances": [
        { "name": "main",
          "led":   { "port": 0, "pin": 21 },
          "stat1": { "port": 0, "pin": 4 },
          "stat2": { "port": 0, "pin": 5 } },
        { "name": "aux",
          "led":   { "port": 1, "pin": 2 },
          "stat1": { "port": 1, "pin": 6, "active": "low" },
          "stat2": { "port": 1, "pin": 7, "active": "low" } },
        { "name": "spare", "enabled": false,
          "led":   { "port": 0, "pin": 10 },
          "stat1": { "port": 0, "pin": 11 },
          "stat2": { "port": 0, "pin": 12 } }
    ]
}"#;

#[test]
fn devkit_board_brings_up_one_indicator() {
    log_capture::install();
    let board = BoardConfig::from_json(DEVKIT).unwrap();
    let gpio = SimGpio::new();
    let reg = DeviceRegistry::bring_up(&gpio, &board);

    assert_eq!(reg.len(), 1);
    let dev = reg.get(pins::DEFAULT_INSTANCE).unwrap();
    assert_eq!(dev.status(), 0);
    assert!(log_capture::contains(Level::Info, "indicator: ready"));

    let cfg = pins::default_config();
    gpio.drive(&cfg.stat1, PinState::High);
    gpio.drive(&cfg.stat2, PinState::High);
    assert_eq!(gpio.level(&cfg.led), PinState::High);
}

#[test]
fn mixed_polarity_board() {
    log_capture::install();
    let board = BoardConfig::from_json(TWO_CHARGERS).unwrap();
    let gpio = SimGpio::new();
    let reg = DeviceRegistry::bring_up(&gpio, &board);

    assert_eq!(reg.len(), 2);
    assert_eq!(reg.ready_count(), 2);
    assert!(reg.get("spare").is_none());
    assert!(log_capture::contains(Level::Info, "1 disabled indicator instance(s) skipped"));

    let aux = reg.get("aux").and_then(|d| d.controller()).unwrap();
    let pins = *aux.config();

    // Pulled-up active-low status lines come up deasserted.
    assert_eq!(gpio.physical_level(&pins.stat1), PinState::High);
    assert_eq!(gpio.level(&pins.led), PinState::Low);

    gpio.drive(&pins.stat1, PinState::High);
    assert_eq!(gpio.level(&pins.led), PinState::Low);
    gpio.drive(&pins.stat2, PinState::High);
    assert_eq!(gpio.level(&pins.led), PinState::High);
    assert_eq!(gpio.physical_level(&pins.stat1), PinState::Low);

    // The other instance never saw those edges.
    let main = reg.get("main").and_then(|d| d.controller()).unwrap();
    assert_eq!(gpio.level(&main.config().led), PinState::Low);
}

#[test]
fn offline_port_reports_enodev_and_logs() {
    log_capture::install();
    let board = BoardConfig::from_json(TWO_CHARGERS).unwrap();
    let gpio = SimGpio::new();
    gpio.set_port_ready(1, false);
    let reg = DeviceRegistry::bring_up(&gpio, &board);

    let aux = reg.get("aux").unwrap();
    assert_eq!(aux.status(), -ENODEV);
    assert!(aux.controller().is_none());
    assert!(reg.get("main").unwrap().is_ready());
    assert!(log_capture::contains(Level::Error, "LED GPIO not ready"));
    assert!(log_capture::contains(Level::Error, "aux: init failed (-19)"));
}

#[test]
fn dropping_registry_releases_every_subscription() {
    let board = BoardConfig::from_json(TWO_CHARGERS).unwrap();
    let gpio = SimGpio::new();
    let reg = DeviceRegistry::bring_up(&gpio, &board);
    let stat_pins: Vec<_> = reg
        .devices()
        .filter_map(|d| d.controller())
        .flat_map(|c| [c.config().stat1, c.config().stat2])
        .collect();
    assert_eq!(stat_pins.len(), 4);
    assert!(stat_pins.iter().all(|p| gpio.callback_count(p) == 1));

    drop(reg);
    assert!(stat_pins.iter().all(|p| gpio.callback_count(p) == 0));
}

#[test]
fn rejected_boards() {
    assert_eq!(BoardConfig::from_json("{"), Err(BoardError::Malformed));

    let clash = DEVKIT.replace("\"pin\": 5", "\"pin\": 4");
    assert!(matches!(
        BoardConfig::from_json(&clash),
        Err(BoardError::PinConflict(_))
    ));

    let dup = TWO_CHARGERS.replace("\"aux\"", "\"main\"");
    assert_eq!(
        BoardConfig::from_json(&dup),
        Err(BoardError::DuplicateName)
    );
}

#[test]
fn registry_holds_at_most_the_board_capacity() {
    let mut board = BoardConfig::default();
    for i in 0..MAX_INSTANCES {
        let base = u8::try_from(i * 3).unwrap();
        board
            .push(&format!("led{i}"), ControllerConfig {
                led: PinSpec::active_high(0, base),
                stat1: PinSpec::active_high(0, base + 1),
                stat2: PinSpec::active_high(0, base + 2),
            })
            .unwrap();
    }
    assert_eq!(
        board.push("extra", pins::default_config()),
        Err(BoardError::TooManyInstances)
    );

    let gpio = SimGpio::new();
    let reg = DeviceRegistry::bring_up(&gpio, &board);
    assert_eq!(reg.len(), MAX_INSTANCES);
    assert_eq!(reg.ready_count(), MAX_INSTANCES);
}
