//! Fuzz target: `BoardConfig::from_json` followed by registry bring-up.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - An accepted board never exceeds `MAX_INSTANCES`
//! - No accepted instance binds two roles to the same pin
//! - Every enabled instance of an accepted board comes up on a healthy port
//!
//! cargo fuzz run fuzz_board_config

#![no_main]

use libfuzzer_sys::fuzz_target;

use indicator_led::adapters::sim_gpio::SimGpio;
use indicator_led::app::registry::DeviceRegistry;
use indicator_led::config::{BoardConfig, MAX_INSTANCES};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(board) = BoardConfig::from_json(json) else {
        return;
    };

    assert!(board.instances.len() <= MAX_INSTANCES);
    for inst in &board.instances {
        let p = inst.pins();
        assert!(!p.led.same_pin(&p.stat1));
        assert!(!p.led.same_pin(&p.stat2));
        assert!(!p.stat1.same_pin(&p.stat2));
    }

    let gpio = SimGpio::new();
    let registry = DeviceRegistry::bring_up(&gpio, &board);
    assert_eq!(registry.len(), board.enabled().count());
    assert_eq!(registry.ready_count(), registry.len());
});
