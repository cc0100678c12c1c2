//! Thread-local capturing logger.
//!
//! The test harness runs every test on its own thread, and the simulated
//! port fires edge handlers synchronously on the driving thread, so a
//! per-thread record buffer sees exactly the diagnostics of one test.

use std::cell::RefCell;
use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|r| {
            r.borrow_mut()
                .push((record.level(), record.args().to_string()));
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Install the logger (once per process) and clear this thread's buffer.
pub fn install() {
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });
    clear();
}

pub fn clear() {
    RECORDS.with(|r| r.borrow_mut().clear());
}

pub fn records() -> Vec<(Level, String)> {
    RECORDS.with(|r| r.borrow().clone())
}

pub fn count(level: Level) -> usize {
    records().iter().filter(|(l, _)| *l == level).count()
}

pub fn contains(level: Level, needle: &str) -> bool {
    records()
        .iter()
        .any(|(l, msg)| *l == level && msg.contains(needle))
}
