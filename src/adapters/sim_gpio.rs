//! In-memory GPIO simulation for host builds.
//!
//! Implements [`GpioPort`] without hardware.  Tests drive input levels with
//! [`SimGpio::drive`], which fires registered edge handlers synchronously on
//! the calling thread, the same way a GPIO ISR would preempt the main loop.
//! Every port call is appended to a journal so tests can assert on the exact
//! sequence of configuration steps.
//!
//! Fault injection covers every fallible primitive: controller readiness,
//! direction and interrupt configuration, callback registration, reads and
//! writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::PinState;

use crate::app::ports::{CallbackId, EdgeHandler, EdgeMode, GpioPort, PinMode};
use crate::config::{ActiveLevel, PinSpec};
use crate::error::{ENOTSUP, GpioError};

type SharedHandler = Arc<dyn Fn(&SimGpio) + Send + Sync + 'static>;

/// One recorded port call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioCall {
    IsReady(PinSpec),
    Configure(PinSpec, PinMode),
    ConfigureInterrupt(PinSpec, EdgeMode),
    Read(PinSpec),
    Write(PinSpec, PinState),
    AddCallback(PinSpec),
    RemoveCallback(CallbackId),
}

#[derive(Debug, Clone, Copy)]
struct SimPin {
    physical: PinState,
    /// Set once a test drives the line; a pull-up no longer decides it.
    driven: bool,
    mode: Option<PinMode>,
    edge: EdgeMode,
    configure_fault: Option<GpioError>,
    interrupt_fault: Option<GpioError>,
    callback_fault: Option<GpioError>,
    read_fault: Option<GpioError>,
    write_fault: Option<GpioError>,
}

impl Default for SimPin {
    fn default() -> Self {
        Self {
            physical: PinState::Low,
            driven: false,
            mode: None,
            edge: EdgeMode::Disabled,
            configure_fault: None,
            interrupt_fault: None,
            callback_fault: None,
            read_fault: None,
            write_fault: None,
        }
    }
}

struct Registration {
    id: CallbackId,
    key: (u8, u8),
    handler: SharedHandler,
}

#[derive(Default)]
struct SimState {
    not_ready_ports: Vec<u8>,
    pins: HashMap<(u8, u8), SimPin>,
    handlers: Vec<Registration>,
    next_id: u32,
    journal: Vec<GpioCall>,
}

fn key(pin: &PinSpec) -> (u8, u8) {
    (pin.port, pin.pin)
}

/// Simulated GPIO controller bank.  Every port is ready unless told otherwise.
#[derive(Default)]
pub struct SimGpio {
    state: Mutex<SimState>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        // A panicking test must not cascade into unrelated lock failures.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_pin<R>(&self, pin: &PinSpec, f: impl FnOnce(&mut SimPin) -> R) -> R {
        let mut st = self.state();
        f(st.pins.entry(key(pin)).or_default())
    }

    // ── Fault injection ───────────────────────────────────────

    pub fn set_port_ready(&self, port: u8, ready: bool) {
        let mut st = self.state();
        st.not_ready_ports.retain(|&p| p != port);
        if !ready {
            st.not_ready_ports.push(port);
        }
    }

    pub fn fail_configure(&self, pin: &PinSpec, code: i32) {
        self.with_pin(pin, |p| p.configure_fault = Some(GpioError::new(code)));
    }

    pub fn fail_interrupt(&self, pin: &PinSpec, code: i32) {
        self.with_pin(pin, |p| p.interrupt_fault = Some(GpioError::new(code)));
    }

    pub fn fail_callback(&self, pin: &PinSpec, code: i32) {
        self.with_pin(pin, |p| p.callback_fault = Some(GpioError::new(code)));
    }

    /// Make reads of `pin` fail with `code`, or succeed again with `None`.
    pub fn fail_read(&self, pin: &PinSpec, code: Option<i32>) {
        self.with_pin(pin, |p| p.read_fault = code.map(GpioError::new));
    }

    pub fn fail_write(&self, pin: &PinSpec, code: Option<i32>) {
        self.with_pin(pin, |p| p.write_fault = code.map(GpioError::new));
    }

    // ── Stimulus ──────────────────────────────────────────────

    /// Drive `pin` externally to the logical `level`.
    ///
    /// If the transition matches the pin's armed edge mode, every handler
    /// subscribed to the pin runs before this returns.  Returns the number
    /// of handlers invoked.
    pub fn drive(&self, pin: &PinSpec, level: PinState) -> usize {
        let handlers: Vec<SharedHandler> = {
            let mut st = self.state();
            let sim = st.pins.entry(key(pin)).or_default();
            let before = pin.to_logical(sim.physical);
            sim.physical = pin.to_physical(level);
            sim.driven = true;
            if !sim.edge.fires(before, level) {
                return 0;
            }
            st.handlers
                .iter()
                .filter(|r| r.key == key(pin))
                .map(|r| Arc::clone(&r.handler))
                .collect()
        };

        // Lock released: handlers call back into the port.
        for handler in &handlers {
            handler(self);
        }
        handlers.len()
    }

    // ── Inspection ────────────────────────────────────────────

    /// Current logical level of `pin`.
    pub fn level(&self, pin: &PinSpec) -> PinState {
        self.with_pin(pin, |p| pin.to_logical(p.physical))
    }

    /// Current electrical level of `pin`.
    pub fn physical_level(&self, pin: &PinSpec) -> PinState {
        self.with_pin(pin, |p| p.physical)
    }

    pub fn mode(&self, pin: &PinSpec) -> Option<PinMode> {
        self.with_pin(pin, |p| p.mode)
    }

    pub fn edge(&self, pin: &PinSpec) -> EdgeMode {
        self.with_pin(pin, |p| p.edge)
    }

    pub fn callback_count(&self, pin: &PinSpec) -> usize {
        self.state()
            .handlers
            .iter()
            .filter(|r| r.key == key(pin))
            .count()
    }

    pub fn journal(&self) -> Vec<GpioCall> {
        self.state().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state().journal.clear();
    }

    /// Number of writes to `pin` recorded since the journal was last cleared.
    pub fn write_count(&self, pin: &PinSpec) -> usize {
        self.state()
            .journal
            .iter()
            .filter(|c| matches!(c, GpioCall::Write(p, _) if p.same_pin(pin)))
            .count()
    }
}

impl GpioPort for SimGpio {
    fn is_ready(&self, pin: &PinSpec) -> bool {
        let mut st = self.state();
        st.journal.push(GpioCall::IsReady(*pin));
        !st.not_ready_ports.contains(&pin.port)
    }

    fn configure(&self, pin: &PinSpec, mode: PinMode) -> Result<(), GpioError> {
        let mut st = self.state();
        st.journal.push(GpioCall::Configure(*pin, mode));
        let sim = st.pins.entry(key(pin)).or_default();
        if let Some(e) = sim.configure_fault {
            return Err(e);
        }
        sim.mode = Some(mode);
        match mode {
            // Pulled up: an undriven open-drain status line idles deasserted.
            PinMode::Input if pin.active == ActiveLevel::Low && !sim.driven => {
                sim.physical = PinState::High;
            }
            PinMode::Input => {}
            PinMode::OutputInactive => sim.physical = pin.to_physical(PinState::Low),
        }
        Ok(())
    }

    fn configure_interrupt(&self, pin: &PinSpec, edge: EdgeMode) -> Result<(), GpioError> {
        let mut st = self.state();
        st.journal.push(GpioCall::ConfigureInterrupt(*pin, edge));
        let sim = st.pins.entry(key(pin)).or_default();
        if let Some(e) = sim.interrupt_fault {
            return Err(e);
        }
        sim.edge = edge;
        Ok(())
    }

    fn read(&self, pin: &PinSpec) -> Result<PinState, GpioError> {
        let mut st = self.state();
        st.journal.push(GpioCall::Read(*pin));
        let sim = st.pins.entry(key(pin)).or_default();
        match sim.read_fault {
            Some(e) => Err(e),
            None => Ok(pin.to_logical(sim.physical)),
        }
    }

    fn write(&self, pin: &PinSpec, level: PinState) -> Result<(), GpioError> {
        let mut st = self.state();
        st.journal.push(GpioCall::Write(*pin, level));
        let sim = st.pins.entry(key(pin)).or_default();
        if let Some(e) = sim.write_fault {
            return Err(e);
        }
        if !sim.mode.is_some_and(PinMode::is_output) {
            return Err(GpioError::new(-ENOTSUP));
        }
        sim.physical = pin.to_physical(level);
        Ok(())
    }

    fn add_callback(
        &self,
        pin: &PinSpec,
        handler: EdgeHandler<Self>,
    ) -> Result<CallbackId, GpioError> {
        let mut st = self.state();
        st.journal.push(GpioCall::AddCallback(*pin));
        if let Some(e) = st.pins.entry(key(pin)).or_default().callback_fault {
            return Err(e);
        }
        st.next_id += 1;
        let id = CallbackId(st.next_id);
        st.handlers.push(Registration {
            id,
            key: key(pin),
            handler: Arc::from(handler),
        });
        Ok(id)
    }

    fn remove_callback(&self, id: CallbackId) {
        let mut st = self.state();
        st.journal.push(GpioCall::RemoveCallback(id));
        st.handlers.retain(|r| r.id != id);
    }
}
