//! Platform bring-up of every indicator instance declared by the board.
//!
//! Each enabled [`InstanceConfig`](crate::config::InstanceConfig) is handed
//! to the [`IndicatorLed::init`] factory exactly once.  The registry keeps
//! the resulting controller (if any) together with the integer status the
//! platform reports for the instance: `0` on success, a negative errno
//! otherwise.  A failing instance never prevents the others from coming up.

use log::{error, info, warn};

use crate::app::indicator::IndicatorLed;
use crate::app::ports::GpioPort;
use crate::config::{BoardConfig, MAX_INSTANCES, NAME_CAPACITY};
use crate::error::status_code;

pub struct Device<'g, G: GpioPort + 'static> {
    name: heapless::String<NAME_CAPACITY>,
    status: i32,
    controller: Option<IndicatorLed<'g, G>>,
}

impl<'g, G: GpioPort + 'static> Device<'g, G> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `0` if the instance came up, otherwise the negative init status.
    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.controller.is_some()
    }

    pub fn controller(&self) -> Option<&IndicatorLed<'g, G>> {
        self.controller.as_ref()
    }
}

pub struct DeviceRegistry<'g, G: GpioPort + 'static> {
    devices: heapless::Vec<Device<'g, G>, MAX_INSTANCES>,
}

impl<'g, G: GpioPort + 'static> DeviceRegistry<'g, G> {
    /// Initialise every enabled instance of `board`, in declaration order.
    pub fn bring_up(gpio: &'g G, board: &BoardConfig) -> Self {
        let mut devices: heapless::Vec<Device<'g, G>, MAX_INSTANCES> = heapless::Vec::new();

        for inst in board.enabled() {
            // Unvalidated boards may declare more instances than the table holds.
            if devices.is_full() {
                warn!("{}: registry full, instance not brought up", inst.name);
                continue;
            }

            let result = IndicatorLed::init(gpio, inst.pins());
            let status = status_code(&result);
            if status == 0 {
                info!("{}: ready", inst.name);
            } else {
                error!("{}: init failed ({})", inst.name, status);
            }

            let device = Device {
                name: inst.name.clone(),
                status,
                controller: result.ok(),
            };
            // Capacity checked above.
            let _ = devices.push(device);
        }

        let skipped = board.instances.len() - board.enabled().count();
        if skipped > 0 {
            info!("{} disabled indicator instance(s) skipped", skipped);
        }

        Self { devices }
    }

    pub fn get(&self, name: &str) -> Option<&Device<'g, G>> {
        self.devices.iter().find(|d| d.name() == name)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device<'g, G>> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn ready_count(&self) -> usize {
        self.devices.iter().filter(|d| d.is_ready()).count()
    }
}
