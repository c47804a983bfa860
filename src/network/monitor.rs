//! Periodic reconciliation of the live channel against the persisted belief.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::platform::{Scheduler, TimerId};

use super::manager::ConnectionManager;

/// Drives `check_and_reconnect()` on a fixed interval to detect and repair
/// silent staleness, e.g. a channel object that is present but no longer
/// actually open. Ticks while the channel is healthy have zero side effects.
pub struct HealthMonitor {
    manager: Weak<ConnectionManager>,
    scheduler: Rc<dyn Scheduler>,
    interval_ms: u32,
    interval_id: Cell<Option<TimerId>>,
}

impl HealthMonitor {
    pub fn new(
        manager: &Rc<ConnectionManager>,
        scheduler: Rc<dyn Scheduler>,
        interval_ms: u32,
    ) -> Self {
        Self {
            manager: Rc::downgrade(manager),
            scheduler,
            interval_ms,
            interval_id: Cell::new(None),
        }
    }

    /// Start the periodic check. Calling `start` on a running monitor is a
    /// no-op; there is never more than one interval.
    pub fn start(&self) {
        if self.interval_id.get().is_some() {
            return;
        }

        let manager = self.manager.clone();
        let id = self.scheduler.set_interval(
            self.interval_ms,
            Box::new(move || {
                if let Some(manager) = manager.upgrade() {
                    manager.check_and_reconnect();
                }
            }),
        );
        self.interval_id.set(Some(id));
    }

    /// Stop the periodic check so no timer outlives the owning context.
    pub fn stop(&self) {
        if let Some(id) = self.interval_id.take() {
            self.scheduler.clear_interval(id);
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval_id.get().is_some()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
