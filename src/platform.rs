//! Clock and timer seams for the lifecycle core.
//!
//! Every timing-dependent component takes these as injected collaborators so
//! the staleness window, reconnect delays and health ticks are testable with
//! a controllable clock instead of the real event loop.

/// Identifier for a scheduled timeout or interval, used for cancellation.
pub type TimerId = u32;

/// Wall-clock time source in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Real wall clock. `chrono` with the `wasmbind` feature resolves to
/// `Date.now()` in the browser and the system clock elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// One-shot and repeating timer scheduling.
///
/// Handles returned by `set_timeout`/`set_interval` stay valid until the
/// timer is cleared; clearing an already-fired timeout is a no-op.
pub trait Scheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId;
    fn clear_timeout(&self, id: TimerId);
    fn set_interval(&self, period_ms: u32, callback: Box<dyn FnMut()>) -> TimerId;
    fn clear_interval(&self, id: TimerId);
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserScheduler;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{Scheduler, TimerId};
    use gloo_timers::callback::{Interval, Timeout};
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, HashSet};
    use std::rc::Rc;

    /// Scheduler backed by the browser event loop via `gloo-timers`.
    ///
    /// Handles are kept so timers can be cancelled; dropping a handle clears
    /// the underlying JS timer. A fired timeout's handle must not be dropped
    /// from inside its own callback, so fired ids are only recorded there and
    /// the handles are purged on the next `set_timeout` call.
    pub struct BrowserScheduler {
        next_id: Cell<TimerId>,
        timeouts: RefCell<HashMap<TimerId, Timeout>>,
        intervals: RefCell<HashMap<TimerId, Interval>>,
        fired: Rc<RefCell<HashSet<TimerId>>>,
    }

    impl BrowserScheduler {
        pub fn new() -> Self {
            Self {
                next_id: Cell::new(1),
                timeouts: RefCell::new(HashMap::new()),
                intervals: RefCell::new(HashMap::new()),
                fired: Rc::new(RefCell::new(HashSet::new())),
            }
        }

        fn bump_id(&self) -> TimerId {
            let id = self.next_id.get();
            self.next_id.set(id.wrapping_add(1));
            id
        }

        fn purge_fired(&self) {
            let fired: Vec<TimerId> = self.fired.borrow_mut().drain().collect();
            if !fired.is_empty() {
                let mut timeouts = self.timeouts.borrow_mut();
                for id in fired {
                    timeouts.remove(&id);
                }
            }
        }
    }

    impl Default for BrowserScheduler {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Scheduler for BrowserScheduler {
        fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
            self.purge_fired();
            let id = self.bump_id();
            let fired = self.fired.clone();
            let timeout = Timeout::new(delay_ms, move || {
                callback();
                fired.borrow_mut().insert(id);
            });
            self.timeouts.borrow_mut().insert(id, timeout);
            id
        }

        fn clear_timeout(&self, id: TimerId) {
            self.fired.borrow_mut().remove(&id);
            // Dropping the handle cancels the timer if it hasn't fired.
            self.timeouts.borrow_mut().remove(&id);
        }

        fn set_interval(&self, period_ms: u32, mut callback: Box<dyn FnMut()>) -> TimerId {
            let id = self.bump_id();
            let interval = Interval::new(period_ms, move || callback());
            self.intervals.borrow_mut().insert(id, interval);
            id
        }

        fn clear_interval(&self, id: TimerId) {
            self.intervals.borrow_mut().remove(&id);
        }
    }
}
