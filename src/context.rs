//! Explicit wiring of the connection core.
//!
//! Everything the lifecycle needs is constructed here once and handed to
//! collaborators; there is no ambient global to reach for. The browser
//! variant plugs in the real transport, timers and storage, while tests
//! build a context from in-memory fakes.

use std::rc::Rc;

use crate::network::{ConnectionManager, HealthMonitor, NavigationGuard, Transport, WsConfig};
use crate::platform::{Clock, Scheduler};
use crate::storage::{PersistentStateStore, StateStore};

/// One fully wired connection core: manager, navigation guard, health
/// monitor and the typed persistence layer, all sharing the same injected
/// clock, scheduler and backing store.
pub struct SyncContext {
    pub manager: Rc<ConnectionManager>,
    pub monitor: Rc<HealthMonitor>,
    pub store: PersistentStateStore,
    pub nav_guard: NavigationGuard,
    pub scheduler: Rc<dyn Scheduler>,
}

impl SyncContext {
    pub fn new(
        config: WsConfig,
        transport: Rc<dyn Transport>,
        scheduler: Rc<dyn Scheduler>,
        clock: Rc<dyn Clock>,
        backing: Rc<dyn StateStore>,
    ) -> Self {
        let health_check_interval_ms = config.health_check_interval_ms;
        let store = PersistentStateStore::new(backing.clone(), clock);
        let nav_guard = NavigationGuard::new(backing);
        let manager = ConnectionManager::new(
            config,
            transport,
            scheduler.clone(),
            store.clone(),
            nav_guard.clone(),
        );
        let monitor = Rc::new(HealthMonitor::new(
            &manager,
            scheduler.clone(),
            health_check_interval_ms,
        ));

        Self {
            manager,
            monitor,
            store,
            nav_guard,
            scheduler,
        }
    }

    /// Context backed by the real browser: `WebSocket` transport,
    /// `gloo-timers` scheduling, `sessionStorage`/`localStorage`.
    #[cfg(target_arch = "wasm32")]
    pub fn new_browser(config: WsConfig) -> Self {
        use crate::network::WebSocketTransport;
        use crate::platform::{BrowserScheduler, SystemClock};
        use crate::storage::BrowserStorage;

        Self::new(
            config,
            Rc::new(WebSocketTransport),
            Rc::new(BrowserScheduler::new()),
            Rc::new(SystemClock),
            Rc::new(BrowserStorage),
        )
    }
}
