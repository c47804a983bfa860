//! In-memory stand-ins for the browser seams, shared by the unit and
//! lifecycle tests. The scheduler and clock advance together under test
//! control so timer-driven behavior is fully deterministic.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use crate::network::config::WsConfig;
use crate::network::manager::ConnectionManager;
use crate::network::navigation::NavigationGuard;
use crate::network::transport::{ChannelEvents, ChannelHandle, Transport, TransportError};
use crate::platform::{Clock, Scheduler, TimerId};
use crate::storage::{PersistentStateStore, StateStore, StorageScope};

// ----------------------------------------------------------------------
// Clock
// ----------------------------------------------------------------------

pub struct TestClock {
    now: Cell<i64>,
}

impl TestClock {
    pub fn at(now_ms: i64) -> Self {
        Self {
            now: Cell::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

// ----------------------------------------------------------------------
// Scheduler
// ----------------------------------------------------------------------

enum TimerKind {
    Once(Box<dyn FnOnce()>),
    Repeating {
        period_ms: u32,
        callback: Box<dyn FnMut()>,
    },
}

struct TestTimer {
    id: TimerId,
    due: i64,
    kind: TimerKind,
}

/// Manual scheduler. Nothing fires until `advance` is called; due timers
/// fire in due-time order with the clock moved to each firing instant, so
/// callbacks observe consistent wall-clock time.
pub struct TestScheduler {
    clock: Rc<TestClock>,
    next_id: Cell<TimerId>,
    timers: RefCell<Vec<TestTimer>>,
    cancelled: RefCell<HashSet<TimerId>>,
}

impl TestScheduler {
    pub fn new(clock: Rc<TestClock>) -> Self {
        Self {
            clock,
            next_id: Cell::new(1),
            timers: RefCell::new(Vec::new()),
            cancelled: RefCell::new(HashSet::new()),
        }
    }

    fn bump_id(&self) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn cancel(&self, id: TimerId) {
        self.cancelled.borrow_mut().insert(id);
        self.timers.borrow_mut().retain(|t| t.id != id);
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Move time forward, firing everything that falls due. Callbacks may
    /// schedule or cancel further timers; newly scheduled timers that fall
    /// within the window fire in the same pass.
    pub fn advance(&self, delta_ms: u32) {
        let target = self.clock.now_ms() + i64::from(delta_ms);
        loop {
            let next = {
                let timers = self.timers.borrow();
                let mut best: Option<(usize, i64)> = None;
                for (index, timer) in timers.iter().enumerate() {
                    if timer.due <= target && best.map_or(true, |(_, due)| timer.due < due) {
                        best = Some((index, timer.due));
                    }
                }
                best.map(|(index, _)| index)
            };

            let Some(index) = next else { break };
            let mut timer = self.timers.borrow_mut().remove(index);
            if self.clock.now_ms() < timer.due {
                self.clock.set(timer.due);
            }

            match timer.kind {
                TimerKind::Once(callback) => {
                    self.cancelled.borrow_mut().remove(&timer.id);
                    callback();
                }
                TimerKind::Repeating {
                    period_ms,
                    mut callback,
                } => {
                    callback();
                    // The callback may have cleared its own interval.
                    if !self.cancelled.borrow_mut().remove(&timer.id) {
                        timer.due += i64::from(period_ms);
                        self.timers.borrow_mut().push(TestTimer {
                            id: timer.id,
                            due: timer.due,
                            kind: TimerKind::Repeating {
                                period_ms,
                                callback,
                            },
                        });
                    }
                }
            }
        }

        if self.clock.now_ms() < target {
            self.clock.set(target);
        }
    }
}

impl Scheduler for TestScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.bump_id();
        self.timers.borrow_mut().push(TestTimer {
            id,
            due: self.clock.now_ms() + i64::from(delay_ms),
            kind: TimerKind::Once(callback),
        });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.cancel(id);
    }

    fn set_interval(&self, period_ms: u32, callback: Box<dyn FnMut()>) -> TimerId {
        let id = self.bump_id();
        self.timers.borrow_mut().push(TestTimer {
            id,
            due: self.clock.now_ms() + i64::from(period_ms),
            kind: TimerKind::Repeating {
                period_ms,
                callback,
            },
        });
        id
    }

    fn clear_interval(&self, id: TimerId) {
        self.cancel(id);
    }
}

// ----------------------------------------------------------------------
// Storage
// ----------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<(StorageScope, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get_item(&self, scope: StorageScope, key: &str) -> Option<String> {
        self.items.borrow().get(&(scope, key.to_string())).cloned()
    }

    fn set_item(&self, scope: StorageScope, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert((scope, key.to_string()), value.to_string());
    }

    fn remove_item(&self, scope: StorageScope, key: &str) {
        self.items.borrow_mut().remove(&(scope, key.to_string()));
    }
}

// ----------------------------------------------------------------------
// Transport
// ----------------------------------------------------------------------

/// One fake channel per `Transport::open` call. Lifecycle events are fired
/// explicitly by the test, mirroring the asynchronous delivery of the real
/// browser socket.
pub struct FakeChannel {
    open: Cell<bool>,
    pub sent: RefCell<Vec<String>>,
    pub closed_with: Cell<Option<u16>>,
    pub fail_next_transmit: Cell<bool>,
    events: RefCell<Option<Weak<dyn ChannelEvents>>>,
}

impl FakeChannel {
    fn new(events: Weak<dyn ChannelEvents>) -> Self {
        Self {
            open: Cell::new(false),
            sent: RefCell::new(Vec::new()),
            closed_with: Cell::new(None),
            fail_next_transmit: Cell::new(false),
            events: RefCell::new(Some(events)),
        }
    }

    fn events(&self) -> Option<Rc<dyn ChannelEvents>> {
        self.events.borrow().as_ref()?.upgrade()
    }

    /// Server accepted the connection.
    pub fn complete_open(&self) {
        self.open.set(true);
        if let Some(events) = self.events() {
            events.handle_open();
        }
    }

    /// Deliver an inbound text frame.
    pub fn push_frame(&self, raw: &str) {
        if let Some(events) = self.events() {
            events.handle_message(raw);
        }
    }

    /// Deliver the close event with the given code.
    pub fn fire_close(&self, code: u16) {
        self.open.set(false);
        if let Some(events) = self.events() {
            events.handle_close(code, "");
        }
    }

    pub fn fire_error(&self, message: &str) {
        if let Some(events) = self.events() {
            events.handle_error(message);
        }
    }

    /// The socket died without any event reaching the page, i.e. the
    /// silent-staleness case the health monitor exists for.
    pub fn go_silent(&self) {
        self.open.set(false);
    }

    pub fn is_actually_open(&self) -> bool {
        self.open.get()
    }
}

impl ChannelHandle for FakeChannel {
    fn transmit(&self, frame: &str) -> Result<(), TransportError> {
        if self.fail_next_transmit.take() {
            return Err(TransportError::Send("injected failure".into()));
        }
        if !self.open.get() {
            return Err(TransportError::NotOpen);
        }
        self.sent.borrow_mut().push(frame.to_string());
        Ok(())
    }

    fn close(&self, code: u16, _reason: &str) {
        self.open.set(false);
        self.closed_with.set(Some(code));
    }

    fn is_open(&self) -> bool {
        self.open.get()
    }
}

#[derive(Default)]
pub struct FakeTransport {
    channels: RefCell<Vec<Rc<FakeChannel>>>,
    pub fail_next_open: Cell<bool>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.borrow().len()
    }

    pub fn channel(&self, index: usize) -> Rc<FakeChannel> {
        self.channels.borrow()[index].clone()
    }

    pub fn last_channel(&self) -> Rc<FakeChannel> {
        self.channels.borrow().last().cloned().expect("a channel was opened")
    }
}

impl Transport for FakeTransport {
    fn open(
        &self,
        _url: &str,
        events: Weak<dyn ChannelEvents>,
    ) -> Result<Rc<dyn ChannelHandle>, TransportError> {
        if self.fail_next_open.take() {
            return Err(TransportError::Open("injected refusal".into()));
        }
        let channel = Rc::new(FakeChannel::new(events));
        self.channels.borrow_mut().push(channel.clone());
        Ok(channel)
    }
}

// ----------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------

pub struct TestHarness {
    pub manager: Rc<ConnectionManager>,
    pub transport: Rc<FakeTransport>,
    pub scheduler: Rc<TestScheduler>,
    pub clock: Rc<TestClock>,
    pub backing: Rc<MemoryStore>,
    pub store: PersistentStateStore,
    pub nav_guard: NavigationGuard,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(WsConfig::from_url("ws://sync.test/p2p"))
    }

    pub fn with_config(config: WsConfig) -> Self {
        let clock = Rc::new(TestClock::at(1_000_000));
        let scheduler = Rc::new(TestScheduler::new(clock.clone()));
        let backing = Rc::new(MemoryStore::new());
        let store = PersistentStateStore::new(backing.clone(), clock.clone());
        let nav_guard = NavigationGuard::new(backing.clone());
        let transport = Rc::new(FakeTransport::new());
        let manager = ConnectionManager::new(
            config,
            transport.clone(),
            scheduler.clone(),
            store.clone(),
            nav_guard.clone(),
        );

        Self {
            manager,
            transport,
            scheduler,
            clock,
            backing,
            store,
            nav_guard,
        }
    }

    /// Connect and complete the open handshake, returning the live channel.
    pub fn open_channel(&self) -> Rc<FakeChannel> {
        self.manager.connect();
        let channel = self.transport.last_channel();
        channel.complete_open();
        channel
    }
}
