//! The connection manager: owns the single channel, drives its state
//! machine, and absorbs transport failures into the reconnect policy and
//! the outbound queue.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{json, Value};

use crate::constants::NORMAL_CLOSURE_CODE;
use crate::platform::{Scheduler, TimerId};
use crate::storage::PersistentStateStore;

use super::config::WsConfig;
use super::dispatcher::{EventDispatcher, EventHandler};
use super::event_types::EventKind;
use super::navigation::NavigationGuard;
use super::policy::{ReconnectPolicy, RetryAction};
use super::queue::MessageQueue;
use super::transport::{ChannelEvents, ChannelHandle, Transport};

/// Lifecycle of the single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Idle => write!(f, "Idle"),
            ChannelState::Connecting => write!(f, "Connecting"),
            ChannelState::Open => write!(f, "Open"),
            ChannelState::Closing => write!(f, "Closing"),
            ChannelState::Closed => write!(f, "Closed"),
        }
    }
}

/// Owns the one live channel per process.
///
/// All mutation happens on the single event-loop thread; the only
/// concurrency control needed is the state check at the top of `connect()`
/// and at each transport callback. Collaborators are constructor-supplied,
/// so nothing here reaches for ambient global state.
pub struct ConnectionManager {
    config: WsConfig,
    policy: ReconnectPolicy,
    transport: Rc<dyn Transport>,
    scheduler: Rc<dyn Scheduler>,
    store: PersistentStateStore,
    nav_guard: NavigationGuard,

    state: Cell<ChannelState>,
    channel: RefCell<Option<Rc<dyn ChannelHandle>>>,
    queue: RefCell<MessageQueue>,
    dispatcher: EventDispatcher,
    reconnect_attempts: Cell<u32>,
    reconnect_timer: Cell<Option<TimerId>>,
    weak_self: Weak<ConnectionManager>,
}

impl ConnectionManager {
    pub fn new(
        config: WsConfig,
        transport: Rc<dyn Transport>,
        scheduler: Rc<dyn Scheduler>,
        store: PersistentStateStore,
        nav_guard: NavigationGuard,
    ) -> Rc<Self> {
        let policy =
            ReconnectPolicy::new(config.max_reconnect_attempts, config.reconnect_interval_ms);
        Rc::new_cyclic(|weak| Self {
            config,
            policy,
            transport,
            scheduler,
            store,
            nav_guard,
            state: Cell::new(ChannelState::Idle),
            channel: RefCell::new(None),
            queue: RefCell::new(MessageQueue::new()),
            dispatcher: EventDispatcher::new(),
            reconnect_attempts: Cell::new(0),
            reconnect_timer: Cell::new(None),
            weak_self: weak.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Public surface
    // ------------------------------------------------------------------

    /// Open the channel. No-op while a connection attempt is in flight or
    /// the live channel is actually open; the check inspects the channel
    /// itself rather than a separate flag so there is no divergent truth.
    pub fn connect(&self) {
        if self.state.get() == ChannelState::Connecting || self.channel_is_open() {
            debug_log!("connect(): channel already {}, skipping", self.state.get());
            return;
        }
        // A manual connect starts a fresh channel lifetime.
        self.reconnect_attempts.set(0);
        self.cancel_pending_reconnect();
        self.start_connect();
    }

    /// Transmit `payload` immediately when the channel is open, otherwise
    /// queue it for the next successful open. Returns `true` only on
    /// immediate transmission. Disconnection is absorbed here, never
    /// surfaced as an error.
    pub fn send(&self, payload: &Value) -> bool {
        // String payloads go out as-is; everything else is serialized.
        let frame = match payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if self.state.get() == ChannelState::Open {
            let channel = self.channel.borrow().as_ref().cloned();
            if let Some(channel) = channel {
                match channel.transmit(&frame) {
                    Ok(()) => return true,
                    Err(e) => warn_log!("transmit failed, queuing frame: {}", e),
                }
            }
        } else {
            debug_log!("channel not open, queuing outbound frame");
        }

        self.queue.borrow_mut().enqueue(frame);
        false
    }

    /// Close the channel deliberately. Persists the disconnected belief
    /// right away and cancels any pending scheduled reconnect, so a manual
    /// disconnect can never be undone by a timer from an earlier abnormal
    /// close.
    pub fn disconnect(&self) {
        self.cancel_pending_reconnect();

        let channel = self.channel.borrow_mut().take();
        if let Some(channel) = channel {
            debug_log!("closing channel");
            self.state.set(ChannelState::Closing);
            channel.close(NORMAL_CLOSURE_CODE, "client disconnect");
        }

        self.state.set(ChannelState::Closed);
        self.store.write_belief(false);
    }

    /// Reconcile the live channel against the persisted belief. Invoked by
    /// the health monitor on every tick and exposed for manual triggering;
    /// idempotent while the channel is open.
    pub fn check_and_reconnect(&self) {
        if self.channel_is_open() {
            return;
        }

        let belief = self.store.read_belief();
        if belief.connected {
            debug_log!("persisted state says connected, re-establishing channel");
            self.reconcile_connect();
        } else if self.state.get() != ChannelState::Connecting {
            debug_log!("no valid persisted state, establishing fresh channel");
            self.reconcile_connect();
        }
    }

    /// Register `handler` for `kind` events.
    pub fn on(&self, kind: EventKind, handler: EventHandler) {
        self.dispatcher.on(kind, handler);
    }

    /// Remove a single handler, or all handlers for `kind` when `None`.
    pub fn off(&self, kind: &EventKind, handler: Option<&EventHandler>) {
        self.dispatcher.off(kind, handler);
    }

    /// Drop all frames still waiting for an open channel.
    pub fn clear_queue(&self) {
        self.queue.borrow_mut().clear();
    }

    pub fn state(&self) -> ChannelState {
        self.state.get()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.borrow().len()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn channel_is_open(&self) -> bool {
        self.channel
            .borrow()
            .as_ref()
            .map_or(false, |channel| channel.is_open())
    }

    /// Connect without touching the retry budget. The reconcile path runs
    /// on every monitor tick; only a manual `connect()` or a successful
    /// open may reset the counter, otherwise a sustained outage would
    /// never reach the terminal event.
    fn reconcile_connect(&self) {
        if self.state.get() == ChannelState::Connecting || self.channel_is_open() {
            return;
        }
        if self.reconnect_attempts.get() >= self.policy.max_attempts() {
            debug_log!("retry budget exhausted, waiting for a manual connect");
            return;
        }
        self.start_connect();
    }

    fn start_connect(&self) {
        debug_log!("opening channel to {}", self.config.url);
        self.state.set(ChannelState::Connecting);

        let events: Weak<dyn ChannelEvents> = self.weak_self.clone();
        match self.transport.open(&self.config.url, events) {
            Ok(channel) => {
                *self.channel.borrow_mut() = Some(channel);
            }
            Err(e) => {
                // Construction failure is a transient transport fault, same
                // as an abnormal close.
                error_log!("failed to open channel: {}", e);
                self.state.set(ChannelState::Closed);
                self.consult_reconnect_policy();
            }
        }
    }

    /// Entry point of the scheduled retry timer.
    fn retry_connect(&self) {
        self.reconnect_timer.set(None);
        if self.state.get() == ChannelState::Connecting || self.channel_is_open() {
            return;
        }
        debug_log!(
            "reconnect attempt {}/{}",
            self.reconnect_attempts.get(),
            self.policy.max_attempts()
        );
        self.start_connect();
    }

    fn consult_reconnect_policy(&self) {
        match self.policy.next_action(self.reconnect_attempts.get()) {
            RetryAction::Retry { attempt, delay_ms } => {
                self.reconnect_attempts.set(attempt);
                self.cancel_pending_reconnect();

                let weak = self.weak_self.clone();
                let id = self.scheduler.set_timeout(
                    delay_ms,
                    Box::new(move || {
                        if let Some(manager) = weak.upgrade() {
                            manager.retry_connect();
                        }
                    }),
                );
                self.reconnect_timer.set(Some(id));
            }
            RetryAction::GiveUp => {
                // Terminal exactly once per channel lifetime; a repeat
                // consult on an already-exhausted budget stays silent.
                if self.reconnect_attempts.get() >= self.policy.max_attempts() {
                    return;
                }
                error_log!(
                    "giving up after {} connection attempts",
                    self.policy.max_attempts()
                );
                self.reconnect_attempts.set(self.policy.max_attempts());
                self.cancel_pending_reconnect();
                self.dispatcher
                    .dispatch(&EventKind::ReconnectFailed, &Value::Null);
            }
        }
    }

    fn cancel_pending_reconnect(&self) {
        if let Some(id) = self.reconnect_timer.take() {
            self.scheduler.clear_timeout(id);
        }
    }

    /// Flush queued frames in strict enqueue order. Each frame leaves the
    /// queue atomically with its transmission; a failed transmit puts the
    /// frame back at the front and stops the flush.
    fn flush_queue(&self) {
        loop {
            let frame = match self.queue.borrow_mut().dequeue() {
                Some(frame) => frame,
                None => return,
            };

            let channel = self.channel.borrow().as_ref().cloned();
            let result = match channel {
                Some(channel) => channel.transmit(&frame),
                None => Err(super::transport::TransportError::NotOpen),
            };

            if let Err(e) = result {
                warn_log!("flush interrupted, re-queuing frame: {}", e);
                self.queue.borrow_mut().requeue_front(frame);
                return;
            }
        }
    }

    fn on_channel_open(&self) {
        debug_log!("channel open");
        self.state.set(ChannelState::Open);
        self.reconnect_attempts.set(0);
        // A retry timer may have raced a connect that just succeeded.
        self.cancel_pending_reconnect();

        self.flush_queue();
        self.store.write_belief(true);
        self.dispatcher.dispatch(&EventKind::Connect, &Value::Null);
    }

    fn on_channel_message(&self, raw: &str) {
        let payload = match serde_json::from_str::<Value>(raw) {
            Ok(payload) => payload,
            Err(e) => {
                // A malformed frame is not a connection fault: drop it and
                // leave the channel alone.
                warn_log!("dropping unparsable frame: {}", e);
                return;
            }
        };

        if let Some(discriminant) = payload.get("type").and_then(Value::as_str) {
            self.dispatcher
                .dispatch(&EventKind::Inbound(discriminant.to_string()), &payload);
        }
        self.dispatcher.dispatch(&EventKind::Message, &payload);
    }

    fn on_channel_close(&self, code: u16, reason: &str) {
        debug_log!("channel closed: {} {}", code, reason);
        self.state.set(ChannelState::Closed);
        self.channel.borrow_mut().take();

        self.dispatcher.dispatch(
            &EventKind::Disconnect,
            &json!({ "code": code, "reason": reason }),
        );

        // A close caused by an in-app navigation keeps the optimistic
        // belief so the next page reconnects quickly.
        if !self.nav_guard.consume_navigating() {
            self.store.write_belief(false);
        }

        if code != NORMAL_CLOSURE_CODE {
            self.consult_reconnect_policy();
        }
    }

    fn on_channel_error(&self, message: &str) {
        warn_log!("channel error: {}", message);
        // The close event that follows is authoritative; only notify.
        self.dispatcher
            .dispatch(&EventKind::Error, &json!({ "message": message }));
    }
}

impl ChannelEvents for ConnectionManager {
    fn handle_open(&self) {
        self.on_channel_open();
    }

    fn handle_message(&self, raw: &str) {
        self.on_channel_message(raw);
    }

    fn handle_close(&self, code: u16, reason: &str) {
        self.on_channel_close(code, reason);
    }

    fn handle_error(&self, message: &str) {
        self.on_channel_error(message);
    }
}
