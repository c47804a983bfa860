//! Typed publish/subscribe registry for connection lifecycle events.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use super::event_types::EventKind;

/// Subscriber callback. Handlers receive the event payload by reference;
/// lifecycle events without a payload receive `Value::Null`.
pub type EventHandler = Rc<RefCell<dyn FnMut(&Value)>>;

/// Wrap a closure into the shared handler form expected by `on`/`off`.
pub fn handler<F>(f: F) -> EventHandler
where
    F: FnMut(&Value) + 'static,
{
    Rc::new(RefCell::new(f))
}

/// Event registry. Multiple handlers per kind are allowed and dispatched in
/// subscription order. A handler that cannot be entered (re-entrant borrow)
/// is skipped with a log entry and never prevents delivery to the rest.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: RefCell<HashMap<EventKind, Vec<EventHandler>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, after any existing handlers.
    pub fn on(&self, kind: EventKind, handler: EventHandler) {
        self.handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(handler);
    }

    /// Remove a specific handler (matched by identity), or all handlers for
    /// `kind` when `handler` is `None`.
    pub fn off(&self, kind: &EventKind, handler: Option<&EventHandler>) {
        let mut handlers = self.handlers.borrow_mut();
        match handler {
            Some(target) => {
                if let Some(list) = handlers.get_mut(kind) {
                    list.retain(|h| !Rc::ptr_eq(h, target));
                    if list.is_empty() {
                        handlers.remove(kind);
                    }
                }
            }
            None => {
                handlers.remove(kind);
            }
        }
    }

    /// Invoke every handler registered for `kind` in subscription order.
    ///
    /// The handler list is cloned out before any user code runs, so handlers
    /// may subscribe or unsubscribe without poisoning the registry borrow.
    pub fn dispatch(&self, kind: &EventKind, payload: &Value) {
        let snapshot: Vec<EventHandler> = match self.handlers.borrow().get(kind) {
            Some(list) => list.to_vec(),
            None => return,
        };

        for handler in snapshot {
            match handler.try_borrow_mut() {
                Ok(mut f) => f(payload),
                Err(_) => warn_log!("skipping re-entrant {} handler", kind),
            }
        }
    }

    #[cfg(test)]
    pub fn handler_count(&self, kind: &EventKind) -> usize {
        self.handlers.borrow().get(kind).map_or(0, Vec::len)
    }
}
