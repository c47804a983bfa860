//! Distinguishes app-initiated page transitions from genuine link failures.

use std::rc::Rc;

use crate::constants::{NAV_STATE_KEY, NAV_STATE_VALUE};
use crate::storage::{StateStore, StorageScope};

/// Short-lived, tab-scoped flag set just before an in-app navigation
/// unloads the page. The next page (or the close handler racing the
/// unload) consumes it to decide whether the close was a real failure.
#[derive(Clone)]
pub struct NavigationGuard {
    store: Rc<dyn StateStore>,
}

impl NavigationGuard {
    pub fn new(store: Rc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Mark that the app is about to navigate within itself.
    pub fn mark_navigating(&self) {
        self.store
            .set_item(StorageScope::Tab, NAV_STATE_KEY, NAV_STATE_VALUE);
    }

    /// Read and clear the flag atomically, returning whether it was set.
    pub fn consume_navigating(&self) -> bool {
        let navigating = self
            .store
            .get_item(StorageScope::Tab, NAV_STATE_KEY)
            .as_deref()
            == Some(NAV_STATE_VALUE);
        if navigating {
            self.store.remove_item(StorageScope::Tab, NAV_STATE_KEY);
        }
        navigating
    }
}
