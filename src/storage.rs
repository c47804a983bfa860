//! Durable cross-reload key/value storage and the records kept in it.
//!
//! Two scopes exist: tab-scoped storage ends with the browser tab and holds
//! the session identity plus the navigation flag; origin-scoped storage
//! survives reloads and in-app navigation and holds the connection belief.
//! The backing store is injected so the staleness policy can be unit-tested
//! with a controllable clock.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{BELIEF_KEY, BELIEF_STALENESS_MS, SESSION_KEY};
use crate::platform::Clock;

/// Which of the two storage scopes a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Cleared when the tab closes (`sessionStorage`).
    Tab,
    /// Survives reload and navigation, shared across tabs of the same
    /// origin (`localStorage`).
    Origin,
}

/// Raw key/value storage. Implementations must not fail loudly: a broken
/// backing store degrades to "nothing persisted" rather than propagating.
pub trait StateStore {
    fn get_item(&self, scope: StorageScope, key: &str) -> Option<String>;
    fn set_item(&self, scope: StorageScope, key: &str, value: &str);
    fn remove_item(&self, scope: StorageScope, key: &str);
}

/// Identity of one browser-tab lifetime. Created once on first access and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub created_at: i64,
}

/// The manager's last-known connection status as seen from outside the
/// in-memory object. Advisory only: a hint to speed up reconnection, never
/// authoritative over the live channel's actual state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedBelief {
    pub connected: bool,
    pub timestamp: i64,
    #[serde(default)]
    pub session_id: String,
}

impl PersistedBelief {
    /// The safe default returned when nothing usable is persisted.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            timestamp: 0,
            session_id: String::new(),
        }
    }
}

impl Default for PersistedBelief {
    fn default() -> Self {
        Self::disconnected()
    }
}

/// Typed view over the raw store: session identity in the tab scope, the
/// connection belief in the origin scope.
#[derive(Clone)]
pub struct PersistentStateStore {
    store: Rc<dyn StateStore>,
    clock: Rc<dyn Clock>,
}

impl PersistentStateStore {
    pub fn new(store: Rc<dyn StateStore>, clock: Rc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the existing session, creating and persisting a new one the
    /// first time a tab asks. Idempotent after the first call.
    pub fn get_session(&self) -> Session {
        if let Some(raw) = self.store.get_item(StorageScope::Tab, SESSION_KEY) {
            if let Ok(session) = serde_json::from_str::<Session>(&raw) {
                return session;
            }
            warn_log!("discarding unreadable session record");
        }

        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            created_at: self.clock.now_ms(),
        };
        if let Ok(raw) = serde_json::to_string(&session) {
            self.store.set_item(StorageScope::Tab, SESSION_KEY, &raw);
        }
        session
    }

    /// Returns the last persisted belief, or the disconnected default when
    /// nothing is stored, the record is corrupt, or it is older than the
    /// staleness window. Malformed JSON never escapes this call.
    pub fn read_belief(&self) -> PersistedBelief {
        let raw = match self.store.get_item(StorageScope::Origin, BELIEF_KEY) {
            Some(raw) => raw,
            None => return PersistedBelief::disconnected(),
        };

        match serde_json::from_str::<PersistedBelief>(&raw) {
            Ok(belief) if self.clock.now_ms() - belief.timestamp < BELIEF_STALENESS_MS => belief,
            Ok(_) => {
                debug_log!("persisted connection state is stale, treating as disconnected");
                PersistedBelief::disconnected()
            }
            Err(e) => {
                warn_log!("failed to parse persisted connection state: {}", e);
                PersistedBelief::disconnected()
            }
        }
    }

    /// Overwrites the belief with the current timestamp and session id.
    pub fn write_belief(&self, connected: bool) {
        let belief = PersistedBelief {
            connected,
            timestamp: self.clock.now_ms(),
            session_id: self.get_session().session_id,
        };
        if let Ok(raw) = serde_json::to_string(&belief) {
            self.store.set_item(StorageScope::Origin, BELIEF_KEY, &raw);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserStorage;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{StateStore, StorageScope};

    /// `sessionStorage`/`localStorage` backed store. Storage access can be
    /// denied (private browsing, quota); all failures degrade to absent
    /// values with a console warning.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct BrowserStorage;

    impl BrowserStorage {
        fn backing(&self, scope: StorageScope) -> Option<web_sys::Storage> {
            let window = web_sys::window()?;
            let result = match scope {
                StorageScope::Tab => window.session_storage(),
                StorageScope::Origin => window.local_storage(),
            };
            result.ok().flatten()
        }
    }

    impl StateStore for BrowserStorage {
        fn get_item(&self, scope: StorageScope, key: &str) -> Option<String> {
            self.backing(scope)?.get_item(key).ok().flatten()
        }

        fn set_item(&self, scope: StorageScope, key: &str, value: &str) {
            match self.backing(scope) {
                Some(storage) => {
                    if let Err(e) = storage.set_item(key, value) {
                        warn_log!("storage write for {} failed: {:?}", key, e);
                    }
                }
                None => warn_log!("storage unavailable, dropping write for {}", key),
            }
        }

        fn remove_item(&self, scope: StorageScope, key: &str) {
            if let Some(storage) = self.backing(scope) {
                let _ = storage.remove_item(key);
            }
        }
    }
}
