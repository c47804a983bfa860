// Shared constants - these are the single source of truth for the
// connection lifecycle defaults and persisted storage layout.

/// Fixed path of the sync channel endpoint.
pub const WS_PATH: &str = "/p2p";

/// Normal-closure code used by an explicit `disconnect()`. Any other close
/// code counts as an abnormal close and is handed to the reconnect policy.
pub const NORMAL_CLOSURE_CODE: u16 = 1000;

/// Fixed delay between reconnect attempts.
pub const RECONNECT_INTERVAL_MS: u32 = 5_000;

/// Consecutive connection attempts allowed before the policy goes terminal.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Period of the health monitor's reconciliation tick.
pub const HEALTH_CHECK_INTERVAL_MS: u32 = 5_000;

/// A persisted belief older than this is treated as disconnected.
pub const BELIEF_STALENESS_MS: i64 = 30 * 60 * 1000;

// Persisted storage keys. The belief record is origin-scoped so it survives
// reloads and is shared across tabs; session and navigation state are
// tab-scoped and end with the tab.
pub const BELIEF_KEY: &str = "notes-sync-websocket-state";
pub const SESSION_KEY: &str = "notes-sync-websocket-session";
pub const NAV_STATE_KEY: &str = "notes-sync-nav-state";
pub const NAV_STATE_VALUE: &str = "navigating";

/// Startup delay before the first `check_and_reconnect()` after an in-app
/// navigation; the optimistic belief is still warm, so re-check quickly.
pub const RECONNECT_CHECK_AFTER_NAV_MS: u32 = 100;

/// Startup delay before the first `check_and_reconnect()` on a fresh load.
pub const RECONNECT_CHECK_FRESH_LOAD_MS: u32 = 500;

/// Delay before the health monitor starts ticking, giving page bootstrap a
/// moment to finish.
pub const MONITOR_STARTUP_DELAY_MS: u32 = 1_000;
