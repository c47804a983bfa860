//! Connection configuration.

use crate::constants::{
    HEALTH_CHECK_INTERVAL_MS, MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL_MS, WS_PATH,
};

/// Configuration for the sync channel.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Full URL of the channel endpoint.
    pub url: String,
    /// Consecutive connection attempts allowed before the reconnect policy
    /// becomes terminal for the channel lifetime.
    pub max_reconnect_attempts: u32,
    /// Fixed delay between reconnect attempts.
    pub reconnect_interval_ms: u32,
    /// Period of the health monitor tick.
    pub health_check_interval_ms: u32,
}

impl Default for WsConfig {
    fn default() -> Self {
        let url = page_ws_url().unwrap_or_else(|_| {
            // Sane fallback for unit tests and very early start-up, where no
            // window context exists yet. At runtime the page always provides
            // a location to derive the real endpoint from.
            format!("ws://localhost{}", WS_PATH)
        });

        Self {
            url,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            reconnect_interval_ms: RECONNECT_INTERVAL_MS,
            health_check_interval_ms: HEALTH_CHECK_INTERVAL_MS,
        }
    }
}

impl WsConfig {
    /// Configuration pointing at an explicit endpoint, defaults elsewhere.
    pub fn from_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }
}

/// Derive the channel URL from the page location: same host, fixed `/p2p`
/// path, `wss:` when the page itself is served over TLS.
pub fn page_ws_url() -> Result<String, &'static str> {
    #[cfg(target_arch = "wasm32")]
    {
        let window = web_sys::window().ok_or("no global window exists")?;
        let location = window.location();
        let protocol = location
            .protocol()
            .map_err(|_| "failed to read page protocol")?;
        let host = location.host().map_err(|_| "failed to read page host")?;

        let scheme = if protocol == "https:" { "wss:" } else { "ws:" };
        Ok(format!("{}//{}{}", scheme, host, WS_PATH))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Err("no window context on this target")
    }
}
