//! Browser-side connection runtime for the notes sync client.
//!
//! Keeps a single WebSocket channel to the sync server alive across page
//! loads: a connection manager drives the channel state machine, queued
//! outbound frames survive disconnects, a persisted belief in web storage
//! speeds up reconnection after navigation, and a health monitor repairs
//! silently dead sockets. The core is platform-neutral; the browser
//! bindings are gated to the wasm32 target.

#[macro_use]
mod macros;

pub mod constants;
pub mod context;
pub mod network;
pub mod platform;
pub mod storage;

#[cfg(target_arch = "wasm32")]
pub mod app;

#[cfg(test)]
pub(crate) mod test_support;



#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    debug_log!("notes sync frontend starting");
    app::setup_persistent_connection()
}
