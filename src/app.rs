//! Browser bootstrap: builds the one `SyncContext` for the page and wires
//! it to the page lifecycle (load, visibility, unload, in-app navigation).

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::constants::{
    MONITOR_STARTUP_DELAY_MS, RECONNECT_CHECK_AFTER_NAV_MS, RECONNECT_CHECK_FRESH_LOAD_MS,
};
use crate::context::SyncContext;
use crate::network::{ChannelState, WsConfig};

thread_local! {
    // The page's single context, created by `setup_persistent_connection`
    // and kept alive for the page lifetime.
    static SYNC_CONTEXT: RefCell<Option<Rc<SyncContext>>> = RefCell::new(None);
}

fn with_context<F: FnOnce(&Rc<SyncContext>)>(f: F) {
    SYNC_CONTEXT.with(|slot| {
        if let Some(ctx) = slot.borrow().as_ref() {
            f(ctx);
        } else {
            warn_log!("connection context not initialized yet");
        }
    });
}

/// Create the page's connection context and start the persistent-connection
/// machinery. Idempotent; the second and later calls are no-ops.
pub fn setup_persistent_connection() -> Result<(), JsValue> {
    let already_set_up = SYNC_CONTEXT.with(|slot| slot.borrow().is_some());
    if already_set_up {
        return Ok(());
    }

    let ctx = Rc::new(SyncContext::new_browser(WsConfig::default()));

    // Seed the tab session before anything reads or persists a belief.
    let session = ctx.store.get_session();
    debug_log!("sync session {}", session.session_id);

    // First reconcile happens shortly after load. After an in-app
    // navigation the previous page left an optimistic belief behind, so
    // check sooner than on a cold load.
    let first_check_delay = if ctx.nav_guard.consume_navigating() {
        RECONNECT_CHECK_AFTER_NAV_MS
    } else {
        RECONNECT_CHECK_FRESH_LOAD_MS
    };
    {
        let manager = ctx.manager.clone();
        ctx.scheduler.set_timeout(
            first_check_delay,
            Box::new(move || manager.check_and_reconnect()),
        );
    }

    // The monitor starts after the initial check has had a chance to run.
    {
        let monitor = ctx.monitor.clone();
        ctx.scheduler
            .set_timeout(MONITOR_STARTUP_DELAY_MS, Box::new(move || monitor.start()));
    }

    wire_page_listeners(&ctx)?;

    SYNC_CONTEXT.with(|slot| *slot.borrow_mut() = Some(ctx));
    Ok(())
}

fn wire_page_listeners(ctx: &Rc<SyncContext>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window exists"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document on window"))?;

    // Reconcile as soon as the tab becomes visible again; background tabs
    // get throttled timers and often lose the socket silently.
    let manager = ctx.manager.clone();
    let on_visibility = Closure::wrap(Box::new(move |_: web_sys::Event| {
        let hidden = web_sys::window()
            .and_then(|w| w.document())
            .map_or(true, |d| d.hidden());
        if !hidden {
            manager.check_and_reconnect();
        }
    }) as Box<dyn FnMut(web_sys::Event)>);
    document
        .add_event_listener_with_callback("visibilitychange", on_visibility.as_ref().unchecked_ref())?;
    on_visibility.forget();

    // While unloading, persist an optimistic belief when the channel is
    // still open so the next page reconnects on the fast path, and stop
    // the monitor so its interval does not fire into a dying page.
    let unload_ctx = ctx.clone();
    let on_unload = Closure::wrap(Box::new(move |_: web_sys::Event| {
        if unload_ctx.manager.state() == ChannelState::Open {
            unload_ctx.store.write_belief(true);
        }
        unload_ctx.monitor.stop();
    }) as Box<dyn FnMut(web_sys::Event)>);
    window.add_event_listener_with_callback("beforeunload", on_unload.as_ref().unchecked_ref())?;
    on_unload.forget();

    Ok(())
}

/// Reconcile the channel against the persisted belief right now. Exposed
/// for the host page; the health monitor calls the same operation on its
/// own schedule.
#[wasm_bindgen]
pub fn check_and_reconnect_websocket() {
    with_context(|ctx| ctx.manager.check_and_reconnect());
}

/// Flag the upcoming page transition as an in-app navigation so the close
/// it causes is not mistaken for a connection failure. Call right before
/// changing `window.location`.
#[wasm_bindgen]
pub fn mark_navigating() {
    with_context(|ctx| ctx.nav_guard.mark_navigating());
}
