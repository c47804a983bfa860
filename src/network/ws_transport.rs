//! Browser WebSocket transport.
//!
//! Wires the DOM socket's lifecycle callbacks to the manager through the
//! `ChannelEvents` seam. Closures are handed to the JS side with `forget()`;
//! they hold only a weak reference to the event sink, so a torn-down
//! manager is not kept alive by them.

use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, WebSocket};

use super::transport::{ChannelEvents, ChannelHandle, Transport, TransportError};

/// Transport that opens `web_sys::WebSocket` channels.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketTransport;

impl Transport for WebSocketTransport {
    fn open(
        &self,
        url: &str,
        events: Weak<dyn ChannelEvents>,
    ) -> Result<Rc<dyn ChannelHandle>, TransportError> {
        let ws = WebSocket::new(url).map_err(|e| TransportError::Open(format!("{:?}", e)))?;

        let sink = events.clone();
        let onopen = Closure::wrap(Box::new(move |_: web_sys::Event| {
            if let Some(sink) = sink.upgrade() {
                sink.handle_open();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();

        let sink = events.clone();
        let onmessage = Closure::wrap(Box::new(move |event: MessageEvent| {
            // Only text frames carry protocol traffic.
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                if let Some(raw) = text.as_string() {
                    if let Some(sink) = sink.upgrade() {
                        sink.handle_message(&raw);
                    }
                }
            } else {
                warn_log!("received non-text frame, ignoring");
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();

        let sink = events.clone();
        let onclose = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let (code, reason) = match event.dyn_into::<web_sys::CloseEvent>() {
                Ok(close) => (close.code(), close.reason()),
                // No close code available; treat as abnormal.
                Err(_) => (1006, String::new()),
            };
            if let Some(sink) = sink.upgrade() {
                sink.handle_close(code, &reason);
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();

        let sink = events;
        let onerror = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let message = event
                .dyn_ref::<web_sys::ErrorEvent>()
                .map(|e| e.message())
                .unwrap_or_else(|| "websocket error".to_string());
            if let Some(sink) = sink.upgrade() {
                sink.handle_error(&message);
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();

        Ok(Rc::new(BrowserChannel { ws }))
    }
}

/// Handle over one live DOM socket.
struct BrowserChannel {
    ws: WebSocket,
}

impl ChannelHandle for BrowserChannel {
    fn transmit(&self, frame: &str) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        self.ws
            .send_with_str(frame)
            .map_err(|e| TransportError::Send(format!("{:?}", e)))
    }

    fn close(&self, code: u16, reason: &str) {
        if let Err(e) = self.ws.close_with_code_and_reason(code, reason) {
            warn_log!("error sending close: {:?}", e);
        }
    }

    fn is_open(&self) -> bool {
        self.ws.ready_state() == WebSocket::OPEN
    }
}
