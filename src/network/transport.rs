//! Transport seam between the connection manager and the actual channel.
//!
//! The manager drives everything through these traits; the browser
//! WebSocket implementation lives in `ws_transport` and is wasm-only, which
//! leaves the whole state machine testable on the host against a fake.

use std::rc::{Rc, Weak};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open channel: {0}")]
    Open(String),
    #[error("channel is not open")]
    NotOpen,
    #[error("failed to transmit frame: {0}")]
    Send(String),
}

/// Callbacks the transport delivers channel lifecycle events through.
///
/// Held weakly by the transport so a torn-down manager stops receiving
/// events instead of being kept alive by a lingering socket closure.
pub trait ChannelEvents {
    fn handle_open(&self);
    fn handle_message(&self, raw: &str);
    fn handle_close(&self, code: u16, reason: &str);
    fn handle_error(&self, message: &str);
}

/// A live channel instance.
pub trait ChannelHandle {
    /// Transmit a single text frame. Fails when the channel is not open.
    fn transmit(&self, frame: &str) -> Result<(), TransportError>;

    /// Ask the transport to close the channel. The matching close event is
    /// delivered asynchronously through `ChannelEvents::handle_close`.
    fn close(&self, code: u16, reason: &str);

    /// Whether the underlying channel is actually open right now, as opposed
    /// to what the manager last believed.
    fn is_open(&self) -> bool;
}

/// Factory for channels.
pub trait Transport {
    fn open(
        &self,
        url: &str,
        events: Weak<dyn ChannelEvents>,
    ) -> Result<Rc<dyn ChannelHandle>, TransportError>;
}
