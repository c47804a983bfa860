use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing key for the publish/subscribe registry.
///
/// The lifecycle events are fixed; `Inbound` carries the discriminant of a
/// server frame's `type` field, so subscribers can register for exactly the
/// payload shapes they understand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Channel reached the open state.
    Connect,
    /// Channel closed, normally or abnormally.
    Disconnect,
    /// Transport-level error; the subsequent close event is authoritative.
    Error,
    /// Any successfully parsed inbound frame.
    Message,
    /// Reconnect attempts are exhausted; no further automatic attempts.
    ReconnectFailed,
    /// Inbound frame with this `type` discriminant.
    Inbound(String),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Connect => write!(f, "connect"),
            EventKind::Disconnect => write!(f, "disconnect"),
            EventKind::Error => write!(f, "error"),
            EventKind::Message => write!(f, "message"),
            EventKind::ReconnectFailed => write!(f, "reconnect_failed"),
            EventKind::Inbound(t) => write!(f, "{}", t),
        }
    }
}

/// Inbound frame discriminants the sync backend is known to emit.
///
/// Only the vocabulary lives here; the payloads are routed opaquely to
/// whichever subscriber registered for them. Anything else arrives as
/// `Unknown` and still fires the generic message event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundEventType {
    PeerConnected,
    PeerDisconnected,
    RepositoryUpdated,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for InboundEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InboundEventType::PeerConnected => "peer_connected",
            InboundEventType::PeerDisconnected => "peer_disconnected",
            InboundEventType::RepositoryUpdated => "repository_updated",
            InboundEventType::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl InboundEventType {
    /// Subscription key for this discriminant.
    pub fn kind(&self) -> EventKind {
        EventKind::Inbound(self.to_string())
    }
}
