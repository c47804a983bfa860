// Re-export network modules
pub mod config;
pub mod dispatcher;
pub mod event_types;
pub mod manager;
pub mod monitor;
pub mod navigation;
pub mod policy;
pub mod queue;
pub mod transport;

#[cfg(target_arch = "wasm32")]
pub mod ws_transport;

// Re-export commonly used items
pub use config::WsConfig;
pub use dispatcher::{handler, EventDispatcher, EventHandler};
pub use event_types::{EventKind, InboundEventType};
pub use manager::{ChannelState, ConnectionManager};
pub use monitor::HealthMonitor;
pub use navigation::NavigationGuard;
pub use policy::{ReconnectPolicy, RetryAction};
pub use transport::{ChannelEvents, ChannelHandle, Transport, TransportError};

#[cfg(target_arch = "wasm32")]
pub use ws_transport::WebSocketTransport;
