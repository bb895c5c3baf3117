//! Infrastructure layer for webview-ipc-bridge.
//!
//! Concrete [`crate::application::Transport`] implementations live here.
//!
//! # Responsibilities
//!
//! - Handing serialized frames to an in-process channel ([`ChannelTransport`])
//! - Writing frames to a WebSocket as text messages ([`WebSocketTransport`])
//! - Spawning the background writer task a socket needs
//!
//! # What does NOT belong here?
//!
//! - Choosing message kinds or argument layouts (that is the application layer)
//! - Chunking payloads (that is `application::stream_sender`)

pub mod channel_transport;
pub mod ws_transport;

pub use channel_transport::ChannelTransport;
pub use ws_transport::WebSocketTransport;
