//! webview-ipc-bridge library crate.
//!
//! This crate is the page-side half of a WebView bridge: it turns
//! application intents ("the page attached", "a render batch finished",
//! "here is a 40 MB file") into string frames and hands them to whatever
//! delivery mechanism the host environment provides.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Application / renderer events
//!         ↓
//! [webview-ipc-bridge]
//!   ├── domain/           Pure types: BridgeConfig, StreamId, CallId, EventDescriptor
//!   ├── application/      IpcSender facade, chunked stream sender, Transport port
//!   └── infrastructure/
//!         ├── channel_transport/  frames → tokio mpsc (host message pump)
//!         └── ws_transport/       frames → WebSocket text messages
//!         ↓
//! Native host (decodes with webview_ipc_core::deserialize_message)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `webview-ipc-core`; it defines the
//!   [`application::Transport`] trait but never implements it.
//! - `infrastructure` implements `Transport` on top of `tokio` and
//!   `tokio-tungstenite`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use webview_ipc_bridge::application::IpcSender;
//! use webview_ipc_bridge::domain::BridgeConfig;
//! use webview_ipc_bridge::infrastructure::ChannelTransport;
//!
//! let (transport, mut frames) = ChannelTransport::new();
//! let sender = IpcSender::new(Arc::new(transport), BridgeConfig::default());
//!
//! sender.send_attach_page("https://a/", "https://a/start").unwrap();
//! assert_eq!(
//!     frames.try_recv().unwrap(),
//!     r#"__bwv:["AttachPage","https://a/","https://a/start"]"#
//! );
//! ```

/// Domain layer: configuration and identifier types (no I/O).
pub mod domain;

/// Application layer: dispatch facade and chunked streaming.
pub mod application;

/// Infrastructure layer: concrete transports.
pub mod infrastructure;
