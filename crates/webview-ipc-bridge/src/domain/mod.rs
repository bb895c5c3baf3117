//! Domain layer for webview-ipc-bridge.
//!
//! Pure types with no dependencies on I/O, async runtimes, or transports:
//!
//! - Configuration ([`BridgeConfig`])
//! - Identifier types threaded through messages ([`StreamId`], [`CallId`])
//! - Typed payloads the renderer hands to the bridge ([`EventDescriptor`])
//! - One chunk of a chunked transfer ([`StreamChunk`])

pub mod config;
pub mod messages;

pub use config::{BridgeConfig, ConfigError};
pub use messages::{CallId, EventDescriptor, EventFieldInfo, FieldValue, StreamChunk, StreamId};
