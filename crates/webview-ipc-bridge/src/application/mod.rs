//! Application layer for webview-ipc-bridge.
//!
//! The application layer knows *what* to send, but delegates *how* it is
//! delivered to a [`Transport`] supplied by the infrastructure layer.
//!
//! # Responsibilities
//!
//! - Mapping each application intent onto one message kind ([`IpcSender`])
//! - Splitting large payloads into ordered chunks ([`stream_sender`])
//! - Defining the `Transport` port and the error taxonomy
//!
//! # What does NOT belong here?
//!
//! - Sockets, channels, or any concrete delivery mechanism
//! - Correlating `BeginInvokeDotNet` calls with their replies (the caller's job)

pub mod dispatch;
pub mod error;
pub mod stream_sender;
pub mod transport;

pub use dispatch::{IpcSender, StreamHandle};
pub use error::BridgeError;
pub use stream_sender::{
    send_stream, send_stream_from_reader, CancelFlag, ChunkSink, StreamOptions, StreamReport,
};
pub use transport::{Transport, TransportError};
