//! # webview-ipc-core
//!
//! Shared protocol library for the WebView IPC bridge: the message codec and
//! the byte transfer encoding used to move data between a native host process
//! and an embedded web rendering surface.
//!
//! This crate has zero dependencies on async runtimes, sockets, or UI
//! frameworks.  It only turns typed values into strings and back.
//!
//! # Architecture overview (for beginners)
//!
//! A WebView exposes exactly one way to talk to its host: a function that
//! accepts a single string.  Everything the page wants to tell the host (a
//! render batch finished, a button was clicked, here is a file) must be
//! squeezed through that one string-shaped hole.
//!
//! This crate defines how that squeezing works:
//!
//! - **`protocol::messages`** – The closed set of message kinds
//!   ([`MessageKind`]), the argument values they carry ([`Arg`]), and the
//!   positional contract each kind enforces.
//!
//! - **`protocol::codec`** – Serializes a `(kind, args)` pair into a frame
//!   like `__bwv:["AttachPage","https://a/","https://a/start"]` and decodes it
//!   back again.
//!
//! - **`protocol::encoding`** – Standard base64 for binary buffers, so bytes
//!   can travel inside a JSON string.

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `webview_ipc_core::serialize_message` instead of the full module path.
pub use protocol::codec::{deserialize_message, serialize_message, CodecError};
pub use protocol::encoding::{base64_decode, base64_encode, EncodingError};
pub use protocol::messages::{Arg, ArgShape, Message, MessageKind, IPC_MESSAGE_PREFIX};
