//! Identifier and payload types that flow through the bridge.
//!
//! None of these types are persisted or shared: each is built right before a
//! send and dropped once the frame has been handed to the transport.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Identifiers ───────────────────────────────────────────────────────────────

/// Identifies one chunked-transfer session.
///
/// Every chunk of a transfer carries the same `StreamId`, and the receiver
/// uses it to reassemble the payload.  It must be unique among transfers that
/// are in flight at the same time; the bridge never checks this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh identifier from a random UUID v4.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StreamId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Caller-assigned token correlating a `BeginInvokeDotNet` with its reply.
///
/// The bridge never mints or tracks call ids; it only forwards them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub u64);

impl CallId {
    /// Returns the value placed in the `callId` slot of the frame.
    ///
    /// Zero means "no reply expected" and is sent as `null`; any other id is
    /// sent as its decimal string.  Callers that want a reply must therefore
    /// number their calls from 1.
    pub fn to_wire(self) -> Option<String> {
        (self.0 != 0).then(|| self.0.to_string())
    }
}

impl From<u64> for CallId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ── Browser event payloads ────────────────────────────────────────────────────

/// Identifies which event handler a forwarded UI event is for.
///
/// Serialized with camelCase keys because the receiver deserializes it with
/// its own naming convention:
///
/// ```json
/// {"browserRendererId":0,"eventHandlerId":3,"eventName":"click","eventFieldInfo":null}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDescriptor {
    pub browser_renderer_id: u32,
    pub event_handler_id: u64,
    pub event_name: String,
    /// Present for `change`/`input` events bound to a component field.
    pub event_field_info: Option<EventFieldInfo>,
}

/// The component field an input event updates, and its new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFieldInfo {
    pub component_id: u32,
    pub field_value: FieldValue,
}

/// A bound field value: text inputs send strings, checkboxes send booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}

// ── Chunked transfer ──────────────────────────────────────────────────────────

/// One bounded slice of a chunked transfer, already base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub stream_id: StreamId,
    /// Zero-based position in the transfer.  Implied by send order on the
    /// wire; kept here for logging and tests.
    pub sequence: u64,
    pub data_base64: String,
    /// `true` on exactly one chunk per transfer: the final one.
    pub is_last: bool,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
