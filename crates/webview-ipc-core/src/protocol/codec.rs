//! JSON frame codec for WebView IPC messages.
//!
//! Wire format:
//! ```text
//! __bwv:[<kind>, <arg0>, <arg1>, ...]
//! ```
//! The prefix is [`IPC_MESSAGE_PREFIX`]; the rest is one JSON array whose
//! first element is the kind's wire name and whose remaining elements are the
//! positional arguments.  Opaque arguments are embedded as JSON, never as an
//! escaped string.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::value::RawValue;
use thiserror::Error;

use crate::protocol::messages::{Arg, Message, MessageKind, IPC_MESSAGE_PREFIX};

/// Errors that can occur while building or reading a frame.
///
/// On the sending side every variant means "this message cannot be put on
/// the wire"; the codec reports it and nothing is sent.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The kind name in a frame is not part of the closed set.
    #[error("unknown message kind: {0:?}")]
    UnknownKind(String),

    /// The argument count does not match the kind's contract.
    #[error("{kind} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        kind: MessageKind,
        expected: usize,
        actual: usize,
    },

    /// An argument has a type the kind's contract does not allow.
    #[error("{kind} argument {position}: expected {expected}, got {found}")]
    ArgTypeMismatch {
        kind: MessageKind,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// NaN and infinities have no JSON representation.
    #[error("number is not representable in JSON: {0}")]
    NonFiniteNumber(f64),

    /// The text does not start with [`IPC_MESSAGE_PREFIX`].
    #[error("frame does not start with the {:?} prefix", IPC_MESSAGE_PREFIX)]
    MissingPrefix,

    /// The frame array is empty or its first element is not a string.
    #[error("frame does not start with a message kind")]
    MissingKind,

    /// `serde_json` could not produce or parse the JSON text.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Serializes `kind` and `args` into a single wire frame.
///
/// The arguments are checked against [`MessageKind::contract`] before any
/// JSON is produced.
///
/// # Errors
///
/// Returns [`CodecError::ArityMismatch`] or [`CodecError::ArgTypeMismatch`]
/// if the arguments break the kind's contract, or [`CodecError::Json`] if
/// serialization itself fails.
///
/// # Examples
///
/// ```rust
/// use webview_ipc_core::{serialize_message, Arg, MessageKind};
///
/// let frame = serialize_message(
///     MessageKind::AttachPage,
///     &[Arg::from("https://a/"), Arg::from("https://a/start")],
/// )
/// .unwrap();
/// assert_eq!(frame, r#"__bwv:["AttachPage","https://a/","https://a/start"]"#);
/// ```
pub fn serialize_message(kind: MessageKind, args: &[Arg]) -> Result<String, CodecError> {
    validate_contract(kind, args)?;

    let json = serde_json::to_string(&WireFrame { kind, args })?;

    let mut frame = String::with_capacity(IPC_MESSAGE_PREFIX.len() + json.len());
    frame.push_str(IPC_MESSAGE_PREFIX);
    frame.push_str(&json);
    Ok(frame)
}

/// Decodes a wire frame back into a [`Message`].
///
/// This is the inverse of [`serialize_message`]: the receiving side uses it to
/// route frames, and tests use it to check what was sent.
///
/// # Errors
///
/// Returns [`CodecError::MissingPrefix`] for text that is not a bridge frame,
/// [`CodecError::MissingKind`] / [`CodecError::UnknownKind`] if the first
/// element is not a known kind name, [`CodecError::Json`] for malformed JSON,
/// and a contract error if the arguments do not fit the kind.
///
/// # Examples
///
/// ```rust
/// use webview_ipc_core::{deserialize_message, Arg, MessageKind};
///
/// let msg = deserialize_message(r#"__bwv:["OnLocationChanged","https://a/x",true]"#).unwrap();
/// assert_eq!(msg.kind, MessageKind::OnLocationChanged);
/// assert_eq!(msg.args, vec![Arg::from("https://a/x"), Arg::from(true)]);
/// ```
pub fn deserialize_message(text: &str) -> Result<Message, CodecError> {
    let json = text
        .strip_prefix(IPC_MESSAGE_PREFIX)
        .ok_or(CodecError::MissingPrefix)?;

    // Parse the outer array only.  Each element stays as raw JSON text so
    // opaque objects come back byte-for-byte as they were sent.
    let elements: Vec<Box<RawValue>> = serde_json::from_str(json)?;
    let mut elements = elements.into_iter();

    let head = elements.next().ok_or(CodecError::MissingKind)?;
    let kind_name: String =
        serde_json::from_str(head.get()).map_err(|_| CodecError::MissingKind)?;
    let kind: MessageKind = kind_name.parse()?;

    let args = elements
        .map(Arg::from_raw)
        .collect::<Result<Vec<_>, _>>()?;

    validate_contract(kind, &args)?;
    Ok(Message { kind, args })
}

/// Checks `args` against the positional contract of `kind`.
///
/// # Errors
///
/// Returns the first violation found: arity first, then argument types in
/// position order.
pub fn validate_contract(kind: MessageKind, args: &[Arg]) -> Result<(), CodecError> {
    let contract = kind.contract();
    if args.len() != contract.len() {
        return Err(CodecError::ArityMismatch {
            kind,
            expected: contract.len(),
            actual: args.len(),
        });
    }

    for (position, (shape, arg)) in contract.iter().zip(args).enumerate() {
        if !shape.accepts(arg) {
            return Err(CodecError::ArgTypeMismatch {
                kind,
                position,
                expected: shape.describe(),
                found: arg.type_name(),
            });
        }
    }

    Ok(())
}

// ── Frame serialization ───────────────────────────────────────────────────────

/// Borrowed view of a frame, serialized as `[kind, ...args]`.
struct WireFrame<'a> {
    kind: MessageKind,
    args: &'a [Arg],
}

impl Serialize for WireFrame<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(1 + self.args.len()))?;
        seq.serialize_element(self.kind.as_str())?;
        for arg in self.args {
            seq.serialize_element(arg)?;
        }
        seq.end()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
