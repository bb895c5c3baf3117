//! Wire message kinds and argument values for the WebView IPC protocol.
//!
//! Every frame that crosses the bridge is a message kind followed by a short,
//! positional list of arguments.  The set of kinds is closed, and each kind
//! fixes how many arguments it carries and what type each one must have.
//!
//! ```text
//! __bwv:["OnRenderCompleted",12,null]
//!        └── kind ─────────┘ └─ args ─┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Number;

use crate::protocol::codec::CodecError;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Marker prepended to every serialized frame.
///
/// The host may receive other strings on the same channel (for example,
/// diagnostic messages injected by the WebView itself).  The prefix lets the
/// receiver cheaply reject anything that is not a bridge frame.
pub const IPC_MESSAGE_PREFIX: &str = "__bwv:";

// ── Message kinds ─────────────────────────────────────────────────────────────

/// The closed set of message kinds the bridge can send.
///
/// The wire name (see [`MessageKind::as_str`]) is what the receiver routes on,
/// so it must never change for an existing variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Announce the initial page context: `baseUrl`, `startUrl`.
    AttachPage,
    /// Report completion of a render batch: `batchId`, `error | null`.
    OnRenderCompleted,
    /// Forward a UI event: `eventDescriptor`, `eventArgs`.
    DispatchBrowserEvent,
    /// Start a cross-boundary method call.
    BeginInvokeDotNet,
    /// Complete a cross-boundary call: `asyncHandle`, `succeeded`, `argsOrError`.
    EndInvokeJs,
    /// Deliver a small binary buffer: `id`, `base64Data`.
    ReceiveByteArrayFromJs,
    /// Deliver one chunk of a large transfer: `streamId`, `chunkBase64`, `isLast`.
    ReceiveJsDataChunk,
    /// Report navigation: `uri`, `intercepted`.
    OnLocationChanged,
}

impl MessageKind {
    /// Every message kind, in declaration order.
    pub const ALL: [MessageKind; 8] = [
        MessageKind::AttachPage,
        MessageKind::OnRenderCompleted,
        MessageKind::DispatchBrowserEvent,
        MessageKind::BeginInvokeDotNet,
        MessageKind::EndInvokeJs,
        MessageKind::ReceiveByteArrayFromJs,
        MessageKind::ReceiveJsDataChunk,
        MessageKind::OnLocationChanged,
    ];

    /// Returns the name written as the first element of the wire array.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::AttachPage => "AttachPage",
            MessageKind::OnRenderCompleted => "OnRenderCompleted",
            MessageKind::DispatchBrowserEvent => "DispatchBrowserEvent",
            MessageKind::BeginInvokeDotNet => "BeginInvokeDotNet",
            MessageKind::EndInvokeJs => "EndInvokeJS",
            MessageKind::ReceiveByteArrayFromJs => "ReceiveByteArrayFromJS",
            MessageKind::ReceiveJsDataChunk => "ReceiveJSDataChunk",
            MessageKind::OnLocationChanged => "OnLocationChanged",
        }
    }

    /// Returns the positional argument contract for this kind.
    ///
    /// The slice length is the exact argument count; element `i` describes
    /// which [`Arg`] variants are acceptable at position `i`.
    pub fn contract(self) -> &'static [ArgShape] {
        use ArgShape as S;
        match self {
            MessageKind::AttachPage => &[S::String, S::String],
            MessageKind::OnRenderCompleted => &[S::Number, S::NullableString],
            MessageKind::DispatchBrowserEvent => &[S::Opaque, S::Opaque],
            // callId, assemblyName, methodIdentifier, targetObjectId, argsJson
            MessageKind::BeginInvokeDotNet => &[
                S::NullableString,
                S::NullableString,
                S::String,
                S::NullableNumber,
                S::String,
            ],
            MessageKind::EndInvokeJs => &[S::Number, S::Bool, S::Opaque],
            MessageKind::ReceiveByteArrayFromJs => &[S::Number, S::String],
            MessageKind::ReceiveJsDataChunk => &[S::String, S::String, S::Bool],
            MessageKind::OnLocationChanged => &[S::String, S::Bool],
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = CodecError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| CodecError::UnknownKind(name.to_string()))
    }
}

// ── Argument shapes ───────────────────────────────────────────────────────────

/// The set of [`Arg`] variants accepted at one position of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    String,
    NullableString,
    Number,
    NullableNumber,
    Bool,
    /// Any value at all; the receiver treats it as an opaque JSON payload.
    Opaque,
}

impl ArgShape {
    /// Returns `true` if `arg` satisfies this shape.
    pub fn accepts(self, arg: &Arg) -> bool {
        match self {
            ArgShape::String => matches!(arg, Arg::String(_)),
            ArgShape::NullableString => matches!(arg, Arg::String(_) | Arg::Null),
            ArgShape::Number => matches!(arg, Arg::Number(_)),
            ArgShape::NullableNumber => matches!(arg, Arg::Number(_) | Arg::Null),
            ArgShape::Bool => matches!(arg, Arg::Bool(_)),
            ArgShape::Opaque => true,
        }
    }

    /// Short human-readable description used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            ArgShape::String => "string",
            ArgShape::NullableString => "string or null",
            ArgShape::Number => "number",
            ArgShape::NullableNumber => "number or null",
            ArgShape::Bool => "boolean",
            ArgShape::Opaque => "any JSON value",
        }
    }
}

// ── Argument values ───────────────────────────────────────────────────────────

/// One positional argument of a [`Message`].
///
/// # Why a closed enum?
///
/// The receiving side is written in a statically typed language and decodes
/// each position with a fixed expectation.  Restricting arguments to these
/// five variants means every value the codec accepts is one the receiver can
/// reconstruct with the same type it was sent with.
///
/// `Json` only ever holds an object or an array.  The constructors
/// [`Arg::json`] and [`Arg::raw_json`] route scalar JSON (`"x"`, `5`, `true`,
/// `null`) into the matching scalar variant instead, so a value never changes
/// variant across a round trip.
#[derive(Debug, Clone)]
pub enum Arg {
    Null,
    Bool(bool),
    /// A JSON number.  Integers stay integers on the wire (no `7.0`).
    Number(Number),
    String(String),
    /// Already-serialized JSON object or array text, written verbatim.
    ///
    /// Build this through [`Arg::json`] or [`Arg::raw_json`].  Constructing
    /// the variant directly around a scalar (`5`, `"x"`, `null`) is the
    /// caller's responsibility: it is written as-is, but decodes back as the
    /// matching scalar variant, not as `Json`.
    Json(Box<RawValue>),
}

impl Arg {
    /// Builds a string argument.
    pub fn string(value: impl Into<String>) -> Self {
        Arg::String(value.into())
    }

    /// Builds a number argument from a float.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NonFiniteNumber`] for NaN and infinities, which
    /// have no JSON representation.
    pub fn float(value: f64) -> Result<Self, CodecError> {
        Number::from_f64(value)
            .map(Arg::Number)
            .ok_or(CodecError::NonFiniteNumber(value))
    }

    /// Serializes any `serde` value into an argument.
    ///
    /// Objects and arrays become [`Arg::Json`]; scalars land in their own
    /// variant.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if `serde_json` cannot represent the value
    /// (for example, a map keyed by a struct, or a failing `Serialize` impl).
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, CodecError> {
        let raw = serde_json::value::to_raw_value(value)?;
        Arg::from_raw(raw)
    }

    /// Wraps text that is already serialized JSON.
    ///
    /// The text is validated but not re-escaped: `{"a":1}` travels as an
    /// object, not as the string `"{\"a\":1}"`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if `text` is not a single valid JSON value.
    pub fn raw_json(text: impl Into<String>) -> Result<Self, CodecError> {
        let raw = RawValue::from_string(text.into())?;
        Arg::from_raw(raw)
    }

    /// Classifies one raw JSON element into the matching variant.
    pub(crate) fn from_raw(raw: Box<RawValue>) -> Result<Self, CodecError> {
        let text = raw.get().trim_start();
        match text.as_bytes().first() {
            Some(b'n') => Ok(Arg::Null),
            Some(b't') => Ok(Arg::Bool(true)),
            Some(b'f') => Ok(Arg::Bool(false)),
            Some(b'"') => Ok(Arg::String(serde_json::from_str(text)?)),
            Some(b'{') | Some(b'[') => Ok(Arg::Json(raw)),
            _ => Ok(Arg::Number(serde_json::from_str(text)?)),
        }
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Null => "null",
            Arg::Bool(_) => "boolean",
            Arg::Number(_) => "number",
            Arg::String(_) => "string",
            Arg::Json(_) => "JSON value",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Arg::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Arg::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Arg::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Returns the verbatim JSON text of an opaque argument.
    pub fn as_json(&self) -> Option<&str> {
        match self {
            Arg::Json(raw) => Some(raw.get()),
            _ => None,
        }
    }
}

// `RawValue` has no `PartialEq`; two opaque values are equal when their text is.
impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arg::Null, Arg::Null) => true,
            (Arg::Bool(a), Arg::Bool(b)) => a == b,
            (Arg::Number(a), Arg::Number(b)) => a == b,
            (Arg::String(a), Arg::String(b)) => a == b,
            (Arg::Json(a), Arg::Json(b)) => a.get() == b.get(),
            _ => false,
        }
    }
}

impl Serialize for Arg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Arg::Null => serializer.serialize_unit(),
            Arg::Bool(b) => serializer.serialize_bool(*b),
            Arg::Number(n) => n.serialize(serializer),
            Arg::String(s) => serializer.serialize_str(s),
            Arg::Json(raw) => raw.serialize(serializer),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::String(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::String(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

macro_rules! arg_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Number(Number::from(value))
                }
            }
        )*
    };
}

arg_from_integer!(u32, u64, usize, i32, i64);

/// `None` becomes `null`, matching how optional parameters appear on the wire.
impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Null, Into::into)
    }
}

// ── Message ───────────────────────────────────────────────────────────────────

/// A decoded or about-to-be-encoded frame: a kind plus its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub args: Vec<Arg>,
}

impl Message {
    pub fn new(kind: MessageKind, args: Vec<Arg>) -> Self {
        Self { kind, args }
    }

    /// Serializes this message into a wire frame.
    ///
    /// # Errors
    ///
    /// See [`crate::protocol::codec::serialize_message`].
    pub fn to_frame(&self) -> Result<String, CodecError> {
        crate::protocol::codec::serialize_message(self.kind, &self.args)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
