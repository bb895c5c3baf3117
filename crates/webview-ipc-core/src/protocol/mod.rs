//! Protocol module containing message types, the JSON frame codec, and the
//! base64 byte transfer encoding.

pub mod codec;
pub mod encoding;
pub mod messages;

pub use codec::{deserialize_message, serialize_message, CodecError};
pub use encoding::{base64_decode, base64_encode, EncodingError};
pub use messages::*;
