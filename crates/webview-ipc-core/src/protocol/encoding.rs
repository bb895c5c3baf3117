//! Byte transfer encoding: standard base64 (RFC 4648 §4).
//!
//! # Why base64?
//!
//! Frames are JSON text, and JSON strings must be valid Unicode.  Binary data
//! (file contents, image bytes) may contain arbitrary byte values that are not
//! valid UTF-8.  Base64 encodes every 3 raw bytes as 4 printable ASCII
//! characters, making binary content safe to embed in a JSON string.  The
//! page side decodes it with `atob()`; the host side with its own base64
//! routine.
//!
//! This minimal implementation avoids adding a `base64` crate dependency for
//! one alphabet and one padding mode.
//!
//! No size limits are enforced here.  Splitting large payloads is the job of
//! the chunked stream sender, not of the encoder.

use thiserror::Error;

/// The standard base64 alphabet as defined in RFC 4648 §4.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const PAD: u8 = b'=';

/// Errors returned by [`base64_decode`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// Padded base64 text is always a multiple of 4 characters long.
    #[error("base64 length {0} is not a multiple of 4")]
    InvalidLength(usize),

    /// A character outside the alphabet (or a misplaced `=`).
    #[error("invalid base64 character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },

    /// More than two `=`, or padding before the final quartet.
    #[error("invalid base64 padding")]
    InvalidPadding,
}

/// Encodes binary data as standard, padded base64.
///
/// # Algorithm
///
/// Input bytes are processed in 3-byte chunks.  Each chunk of 24 bits is split
/// into four 6-bit groups, and each 6-bit value is mapped to a character from
/// the 64-character alphabet `A-Za-z0-9+/`.  The final chunk is padded with
/// `=` characters if it is shorter than 3 bytes.
///
/// # Examples
///
/// ```rust
/// use webview_ipc_core::base64_encode;
///
/// assert_eq!(base64_encode(b"AB"), "QUI=");
/// assert_eq!(base64_encode(b""), "");
/// ```
pub fn base64_encode(data: &[u8]) -> String {
    // Every 3 input bytes map to 4 output chars, rounded up.
    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        // Pad the chunk to 3 bytes with zeros if it's shorter (happens at EOF).
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);

        // Extract four 6-bit groups from the 24-bit concatenation b0:b1:b2.
        let i0 = (b0 >> 2) as usize;
        let i1 = (((b0 & 0x03) << 4) | (b1 >> 4)) as usize;
        let i2 = (((b1 & 0x0F) << 2) | (b2 >> 6)) as usize;
        let i3 = (b2 & 0x3F) as usize;

        result.push(ALPHABET[i0] as char);
        result.push(ALPHABET[i1] as char);
        result.push(if chunk.len() > 1 { ALPHABET[i2] as char } else { PAD as char });
        result.push(if chunk.len() > 2 { ALPHABET[i3] as char } else { PAD as char });
    }

    result
}

/// Decodes standard, padded base64 produced by [`base64_encode`].
///
/// `base64_decode(&base64_encode(b)) == b` for every byte slice, including
/// the empty one.
///
/// # Errors
///
/// Returns [`EncodingError`] if the text is not canonical padded base64.
///
/// # Examples
///
/// ```rust
/// use webview_ipc_core::base64_decode;
///
/// assert_eq!(base64_decode("QUJD").unwrap(), b"ABC");
/// ```
pub fn base64_decode(text: &str) -> Result<Vec<u8>, EncodingError> {
    let input = text.as_bytes();
    if input.len() % 4 != 0 {
        return Err(EncodingError::InvalidLength(input.len()));
    }

    let mut out = Vec::with_capacity(input.len() / 4 * 3);
    let quartet_count = input.len() / 4;

    for (index, quartet) in input.chunks_exact(4).enumerate() {
        let padding = quartet.iter().rev().take_while(|&&b| b == PAD).count();
        let is_final = index + 1 == quartet_count;
        if padding > 2 || (padding > 0 && !is_final) {
            return Err(EncodingError::InvalidPadding);
        }

        let mut sextets = [0u8; 4];
        for (offset, &byte) in quartet[..4 - padding].iter().enumerate() {
            sextets[offset] = decode_sextet(byte).ok_or(EncodingError::InvalidCharacter {
                character: byte as char,
                position: index * 4 + offset,
            })?;
        }

        out.push((sextets[0] << 2) | (sextets[1] >> 4));
        if padding < 2 {
            out.push((sextets[1] << 4) | (sextets[2] >> 2));
        }
        if padding < 1 {
            out.push((sextets[2] << 6) | sextets[3]);
        }
    }

    Ok(out)
}

/// Maps one alphabet character back to its 6-bit value.
fn decode_sextet(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
