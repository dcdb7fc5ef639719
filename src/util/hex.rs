//! # Hex Helpers for Telegram Dumps
//!
//! Telegrams are exchanged, logged and kept as test vectors in hex. These
//! helpers wrap the `hex` crate with the tolerance those sources need: captured
//! frames often come with spaces, colons or dashes between bytes.
//!
//! ```rust
//! use mbus_telegram::util::hex::{decode_hex, format_hex_compact};
//!
//! let frame = decode_hex("10 7B 8B 06 16").unwrap();
//! assert_eq!(frame, vec![0x10, 0x7B, 0x8B, 0x06, 0x16]);
//! assert_eq!(format_hex_compact(&frame), "10 7b 8b 06 16");
//! ```

use thiserror::Error;

/// Errors that can occur while turning a hex dump back into bytes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to an uppercase hex string without separators.
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode a hex dump, ignoring whitespace and the `:`/`-` separators.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();

    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }
    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Format hex data for compact display (useful for logs): "68 31 31 68".
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
