//! # Utility Modules
//!
//! Common helpers used throughout the crate: the bounds-checked byte cursor
//! every decoding stage reads through, hex encoding/decoding for dumps and
//! test vectors, and frame logging.

pub mod cursor;
pub mod hex;
pub mod logging;

pub use cursor::ByteCursor;
pub use hex::{decode_hex, encode_hex, format_hex_compact, HexError};
pub use logging::{log_frame_hex, log_partial_decode};
