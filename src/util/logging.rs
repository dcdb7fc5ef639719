//! # Frame Logging Utilities
//!
//! Hex dumps of frames for protocol analysis and optional `tracing` spans
//! around a parse. Everything goes through the `log` facade; spans are only
//! created with the `tracing` cargo feature and are no-ops otherwise.
//!
//! ```rust
//! use mbus_telegram::util::logging::{log_frame_hex, span_frame_processing};
//!
//! let _span = span_frame_processing(5);
//! log_frame_hex("Short frame", &[0x10, 0x7B, 0x8B, 0x06, 0x16]);
//! ```

use crate::error::MBusError;

/// Longest prefix of a frame written to the log.
const MAX_LOG_BYTES: usize = 64;

/// Log frame data in hex format at trace level, truncated to a bounded length.
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    if !log::log_enabled!(target: "mbus::frame", log::Level::Trace) {
        return;
    }

    let shown = &data[..data.len().min(MAX_LOG_BYTES)];
    let hex_str = crate::util::hex::format_hex_compact(shown);
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    log::trace!(target: "mbus::frame", "{prefix}: {hex_str}{suffix}");
}

/// Log a recoverable application-layer problem together with the amount of data kept.
pub fn log_partial_decode(error: &MBusError, records_kept: usize) {
    log::warn!(
        target: "mbus::payload",
        "{error}; keeping {records_kept} decoded record(s)"
    );
}

/// Create a tracing span for one telegram parse.
#[cfg(feature = "tracing")]
pub fn span_frame_processing(input_len: usize) -> tracing::span::EnteredSpan {
    tracing::debug_span!("frame_processing", input_len = input_len).entered()
}

/// Fallback span creation when tracing is not available
#[cfg(not(feature = "tracing"))]
pub fn span_frame_processing(_input_len: usize) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_helpers_do_not_panic() {
        let long = vec![0xAAu8; 200];
        log_frame_hex("long frame", &long);
        log_frame_hex("empty", &[]);
        log_partial_decode(&MBusError::TrailingData { offset: 4, count: 2 }, 1);
        let _span = span_frame_processing(long.len());
    }
}
