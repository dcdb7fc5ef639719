//! # M-Bus Error Handling
//!
//! This module defines the MBusError enum, which represents the different ways a
//! telegram decode can fail. Every variant carries the absolute byte offset into
//! the caller's buffer at which the problem was detected.
//!
//! Frame-level errors are fatal: no telegram is produced. `TruncatedRecord`,
//! `TrailingData` and `UnsupportedLvar` are recoverable at a record boundary and
//! travel alongside the records decoded before them (see [`crate::MBusTelegram`]).

use serde::Serialize;
use thiserror::Error;

/// Which extension chain overran its bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtensionChain {
    Dife,
    Vife,
}

/// Represents the different error types that can occur when decoding a telegram.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum MBusError {
    /// The first byte is none of 0xE5, 0x10 or 0x68.
    #[error("Unknown frame start 0x{byte:02X} at offset {offset}")]
    UnknownFrameStart { offset: usize, byte: u8 },

    /// A start or stop delimiter carries the wrong value.
    #[error("Bad delimiter at offset {offset}: expected 0x{expected:02X}, found 0x{found:02X}")]
    BadDelimiter { offset: usize, expected: u8, found: u8 },

    /// The two copies of the L field differ.
    #[error("Length field mismatch at offset {offset}: {first} != {second}")]
    LengthFieldMismatch { offset: usize, first: u8, second: u8 },

    /// The L field is too small to hold the C, A and CI fields.
    #[error("Invalid length field {length} at offset {offset}")]
    InvalidLengthField { offset: usize, length: u8 },

    /// The buffer ends before the declared frame does.
    #[error("Incomplete frame at offset {offset}: need {needed} bytes, {available} available")]
    IncompleteFrame {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Transmitted and computed checksum disagree.
    #[error("Checksum mismatch at offset {offset}: expected 0x{expected:02X}, calculated 0x{calculated:02X}")]
    ChecksumMismatch {
        offset: usize,
        expected: u8,
        calculated: u8,
    },

    /// A DIFE or VIFE chain is longer than the protocol allows.
    #[error("Malformed {chain:?} chain at offset {offset}")]
    MalformedDifChain { offset: usize, chain: ExtensionChain },

    /// The user data ends inside a record.
    #[error("Truncated record at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedRecord {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Bytes remain that cannot be decoded as further records.
    #[error("Trailing data at offset {offset}: {count} bytes not decoded")]
    TrailingData { offset: usize, count: usize },

    /// An LVAR byte in a reserved range; the record length cannot be determined.
    #[error("Unsupported LVAR 0x{lvar:02X} at offset {offset}")]
    UnsupportedLvar { offset: usize, lvar: u8 },
}

impl MBusError {
    /// Byte offset into the parsed buffer at which the error was detected.
    pub fn offset(&self) -> usize {
        match *self {
            MBusError::UnknownFrameStart { offset, .. }
            | MBusError::BadDelimiter { offset, .. }
            | MBusError::LengthFieldMismatch { offset, .. }
            | MBusError::InvalidLengthField { offset, .. }
            | MBusError::IncompleteFrame { offset, .. }
            | MBusError::ChecksumMismatch { offset, .. }
            | MBusError::MalformedDifChain { offset, .. }
            | MBusError::TruncatedRecord { offset, .. }
            | MBusError::TrailingData { offset, .. }
            | MBusError::UnsupportedLvar { offset, .. } => offset,
        }
    }

    /// Whether records decoded before this error remain valid output.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MBusError::TruncatedRecord { .. }
                | MBusError::TrailingData { .. }
                | MBusError::UnsupportedLvar { .. }
        )
    }

    /// Whether the error was raised by the link layer (framing, length, checksum).
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            MBusError::UnknownFrameStart { .. }
                | MBusError::BadDelimiter { .. }
                | MBusError::LengthFieldMismatch { .. }
                | MBusError::InvalidLengthField { .. }
                | MBusError::IncompleteFrame { .. }
                | MBusError::ChecksumMismatch { .. }
        )
    }
}

/// Bounds violation raised by [`crate::util::cursor::ByteCursor`].
///
/// Never escapes the crate's public entry points; each decoding stage maps it
/// to its own error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("Out of bounds at offset {offset}: requested {requested}, remaining {remaining}")]
    OutOfBounds {
        offset: usize,
        requested: usize,
        remaining: usize,
    },
}

impl CursorError {
    /// Frame-layer view of a bounds violation.
    pub(crate) fn into_incomplete_frame(self, frame_start: usize, frame_len: usize) -> MBusError {
        let CursorError::OutOfBounds {
            offset,
            requested,
            remaining,
        } = self;
        let consumed = offset.saturating_sub(frame_start);
        MBusError::IncompleteFrame {
            offset: frame_start,
            needed: frame_len.max(consumed + requested),
            available: consumed + remaining,
        }
    }

    /// Application-layer view of a bounds violation, anchored at the record start.
    pub(crate) fn into_truncated_record(self, record_start: usize) -> MBusError {
        let CursorError::OutOfBounds {
            offset,
            requested,
            remaining,
        } = self;
        MBusError::TruncatedRecord {
            offset: record_start,
            needed: offset.saturating_sub(record_start) + requested,
            available: offset.saturating_sub(record_start) + remaining,
        }
    }
}
