//! # M-Bus Frame Decoder
//!
//! This module classifies and validates wired M-Bus link layer frames
//! (EN 13757-2) and hands out a borrowed view of exactly one frame.
//!
//! ## Frame formats
//! - Single character: `E5`
//! - Short frame: `10 C A CS 16`
//! - Control / long frame: `68 L L 68 C A CI [data] CS 16`, where `L` counts
//!   C, A, CI and the user data and `CS` is their byte sum modulo 256.
//!   A frame with `L == 3` carries no user data and is a control frame.
//!
//! ## Usage
//!
//! ```rust
//! use mbus_telegram::mbus::frame::{parse_frame, MBusFrameType};
//!
//! let bytes = [0x10, 0x7B, 0x8B, 0x06, 0x16, 0xE5];
//! let (remaining, frame) = parse_frame(&bytes).unwrap();
//! assert_eq!(frame.frame_type, MBusFrameType::Short);
//! assert_eq!(frame.control, 0x7B);
//! assert_eq!(frame.address, 0x8B);
//! assert_eq!(remaining, &[0xE5]);
//! ```
//!
//! ## Error Handling
//! Every failure is fatal for the frame and reported as an [`MBusError`]
//! carrying the absolute offset of the offending byte. The cursor passed to
//! [`read_frame`] only moves when the whole frame validated.

use crate::constants::*;
use crate::error::MBusError;
use crate::mbus::control::{Address, Function};
use crate::util::{logging, ByteCursor};
use serde::Serialize;

/// Represents the different types of M-Bus frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MBusFrameType {
    Ack,
    Short,
    Control,
    Long,
}

impl MBusFrameType {
    /// Whether the frame carries the `68 L L 68` header.
    pub fn is_length_bearing(&self) -> bool {
        matches!(self, MBusFrameType::Control | MBusFrameType::Long)
    }
}

/// A validated frame, borrowing its bytes from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MBusFrame<'a> {
    pub frame_type: MBusFrameType,
    /// Absolute offset of the start byte.
    pub offset: usize,
    /// The whole frame, delimiters included.
    pub bytes: &'a [u8],
    /// Control field; 0 for an acknowledgment.
    pub control: u8,
    /// Address field; 0 for an acknowledgment.
    pub address: u8,
    /// Control information field of control and long frames.
    pub control_information: Option<u8>,
    /// Declared L field of control and long frames.
    pub declared_length: Option<u8>,
    /// User data following the CI field.
    pub payload: &'a [u8],
    /// Absolute offset of the first payload byte.
    pub payload_offset: usize,
    /// Checksum as transmitted; 0 for an acknowledgment.
    pub checksum: u8,
    /// Checksum computed over the checksummed region.
    pub computed_checksum: u8,
}

impl<'a> MBusFrame<'a> {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decoded control field, `None` for an acknowledgment.
    pub fn function(&self) -> Option<Function> {
        (self.frame_type != MBusFrameType::Ack).then(|| Function::from_control(self.control))
    }

    /// Decoded address field, `None` for an acknowledgment.
    pub fn address(&self) -> Option<Address> {
        (self.frame_type != MBusFrameType::Ack).then(|| Address::from(self.address))
    }
}

/// Calculates the M-Bus checksum: byte sum modulo 256.
pub fn calculate_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Determines the frame type from the leading byte(s) without consuming anything.
///
/// A `0x68` start needs the following L byte to tell a control frame from a long one.
pub fn classify(cursor: &ByteCursor<'_>) -> Result<MBusFrameType, MBusError> {
    let start = cursor.position();
    let first = cursor.peek(0).map_err(|e| e.into_incomplete_frame(start, 1))?;

    match first {
        MBUS_FRAME_ACK => Ok(MBusFrameType::Ack),
        MBUS_FRAME_SHORT_START => Ok(MBusFrameType::Short),
        MBUS_FRAME_LONG_START => {
            let length = cursor
                .peek(1)
                .map_err(|e| e.into_incomplete_frame(start, MBUS_FRAME_LONG_OVERHEAD))?;
            if length == MBUS_FRAME_CONTROL_LENGTH_FIELD {
                Ok(MBusFrameType::Control)
            } else {
                Ok(MBusFrameType::Long)
            }
        }
        byte => Err(MBusError::UnknownFrameStart {
            offset: start,
            byte,
        }),
    }
}

/// Classifies the frame at the start of `input`.
pub fn classify_frame(input: &[u8]) -> Result<MBusFrameType, MBusError> {
    classify(&ByteCursor::new(input))
}

/// Uses [`read_frame`] to parse the first frame of `input`, returning the unread rest.
pub fn parse_frame(input: &[u8]) -> Result<(&[u8], MBusFrame<'_>), MBusError> {
    let mut cursor = ByteCursor::new(input);
    let frame = read_frame(&mut cursor)?;
    Ok((cursor.as_slice(), frame))
}

/// Validates one frame at the cursor and advances past it.
///
/// On error the cursor is left untouched.
pub fn read_frame<'a>(cursor: &mut ByteCursor<'a>) -> Result<MBusFrame<'a>, MBusError> {
    let frame_type = classify(cursor)?;
    let mut work = cursor.clone();

    let frame = match frame_type {
        MBusFrameType::Ack => read_ack(&mut work)?,
        MBusFrameType::Short => read_short(&mut work)?,
        MBusFrameType::Control | MBusFrameType::Long => read_long(&mut work, frame_type)?,
    };

    logging::log_frame_hex("Frame", frame.bytes);
    log::debug!(
        target: "mbus::frame",
        "{:?} frame at offset {}: C=0x{:02X} A=0x{:02X} CI={:?} payload={} bytes",
        frame.frame_type,
        frame.offset,
        frame.control,
        frame.address,
        frame.control_information,
        frame.payload.len()
    );

    *cursor = work;
    Ok(frame)
}

fn read_ack<'a>(cursor: &mut ByteCursor<'a>) -> Result<MBusFrame<'a>, MBusError> {
    let offset = cursor.position();
    let bytes = cursor
        .take(1)
        .map_err(|e| e.into_incomplete_frame(offset, 1))?;

    Ok(MBusFrame {
        frame_type: MBusFrameType::Ack,
        offset,
        bytes,
        control: 0,
        address: 0,
        control_information: None,
        declared_length: None,
        payload: &[],
        payload_offset: offset + 1,
        checksum: 0,
        computed_checksum: 0,
    })
}

fn read_short<'a>(cursor: &mut ByteCursor<'a>) -> Result<MBusFrame<'a>, MBusError> {
    let offset = cursor.position();
    let bytes = cursor
        .take(MBUS_FRAME_SHORT_LENGTH)
        .map_err(|e| e.into_incomplete_frame(offset, MBUS_FRAME_SHORT_LENGTH))?;

    let (control, address, checksum, stop) = match *bytes {
        [_, control, address, checksum, stop] => (control, address, checksum, stop),
        _ => {
            return Err(MBusError::IncompleteFrame {
                offset,
                needed: MBUS_FRAME_SHORT_LENGTH,
                available: bytes.len(),
            })
        }
    };

    let computed_checksum = calculate_checksum(&[control, address]);
    if checksum != computed_checksum {
        return Err(MBusError::ChecksumMismatch {
            offset: offset + 3,
            expected: checksum,
            calculated: computed_checksum,
        });
    }
    if stop != MBUS_FRAME_STOP {
        return Err(MBusError::BadDelimiter {
            offset: offset + 4,
            expected: MBUS_FRAME_STOP,
            found: stop,
        });
    }

    Ok(MBusFrame {
        frame_type: MBusFrameType::Short,
        offset,
        bytes,
        control,
        address,
        control_information: None,
        declared_length: None,
        payload: &[],
        payload_offset: offset + MBUS_FRAME_SHORT_LENGTH,
        checksum,
        computed_checksum,
    })
}

fn read_long<'a>(
    cursor: &mut ByteCursor<'a>,
    frame_type: MBusFrameType,
) -> Result<MBusFrame<'a>, MBusError> {
    let offset = cursor.position();

    // 68 L L must be present before anything else can be judged.
    let first_length = cursor
        .peek(1)
        .map_err(|e| e.into_incomplete_frame(offset, MBUS_FRAME_LONG_OVERHEAD))?;
    let second_length = cursor.peek(2).map_err(|e| {
        e.into_incomplete_frame(offset, first_length as usize + MBUS_FRAME_LONG_OVERHEAD)
    })?;
    if first_length != second_length {
        return Err(MBusError::LengthFieldMismatch {
            offset: offset + 1,
            first: first_length,
            second: second_length,
        });
    }
    if first_length < MBUS_FRAME_MIN_LENGTH_FIELD {
        return Err(MBusError::InvalidLengthField {
            offset: offset + 1,
            length: first_length,
        });
    }

    let length = first_length as usize;
    let total = length + MBUS_FRAME_LONG_OVERHEAD;
    let bytes = cursor
        .take(total)
        .map_err(|e| e.into_incomplete_frame(offset, total))?;

    let mut fields = ByteCursor::with_base(bytes, offset);
    let overrun = |e: crate::error::CursorError| e.into_incomplete_frame(offset, total);

    fields.take(3).map_err(overrun)?;
    let second_start = fields.take_u8().map_err(overrun)?;
    if second_start != MBUS_FRAME_LONG_START {
        return Err(MBusError::BadDelimiter {
            offset: offset + 3,
            expected: MBUS_FRAME_LONG_START,
            found: second_start,
        });
    }

    let body_offset = fields.position();
    let body = fields.take(length).map_err(overrun)?;
    let checksum_offset = fields.position();
    let checksum = fields.take_u8().map_err(overrun)?;
    let computed_checksum = calculate_checksum(body);
    if checksum != computed_checksum {
        return Err(MBusError::ChecksumMismatch {
            offset: checksum_offset,
            expected: checksum,
            calculated: computed_checksum,
        });
    }

    let stop_offset = fields.position();
    let stop = fields.take_u8().map_err(overrun)?;
    if stop != MBUS_FRAME_STOP {
        return Err(MBusError::BadDelimiter {
            offset: stop_offset,
            expected: MBUS_FRAME_STOP,
            found: stop,
        });
    }

    let mut body_fields = ByteCursor::with_base(body, body_offset);
    let control = body_fields.take_u8().map_err(overrun)?;
    let address = body_fields.take_u8().map_err(overrun)?;
    let control_information = body_fields.take_u8().map_err(overrun)?;
    let payload_offset = body_fields.position();
    let payload = body_fields.take_rest();

    Ok(MBusFrame {
        frame_type,
        offset,
        bytes,
        control,
        address,
        control_information: Some(control_information),
        declared_length: Some(first_length),
        payload,
        payload_offset,
        checksum,
        computed_checksum,
    })
}
