//! # M-Bus Frame Encoder
//!
//! Produces wire bytes for the frame formats the decoder accepts. Used to
//! build telegrams for tests, benches and fuzz seeds.
//!
//! ```rust
//! use mbus_telegram::mbus::pack::FrameBuilder;
//!
//! let frame = FrameBuilder::short(0x7B, 0x8B).build().unwrap();
//! assert_eq!(&frame[..], &[0x10, 0x7B, 0x8B, 0x06, 0x16]);
//! ```

use crate::constants::*;
use crate::mbus::frame::{calculate_checksum, MBusFrame, MBusFrameType};
use crate::payload::data::encode_record;
use crate::payload::data_encoding::MBusEncodeError;
use crate::payload::header::{LongHeader, ShortHeader};
use crate::payload::record::MBusRecord;
use bytes::{BufMut, BytesMut};

/// Largest user data a long frame can carry: L is one byte and counts C, A and CI.
pub const MBUS_FRAME_MAX_USER_DATA: usize = u8::MAX as usize - 3;

/// Packs a decoded frame back into wire bytes, recomputing the checksum.
pub fn pack_frame(frame: &MBusFrame<'_>) -> BytesMut {
    let mut buf = BytesMut::with_capacity(frame.len().max(MBUS_FRAME_SHORT_LENGTH));
    match frame.frame_type {
        MBusFrameType::Ack => buf.put_u8(MBUS_FRAME_ACK),
        MBusFrameType::Short => pack_short(&mut buf, frame.control, frame.address),
        MBusFrameType::Control | MBusFrameType::Long => pack_long(
            &mut buf,
            frame.control,
            frame.address,
            frame.control_information.unwrap_or_default(),
            frame.payload,
        ),
    }
    buf
}

fn pack_short(buf: &mut BytesMut, control: u8, address: u8) {
    buf.put_u8(MBUS_FRAME_SHORT_START);
    buf.put_u8(control);
    buf.put_u8(address);
    buf.put_u8(calculate_checksum(&[control, address]));
    buf.put_u8(MBUS_FRAME_STOP);
}

// Callers guarantee `data.len() <= MBUS_FRAME_MAX_USER_DATA`.
fn pack_long(buf: &mut BytesMut, control: u8, address: u8, ci: u8, data: &[u8]) {
    let length = (data.len() + 3) as u8;
    buf.put_u8(MBUS_FRAME_LONG_START);
    buf.put_u8(length);
    buf.put_u8(length);
    buf.put_u8(MBUS_FRAME_LONG_START);
    let start = buf.len();
    buf.put_u8(control);
    buf.put_u8(address);
    buf.put_u8(ci);
    buf.put_slice(data);
    let checksum = calculate_checksum(&buf[start..]);
    buf.put_u8(checksum);
    buf.put_u8(MBUS_FRAME_STOP);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Ack,
    Short,
    Long,
}

/// Builder for a single frame.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    kind: Kind,
    control: u8,
    address: u8,
    control_information: u8,
    user_data: BytesMut,
}

impl FrameBuilder {
    fn new(kind: Kind, control: u8, address: u8, control_information: u8) -> Self {
        Self {
            kind,
            control,
            address,
            control_information,
            user_data: BytesMut::new(),
        }
    }

    pub fn ack() -> Self {
        Self::new(Kind::Ack, 0, 0, 0)
    }

    pub fn short(control: u8, address: u8) -> Self {
        Self::new(Kind::Short, control, address, 0)
    }

    /// A long frame; without user data it is packed as a control frame.
    pub fn long(control: u8, address: u8, control_information: u8) -> Self {
        Self::new(Kind::Long, control, address, control_information)
    }

    /// Appends a 12-byte long header, LSB first.
    pub fn long_header(mut self, header: &LongHeader) -> Self {
        self.user_data.put_slice(&header.to_bytes());
        self
    }

    /// Appends a 4-byte short header, LSB first.
    pub fn short_header(mut self, header: &ShortHeader) -> Self {
        self.user_data.put_u8(header.access_number);
        self.user_data.put_u8(header.status.bits());
        self.user_data.put_u16_le(header.signature);
        self
    }

    /// Appends raw user data bytes.
    pub fn payload(mut self, bytes: &[u8]) -> Self {
        self.user_data.put_slice(bytes);
        self
    }

    pub fn record(mut self, record: &MBusRecord) -> Result<Self, MBusEncodeError> {
        encode_record(record, &mut self.user_data)?;
        Ok(self)
    }

    pub fn records<'r>(
        self,
        records: impl IntoIterator<Item = &'r MBusRecord>,
    ) -> Result<Self, MBusEncodeError> {
        records
            .into_iter()
            .try_fold(self, |builder, record| builder.record(record))
    }

    pub fn build(self) -> Result<BytesMut, MBusEncodeError> {
        let mut buf = BytesMut::with_capacity(self.user_data.len() + MBUS_FRAME_LONG_OVERHEAD + 3);
        match self.kind {
            Kind::Ack => buf.put_u8(MBUS_FRAME_ACK),
            Kind::Short => pack_short(&mut buf, self.control, self.address),
            Kind::Long => {
                if self.user_data.len() > MBUS_FRAME_MAX_USER_DATA {
                    return Err(MBusEncodeError::PayloadTooLong(self.user_data.len()));
                }
                pack_long(
                    &mut buf,
                    self.control,
                    self.address,
                    self.control_information,
                    &self.user_data,
                );
            }
        }
        Ok(buf)
    }
}
