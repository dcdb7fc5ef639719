//! # Variable Data Blocks
//!
//! Walks the records of a variable data structure until the user data is used
//! up, a manufacturer specific block starts or a record cannot be completed.
//!
//! Truncated records, undecodable trailing bytes and reserved LVAR codes stop
//! the walk but keep what was decoded before them; the cause travels in
//! [`MBusUserData::error`]. A malformed extension chain aborts the walk.

use crate::constants::*;
use crate::error::MBusError;
use crate::payload::data_encoding::{
    encode_bcd, encode_date, encode_datetime_cp32, encode_datetime_cp48, encode_int,
    encode_real, encode_text, MBusEncodeError,
};
use crate::payload::dif::{parse_dib, DataFieldCoding, DataInformation};
use crate::payload::header::ByteOrder;
use crate::payload::record::{lvar_for, parse_record, MBusRecord, MBusRecordValue};
use crate::util::logging::log_partial_decode;
use crate::util::ByteCursor;
use bytes::{BufMut, BytesMut};
use serde::Serialize;

/// Records and trailing blocks of one variable data structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MBusUserData {
    pub records: Vec<MBusRecord>,
    /// Bytes following a 0x0F or 0x1F DIF, not interpreted.
    pub manufacturer_data: Option<Vec<u8>>,
    /// Set by a 0x1F DIF: the meter has more records for the next request.
    pub more_records_follow: bool,
    /// Recoverable condition that ended the walk early.
    pub error: Option<MBusError>,
}

impl MBusUserData {
    /// Decodes a standalone block of LSB-first records.
    pub fn decode(bytes: &[u8]) -> Result<Self, MBusError> {
        let mut cursor = ByteCursor::new(bytes);
        parse_variable_data(&mut cursor, ByteOrder::LsbFirst, usize::MAX)
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Decodes records from `cursor` until it is exhausted.
///
/// A failed record leaves the cursor at its first byte.
pub fn parse_variable_data(
    cursor: &mut ByteCursor<'_>,
    order: ByteOrder,
    max_records: usize,
) -> Result<MBusUserData, MBusError> {
    let mut data = MBusUserData::default();

    while !cursor.is_empty() {
        let record_start = cursor.position();
        if data.records.len() >= max_records {
            data.error = Some(MBusError::TrailingData {
                offset: record_start,
                count: cursor.remaining(),
            });
            break;
        }

        let mut attempt = cursor.clone();
        let record = match parse_dib(&mut attempt, record_start) {
            Ok(DataInformation::Record(dib)) => parse_record(&mut attempt, dib, record_start, order),
            Ok(DataInformation::IdleFiller) => {
                *cursor = attempt;
                continue;
            }
            Ok(DataInformation::ManufacturerSpecific {
                more_records_follow,
            }) => {
                *cursor = attempt;
                let block = cursor.take_rest();
                log::debug!(
                    target: "mbus::payload",
                    "Manufacturer specific data at offset {record_start}: {} bytes",
                    block.len()
                );
                data.manufacturer_data = Some(block.to_vec());
                data.more_records_follow = more_records_follow;
                break;
            }
            Ok(DataInformation::Reserved(dif)) => {
                log::debug!(target: "mbus::payload", "Reserved DIF 0x{dif:02X} at offset {record_start}");
                Err(MBusError::TrailingData {
                    offset: record_start,
                    count: cursor.remaining(),
                })
            }
            Err(e) => Err(e),
        };

        match record {
            Ok(record) => {
                data.records.push(record);
                *cursor = attempt;
            }
            Err(e) if e.is_recoverable() => {
                data.error = Some(e);
                break;
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(error) = &data.error {
        log_partial_decode(error, data.records.len());
    }
    Ok(data)
}

fn mismatch(coding: DataFieldCoding, value: &MBusRecordValue) -> MBusEncodeError {
    MBusEncodeError::ValueMismatch(format!("{coding:?} cannot carry {value:?}"))
}

fn fixed_raw(raw: &[u8], width: usize) -> Result<Vec<u8>, MBusEncodeError> {
    if raw.len() == width {
        Ok(raw.to_vec())
    } else {
        Err(MBusEncodeError::InvalidWidth(raw.len()))
    }
}

fn encode_variable(value: &MBusRecordValue) -> Result<Vec<u8>, MBusEncodeError> {
    let mut out = Vec::new();
    match value {
        MBusRecordValue::Text(text) => {
            let lvar = lvar_for(value).ok_or(MBusEncodeError::TextTooLong(text.len()))?;
            out.push(lvar);
            out.extend(encode_text(text)?);
        }
        MBusRecordValue::Binary(bytes) => {
            let lvar = lvar_for(value).ok_or(MBusEncodeError::InvalidWidth(bytes.len()))?;
            out.push(lvar);
            out.extend_from_slice(bytes);
        }
        MBusRecordValue::Integer(v) => {
            let bytes = (1..=8)
                .find_map(|width| encode_int(*v, width).ok())
                .ok_or(MBusEncodeError::ValueOutOfRange { value: *v, width: 8 })?;
            out.push(MBUS_LVAR_BINARY + bytes.len() as u8);
            out.extend(bytes);
        }
        MBusRecordValue::Bcd(v) => {
            let magnitude = i64::try_from(v.unsigned_abs())
                .map_err(|_| MBusEncodeError::ValueOutOfRange { value: *v, width: 9 })?;
            let bytes = (1..=9)
                .find_map(|width| encode_bcd(magnitude, width).ok())
                .ok_or(MBusEncodeError::ValueOutOfRange { value: *v, width: 9 })?;
            let base = if *v < 0 {
                MBUS_LVAR_BCD_NEGATIVE
            } else {
                MBUS_LVAR_BCD_POSITIVE
            };
            out.push(base + bytes.len() as u8);
            out.extend(bytes);
        }
        other => return Err(mismatch(DataFieldCoding::VariableLength, other)),
    }
    Ok(out)
}

fn encode_value(coding: DataFieldCoding, value: &MBusRecordValue) -> Result<Vec<u8>, MBusEncodeError> {
    match (coding, value) {
        (
            DataFieldCoding::NoData | DataFieldCoding::SelectionForReadout | DataFieldCoding::Special,
            MBusRecordValue::NoData,
        ) => Ok(Vec::new()),
        (DataFieldCoding::Integer(width), MBusRecordValue::Integer(v)) => {
            encode_int(*v, usize::from(width))
        }
        (DataFieldCoding::Integer(2), MBusRecordValue::Date(date)) => Ok(encode_date(*date)?.to_vec()),
        (DataFieldCoding::Integer(4), MBusRecordValue::DateTime(dt)) => {
            Ok(encode_datetime_cp32(*dt)?.to_vec())
        }
        (DataFieldCoding::Integer(6), MBusRecordValue::DateTime(dt)) => {
            Ok(encode_datetime_cp48(*dt)?.to_vec())
        }
        (DataFieldCoding::Real32, MBusRecordValue::Real(v)) => Ok(encode_real(*v).to_vec()),
        (DataFieldCoding::Bcd(width), MBusRecordValue::Bcd(v)) => encode_bcd(*v, usize::from(width)),
        (DataFieldCoding::VariableLength, value) => encode_variable(value),
        (coding, MBusRecordValue::Invalid(raw)) => match coding.width() {
            Some(width) if width > 0 => fixed_raw(raw, width),
            _ => Err(mismatch(coding, value)),
        },
        (coding, value) => Err(mismatch(coding, value)),
    }
}

/// Appends the wire form of `record` (LSB first) to `buf`.
pub fn encode_record(record: &MBusRecord, buf: &mut BytesMut) -> Result<(), MBusEncodeError> {
    let value = encode_value(record.header.dib.coding, &record.value)?;
    buf.put_slice(&record.header.to_bytes());
    buf.put_slice(&value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::dif::{DataInformationBlock, FunctionField};
    use crate::payload::vif::ValueInformationBlock;

    #[test]
    fn test_fillers_are_skipped() {
        let data = MBusUserData::decode(&[0x2F, 0x01, 0x13, 0x2A, 0x2F, 0x2F]).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.records[0].offset, 1);
        assert!(data.is_complete());
    }

    #[test]
    fn test_manufacturer_block_ends_walk() {
        let data = MBusUserData::decode(&[0x01, 0x13, 0x2A, 0x1F, 0xAA, 0xBB]).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.manufacturer_data, Some(vec![0xAA, 0xBB]));
        assert!(data.more_records_follow);
        assert!(data.is_complete());
    }

    #[test]
    fn test_truncated_record_keeps_earlier_records() {
        let data = MBusUserData::decode(&[0x01, 0x13, 0x2A, 0x04, 0x13, 0x01]).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(
            data.error,
            Some(MBusError::TruncatedRecord {
                offset: 3,
                needed: 6,
                available: 3
            })
        );
    }

    #[test]
    fn test_reserved_dif_is_trailing_data() {
        let data = MBusUserData::decode(&[0x01, 0x13, 0x2A, 0x3F, 0x00]).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.error, Some(MBusError::TrailingData { offset: 3, count: 2 }));
    }

    #[test]
    fn test_malformed_chain_is_fatal() {
        let mut bytes = vec![0x01, 0x13, 0x2A, 0x84];
        bytes.extend(std::iter::repeat(0x80).take(11));
        assert!(matches!(
            MBusUserData::decode(&bytes),
            Err(MBusError::MalformedDifChain { offset: 14, .. })
        ));
    }

    #[test]
    fn test_max_records() {
        let bytes = [0x01, 0x13, 0x01, 0x01, 0x13, 0x02];
        let data = parse_variable_data(&mut ByteCursor::new(&bytes), ByteOrder::LsbFirst, 1).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.error, Some(MBusError::TrailingData { offset: 3, count: 3 }));
    }

    #[test]
    fn test_encode_record_round_trip() {
        let dib = DataInformationBlock::new(
            FunctionField::Instantaneous,
            DataFieldCoding::VariableLength,
            1,
            0,
            0,
        )
        .unwrap();
        let vib = ValueInformationBlock::decode(&[0xFD, 0x11]).unwrap();
        let values = [
            MBusRecordValue::Text("SN-0042".to_string()),
            MBusRecordValue::Bcd(-1234),
            MBusRecordValue::Integer(300),
            MBusRecordValue::Binary(vec![0x55; 16]),
        ];
        for value in values {
            let record = MBusRecord::new(dib.clone(), vib.clone(), value);
            let mut buf = BytesMut::new();
            encode_record(&record, &mut buf).unwrap();
            let decoded = MBusUserData::decode(&buf).unwrap();
            assert_eq!(decoded.records.len(), 1);
            assert_eq!(decoded.records[0].header, record.header);
            assert_eq!(decoded.records[0].value, record.value);
        }
    }

    #[test]
    fn test_encode_rejects_mismatched_value() {
        let dib = DataInformationBlock::new(
            FunctionField::Instantaneous,
            DataFieldCoding::Bcd(4),
            0,
            0,
            0,
        )
        .unwrap();
        let vib = ValueInformationBlock::decode(&[0x06]).unwrap();
        let record = MBusRecord::new(dib, vib, MBusRecordValue::Real(1.0));
        assert!(matches!(
            encode_record(&record, &mut BytesMut::new()),
            Err(MBusEncodeError::ValueMismatch(_))
        ));
    }
}
