//! # M-Bus Data Records
//!
//! A data record is a DIB, a VIB and a value whose encoding the DIB declares.
//! The value is read with exactly the declared width; bytes that are not a
//! valid instance of the declared type (bad BCD digit, impossible date, IV
//! flag) are kept as [`MBusRecordValue::Invalid`] instead of failing the decode.

use crate::constants::*;
use crate::error::{CursorError, MBusError};
use crate::payload::data_encoding::{
    decode_bcd, decode_bcd_unsigned, decode_date, decode_datetime_cp32, decode_datetime_cp48,
    decode_int, decode_real, decode_text,
};
use crate::payload::dif::{DataFieldCoding, DataInformationBlock, FunctionField};
use crate::payload::header::ByteOrder;
use crate::payload::vif::{parse_vib, ValueInformationBlock};
use crate::payload::vif_maps::{unit_label, DecodeHint, Quantity, Unit};
use crate::util::ByteCursor;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Represents the value of an M-Bus data record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MBusRecordValue {
    /// No data, or selection for readout.
    NoData,
    Integer(i64),
    Bcd(i64),
    Real(f32),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Variable length binary data too long for an integer.
    Binary(Vec<u8>),
    /// Raw bytes that are not a valid instance of the declared type.
    Invalid(Vec<u8>),
}

impl MBusRecordValue {
    /// Numeric value before scaling, if the value is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MBusRecordValue::Integer(value) | MBusRecordValue::Bcd(value) => Some(*value as f64),
            MBusRecordValue::Real(value) => Some(f64::from(*value)),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

/// Represents the M-Bus data record header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MBusDataRecordHeader {
    pub dib: DataInformationBlock,
    pub vib: ValueInformationBlock,
}

impl MBusDataRecordHeader {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.dib.to_bytes();
        bytes.extend(self.vib.to_bytes());
        bytes
    }
}

/// Represents an M-Bus data record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MBusRecord {
    /// Offset of the DIF in the parsed buffer.
    pub offset: usize,
    pub header: MBusDataRecordHeader,
    pub value: MBusRecordValue,
}

impl MBusRecord {
    pub fn new(dib: DataInformationBlock, vib: ValueInformationBlock, value: MBusRecordValue) -> Self {
        Self {
            offset: 0,
            header: MBusDataRecordHeader { dib, vib },
            value,
        }
    }

    pub fn function(&self) -> FunctionField {
        self.header.dib.function
    }

    pub fn storage_number(&self) -> u64 {
        self.header.dib.storage_number
    }

    pub fn tariff(&self) -> u32 {
        self.header.dib.tariff
    }

    pub fn sub_unit(&self) -> u16 {
        self.header.dib.sub_unit
    }

    pub fn quantity(&self) -> Quantity {
        self.header.vib.quantity
    }

    pub fn unit(&self) -> Unit {
        self.header.vib.unit
    }

    pub fn exponent(&self) -> i8 {
        self.header.vib.exponent
    }

    /// Label of the scaled unit, e.g. "litre" or "kWh"; the text itself for plain text VIFs.
    pub fn unit_label(&self) -> String {
        match &self.header.vib.plain_text_unit {
            Some(text) => text.clone(),
            None => unit_label(self.unit(), self.exponent()),
        }
    }

    /// Value in the base unit, i.e. multiplied by `10^exponent`.
    pub fn scaled_value(&self) -> Option<f64> {
        self.value
            .as_f64()
            .map(|value| value * 10f64.powi(i32::from(self.exponent())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LvarKind {
    Text,
    PositiveBcd,
    NegativeBcd,
    Binary,
}

/// Value length and kind announced by an LVAR byte.
///
/// BCD LVARs only go up to 9 bytes: 0xCA..=0xCF and 0xDA..=0xDF are reserved,
/// as is everything from 0xF7 up. A reserved LVAR yields `None`.
fn lvar_layout(lvar: u8) -> Option<(usize, LvarKind)> {
    let layout = match lvar {
        0x00..=MBUS_LVAR_TEXT_MAX => (usize::from(lvar), LvarKind::Text),
        0xC0..=0xC9 => (usize::from(lvar - MBUS_LVAR_BCD_POSITIVE), LvarKind::PositiveBcd),
        0xD0..=0xD9 => (usize::from(lvar - MBUS_LVAR_BCD_NEGATIVE), LvarKind::NegativeBcd),
        0xE0..=0xEF => (usize::from(lvar - MBUS_LVAR_BINARY), LvarKind::Binary),
        0xF0..=0xF4 => (16 + 4 * usize::from(lvar - MBUS_LVAR_BINARY_LONG), LvarKind::Binary),
        0xF5 => (48, LvarKind::Binary),
        0xF6 => (64, LvarKind::Binary),
        _ => return None,
    };
    Some(layout)
}

/// Byte count and LVAR byte that describe `value` in a variable length field.
pub(crate) fn lvar_for(value: &MBusRecordValue) -> Option<u8> {
    match value {
        MBusRecordValue::Text(text) => u8::try_from(text.chars().count())
            .ok()
            .filter(|len| *len <= MBUS_LVAR_TEXT_MAX),
        MBusRecordValue::Binary(bytes) => match bytes.len() {
            0 => Some(MBUS_LVAR_BINARY),
            len @ 9..=15 => Some(MBUS_LVAR_BINARY + len as u8),
            len @ (16 | 20 | 24 | 28 | 32) => Some(MBUS_LVAR_BINARY_LONG + ((len - 16) / 4) as u8),
            48 => Some(0xF5),
            64 => Some(0xF6),
            _ => None,
        },
        _ => None,
    }
}

fn numeric_bytes(raw: &[u8], order: ByteOrder) -> Vec<u8> {
    let mut bytes = raw.to_vec();
    if order == ByteOrder::MsbFirst {
        bytes.reverse();
    }
    bytes
}

fn decode_integer_field(raw: &[u8], order: ByteOrder, hint: DecodeHint) -> MBusRecordValue {
    let bytes = numeric_bytes(raw, order);
    let decoded = match (hint, bytes.len()) {
        (DecodeHint::Date | DecodeHint::DateTime, 2) => {
            decode_date(&bytes).map(|(_, date)| MBusRecordValue::Date(date))
        }
        (DecodeHint::DateTime, 4) => {
            decode_datetime_cp32(&bytes).map(|(_, dt)| MBusRecordValue::DateTime(dt))
        }
        (DecodeHint::DateTime, 6) => {
            decode_datetime_cp48(&bytes).map(|(_, dt)| MBusRecordValue::DateTime(dt))
        }
        (_, width) => decode_int(&bytes, width).map(|(_, value)| MBusRecordValue::Integer(value)),
    };
    decoded.unwrap_or_else(|_| MBusRecordValue::Invalid(raw.to_vec()))
}

fn decode_lvar(
    cursor: &mut ByteCursor<'_>,
    record_start: usize,
) -> Result<MBusRecordValue, MBusError> {
    let truncated = |e: CursorError| e.into_truncated_record(record_start);
    let lvar_offset = cursor.position();
    let lvar = cursor.take_u8().map_err(truncated)?;
    let (len, kind) = lvar_layout(lvar).ok_or(MBusError::UnsupportedLvar {
        offset: lvar_offset,
        lvar,
    })?;
    let bytes = cursor.take(len).map_err(truncated)?;
    let invalid = || MBusRecordValue::Invalid(bytes.to_vec());

    let value = match kind {
        LvarKind::Text => decode_text(bytes, len)
            .map(|(_, text)| MBusRecordValue::Text(text))
            .unwrap_or_else(|_| invalid()),
        LvarKind::PositiveBcd | LvarKind::NegativeBcd => match decode_bcd_unsigned(bytes, len) {
            Ok((_, magnitude)) => {
                let value = magnitude as i64;
                MBusRecordValue::Bcd(if kind == LvarKind::NegativeBcd { -value } else { value })
            }
            Err(_) => invalid(),
        },
        LvarKind::Binary if (1..=8).contains(&len) => decode_int(bytes, len)
            .map(|(_, value)| MBusRecordValue::Integer(value))
            .unwrap_or_else(|_| invalid()),
        LvarKind::Binary => MBusRecordValue::Binary(bytes.to_vec()),
    };
    Ok(value)
}

/// Reads the value of a record whose DIB has already been consumed.
pub fn parse_value(
    cursor: &mut ByteCursor<'_>,
    dib: &DataInformationBlock,
    vib: &ValueInformationBlock,
    record_start: usize,
    order: ByteOrder,
) -> Result<MBusRecordValue, MBusError> {
    let truncated = |e: CursorError| e.into_truncated_record(record_start);

    let value = match dib.coding {
        DataFieldCoding::NoData
        | DataFieldCoding::SelectionForReadout
        | DataFieldCoding::Special => MBusRecordValue::NoData,
        DataFieldCoding::Integer(width) => {
            let raw = cursor.take(usize::from(width)).map_err(truncated)?;
            decode_integer_field(raw, order, vib.hint)
        }
        DataFieldCoding::Real32 => {
            let raw = cursor.take(4).map_err(truncated)?;
            decode_real(&numeric_bytes(raw, order))
                .map(|(_, value)| MBusRecordValue::Real(value))
                .unwrap_or_else(|_| MBusRecordValue::Invalid(raw.to_vec()))
        }
        DataFieldCoding::Bcd(width) => {
            let raw = cursor.take(usize::from(width)).map_err(truncated)?;
            decode_bcd(&numeric_bytes(raw, order), usize::from(width))
                .map(|(_, value)| MBusRecordValue::Bcd(value))
                .unwrap_or_else(|_| MBusRecordValue::Invalid(raw.to_vec()))
        }
        DataFieldCoding::VariableLength => decode_lvar(cursor, record_start)?,
    };
    Ok(value)
}

/// Reads the VIB and value of a record whose DIB has already been consumed.
pub fn parse_record(
    cursor: &mut ByteCursor<'_>,
    dib: DataInformationBlock,
    record_start: usize,
    order: ByteOrder,
) -> Result<MBusRecord, MBusError> {
    let vib = parse_vib(cursor, record_start)?;
    let value = parse_value(cursor, &dib, &vib, record_start, order)?;

    log::debug!(
        target: "mbus::payload",
        "Record at offset {record_start}: {} {:?} ({}) storage={} tariff={}",
        vib.quantity,
        value,
        unit_label(vib.unit, vib.exponent),
        dib.storage_number,
        dib.tariff
    );

    Ok(MBusRecord {
        offset: record_start,
        header: MBusDataRecordHeader { dib, vib },
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::dif::{parse_dib, DataInformation};

    fn parse(bytes: &[u8]) -> Result<MBusRecord, MBusError> {
        let mut cursor = ByteCursor::new(bytes);
        let DataInformation::Record(dib) = parse_dib(&mut cursor, 0)? else {
            panic!("expected a data record");
        };
        parse_record(&mut cursor, dib, 0, ByteOrder::LsbFirst)
    }

    #[test]
    fn test_integer_litre() {
        let record = parse(&[0x01, 0x13, 0x2A]).unwrap();
        assert_eq!(record.value, MBusRecordValue::Integer(42));
        assert_eq!(record.unit_label(), "litre");
        assert_eq!(record.quantity(), Quantity::Volume);
        assert!((record.scaled_value().unwrap() - 0.042).abs() < 1e-12);
    }

    #[test]
    fn test_bcd_energy() {
        let record = parse(&[0x0C, 0x06, 0x78, 0x56, 0x34, 0x12]).unwrap();
        assert_eq!(record.value, MBusRecordValue::Bcd(12345678));
        assert_eq!(record.unit_label(), "kWh");
    }

    #[test]
    fn test_invalid_bcd_keeps_width() {
        let record = parse(&[0x0A, 0x13, 0xAB, 0x01]).unwrap();
        assert_eq!(record.value, MBusRecordValue::Invalid(vec![0xAB, 0x01]));
    }

    #[test]
    fn test_date_and_datetime() {
        let record = parse(&[0x02, 0x6C, 0x0F, 0x33]).unwrap();
        assert_eq!(
            record.value,
            MBusRecordValue::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        );
        let record = parse(&[0x04, 0x6D, 0x22, 0x0C, 0x0F, 0x33]).unwrap();
        assert!(matches!(record.value, MBusRecordValue::DateTime(_)));
    }

    #[test]
    fn test_lvar_values() {
        assert_eq!(parse(&[0x0D, 0x13, 0xC1, 0x12]).unwrap().value, MBusRecordValue::Bcd(12));
        assert_eq!(
            parse(&[0x0D, 0x13, 0xD3, 0x12, 0x34, 0x56]).unwrap().value,
            MBusRecordValue::Bcd(-563412)
        );
        assert_eq!(
            parse(&[0x0D, 0xFD, 0x11, 0x02, 0x31, 0x32]).unwrap().value,
            MBusRecordValue::Text("21".to_string())
        );
        assert_eq!(parse(&[0x0D, 0x13, 0xE1, 0xFF]).unwrap().value, MBusRecordValue::Integer(-1));
        assert_eq!(
            parse(&[0x0D, 0x13, 0xCA, 0x00]).unwrap_err(),
            MBusError::UnsupportedLvar { offset: 2, lvar: 0xCA }
        );
    }

    #[test]
    fn test_reserved_bcd_lvars() {
        assert_eq!(lvar_layout(0xC9), Some((9, LvarKind::PositiveBcd)));
        assert_eq!(lvar_layout(0xD9), Some((9, LvarKind::NegativeBcd)));
        for lvar in (0xCA..=0xCF).chain(0xDA..=0xDF).chain(0xF7..=0xFF) {
            assert_eq!(lvar_layout(lvar), None, "LVAR 0x{lvar:02X}");
        }
        assert_eq!(
            parse(&[0x0D, 0x13, 0xCF, 0x12, 0x34]).unwrap_err(),
            MBusError::UnsupportedLvar { offset: 2, lvar: 0xCF }
        );
    }

    #[test]
    fn test_real_value() {
        let mut bytes = vec![0x05, 0x5B];
        bytes.extend_from_slice(&21.5f32.to_le_bytes());
        assert_eq!(parse(&bytes).unwrap().value, MBusRecordValue::Real(21.5));
    }

    #[test]
    fn test_truncated_value() {
        assert_eq!(
            parse(&[0x04, 0x13, 0x01, 0x02]).unwrap_err(),
            MBusError::TruncatedRecord {
                offset: 0,
                needed: 6,
                available: 4
            }
        );
    }

    #[test]
    fn test_msb_first_integer() {
        let mut cursor = ByteCursor::new(&[0x02, 0x13, 0x01, 0x02]);
        let DataInformation::Record(dib) = parse_dib(&mut cursor, 0).unwrap() else {
            panic!("expected a data record");
        };
        let record = parse_record(&mut cursor, dib, 0, ByteOrder::MsbFirst).unwrap();
        assert_eq!(record.value, MBusRecordValue::Integer(0x0102));
    }
}
