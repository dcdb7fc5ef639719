//! # M-Bus Data Encoding and Decoding
//!
//! This module provides the primitive value codecs of the M-Bus application
//! layer (EN 13757-3, Annex A): little-endian signed integers (type B), BCD
//! (type A), IEEE 754 reals (type H), the compound date types G (CP16),
//! F (CP32) and I (CP48), reversed ASCII text and the 15-bit manufacturer id.
//!
//! Decoders follow the `nom` convention and are always handed the exact value
//! slice, so a decoder error means the bytes are not a valid instance of the
//! type (e.g. a non-decimal BCD digit), never that input ran short.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use nom::{
    bytes::complete::take,
    combinator::map,
    error::{Error as NomError, ErrorKind},
    number::complete::le_f32,
    IResult,
};
use thiserror::Error;

/// Errors raised by the value encoders.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MBusEncodeError {
    #[error("Invalid value width: {0} bytes")]
    InvalidWidth(usize),
    #[error("Value {value} does not fit in {width} bytes")]
    ValueOutOfRange { value: i64, width: usize },
    #[error("Invalid manufacturer code: {0}")]
    InvalidManufacturer(String),
    #[error("Date outside the encodable range 1981-2080")]
    DateOutOfRange,
    #[error("Text of {0} bytes is too long")]
    TextTooLong(usize),
    #[error("Value cannot be encoded with data field coding {0}")]
    ValueMismatch(String),
    #[error("Extension chain needs {0} bytes")]
    ChainTooLong(usize),
    #[error("User data of {0} bytes does not fit in a long frame")]
    PayloadTooLong(usize),
}

fn verify_error<T>(input: &[u8]) -> IResult<&[u8], T> {
    Err(nom::Err::Error(NomError::new(input, ErrorKind::Verify)))
}

fn take_bytes(input: &[u8], count: usize) -> IResult<&[u8], &[u8]> {
    take(count)(input)
}

/// Longest BCD field that still fits an `i64` (18 digits).
const MAX_BCD_BYTES: usize = 9;

/// Decodes a little-endian two's complement integer of 1 to 8 bytes.
pub fn decode_int(input: &[u8], size: usize) -> IResult<&[u8], i64> {
    if size == 0 || size > 8 {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::LengthValue)));
    }
    map(take(size), |bytes: &[u8]| {
        let raw = bytes
            .iter()
            .rev()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        let shift = 64 - 8 * size as u32;
        ((raw << shift) as i64) >> shift
    })(input)
}

/// Decodes a little-endian unsigned integer of up to 8 bytes.
pub fn decode_uint(input: &[u8], size: usize) -> IResult<&[u8], u64> {
    if size > 8 {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::LengthValue)));
    }
    map(take(size), |bytes: &[u8]| {
        bytes
            .iter()
            .rev()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    })(input)
}

/// Decodes a little-endian BCD number of `size` bytes.
///
/// A high nibble of `F` in the most significant byte marks a negative value.
pub fn decode_bcd(input: &[u8], size: usize) -> IResult<&[u8], i64> {
    if size > MAX_BCD_BYTES {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::LengthValue)));
    }
    let (rest, bytes) = take_bytes(input, size)?;
    let mut value: i64 = 0;
    let mut negative = false;

    for (idx, byte) in bytes.iter().enumerate().rev() {
        let high = byte >> 4;
        let low = byte & 0x0F;
        if idx + 1 == size && high == 0x0F {
            negative = true;
        } else if high > 9 {
            return verify_error(input);
        } else {
            value = value * 10 + i64::from(high);
        }
        if low > 9 {
            return verify_error(input);
        }
        value = value * 10 + i64::from(low);
    }

    Ok((rest, if negative { -value } else { value }))
}

/// Decodes an unsigned little-endian BCD number; no sign nibble is accepted.
pub fn decode_bcd_unsigned(input: &[u8], size: usize) -> IResult<&[u8], u64> {
    if size > MAX_BCD_BYTES {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::LengthValue)));
    }
    let (rest, bytes) = take_bytes(input, size)?;
    let mut value: u64 = 0;
    for byte in bytes.iter().rev() {
        let (high, low) = (byte >> 4, byte & 0x0F);
        if high > 9 || low > 9 {
            return verify_error(input);
        }
        value = value * 100 + u64::from(high) * 10 + u64::from(low);
    }
    Ok((rest, value))
}

/// Decodes a 4-byte IEEE 754 single precision real.
pub fn decode_real(input: &[u8]) -> IResult<&[u8], f32> {
    le_f32(input)
}

fn year_from_two_digits(year: u8) -> Option<i32> {
    match year {
        0..=80 => Some(2000 + i32::from(year)),
        81..=99 => Some(1900 + i32::from(year)),
        _ => None,
    }
}

fn cp16_date(low: u8, high: u8) -> Option<NaiveDate> {
    let day = low & 0x1F;
    let month = high & 0x0F;
    let year = ((low & 0xE0) >> 5) | ((high & 0xF0) >> 1);
    NaiveDate::from_ymd_opt(
        year_from_two_digits(year)?,
        u32::from(month),
        u32::from(day),
    )
}

/// Decodes a type G (CP16) date.
pub fn decode_date(input: &[u8]) -> IResult<&[u8], NaiveDate> {
    let (rest, bytes) = take_bytes(input, 2)?;
    match cp16_date(bytes[0], bytes[1]) {
        Some(date) => Ok((rest, date)),
        None => verify_error(input),
    }
}

/// Decodes a type F (CP32) date and time, minute resolution.
pub fn decode_datetime_cp32(input: &[u8]) -> IResult<&[u8], NaiveDateTime> {
    let (rest, bytes) = take_bytes(input, 4)?;
    // IV: time invalid
    if bytes[0] & 0x80 != 0 {
        return verify_error(input);
    }
    let minute = u32::from(bytes[0] & 0x3F);
    let hour = u32::from(bytes[1] & 0x1F);
    let date = cp16_date(bytes[2], bytes[3]);
    let time = NaiveTime::from_hms_opt(hour, minute, 0);
    match (date, time) {
        (Some(date), Some(time)) => Ok((rest, date.and_time(time))),
        _ => verify_error(input),
    }
}

/// Decodes a type I (CP48) date and time, second resolution.
pub fn decode_datetime_cp48(input: &[u8]) -> IResult<&[u8], NaiveDateTime> {
    let (rest, bytes) = take_bytes(input, 6)?;
    if bytes[1] & 0x80 != 0 {
        return verify_error(input);
    }
    let second = u32::from(bytes[0] & 0x3F);
    let minute = u32::from(bytes[1] & 0x3F);
    let hour = u32::from(bytes[2] & 0x1F);
    let date = cp16_date(bytes[3], bytes[4]);
    let time = NaiveTime::from_hms_opt(hour, minute, second);
    match (date, time) {
        (Some(date), Some(time)) => Ok((rest, date.and_time(time))),
        _ => verify_error(input),
    }
}

/// Decodes `len` bytes of text, transmitted last character first.
pub fn decode_text(input: &[u8], len: usize) -> IResult<&[u8], String> {
    map(take(len), |bytes: &[u8]| {
        bytes.iter().rev().map(|b| char::from(*b)).collect()
    })(input)
}

/// Renders a 15-bit manufacturer id as its three-letter code.
pub fn manufacturer_code(id: u16) -> String {
    [(id >> 10) & 0x1F, (id >> 5) & 0x1F, id & 0x1F]
        .iter()
        .map(|letter| char::from(*letter as u8 + 64))
        .collect()
}

/// Decodes a little-endian manufacturer id into its three-letter code.
pub fn decode_manufacturer(input: &[u8]) -> IResult<&[u8], String> {
    map(take(2usize), |bytes: &[u8]| {
        manufacturer_code(u16::from_le_bytes([bytes[0], bytes[1]]))
    })(input)
}

/// Encodes a signed integer into `size` little-endian bytes.
pub fn encode_int(value: i64, size: usize) -> Result<Vec<u8>, MBusEncodeError> {
    if size == 0 || size > 8 {
        return Err(MBusEncodeError::InvalidWidth(size));
    }
    let bits = 8 * size as u32;
    if bits < 64 {
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if value < min || value > max {
            return Err(MBusEncodeError::ValueOutOfRange { value, width: size });
        }
    }
    Ok(value.to_le_bytes()[..size].to_vec())
}

/// Encodes a number as `size` bytes of little-endian BCD.
///
/// Negative values use the `F` sign nibble, costing one digit.
pub fn encode_bcd(value: i64, size: usize) -> Result<Vec<u8>, MBusEncodeError> {
    if size == 0 || size > MAX_BCD_BYTES {
        return Err(MBusEncodeError::InvalidWidth(size));
    }
    let digits = if value < 0 { size * 2 - 1 } else { size * 2 };
    let mut magnitude = value.unsigned_abs();
    if magnitude >= 10u64.pow(digits as u32) {
        return Err(MBusEncodeError::ValueOutOfRange { value, width: size });
    }

    let mut out = vec![0u8; size];
    for byte in out.iter_mut() {
        let low = (magnitude % 10) as u8;
        magnitude /= 10;
        let high = (magnitude % 10) as u8;
        magnitude /= 10;
        *byte = (high << 4) | low;
    }
    if value < 0 {
        if let Some(last) = out.last_mut() {
            *last = (*last & 0x0F) | 0xF0;
        }
    }
    Ok(out)
}

/// Encodes a 4-byte IEEE 754 real.
pub fn encode_real(value: f32) -> [u8; 4] {
    value.to_le_bytes()
}

fn two_digit_year(year: i32) -> Result<u8, MBusEncodeError> {
    match year {
        2000..=2080 => Ok((year - 2000) as u8),
        1981..=1999 => Ok((year - 1900) as u8),
        _ => Err(MBusEncodeError::DateOutOfRange),
    }
}

fn encode_cp16(date: NaiveDate) -> Result<[u8; 2], MBusEncodeError> {
    use chrono::Datelike;
    let year = two_digit_year(date.year())?;
    Ok([
        date.day() as u8 | ((year & 0x07) << 5),
        date.month() as u8 | ((year & 0x78) << 1),
    ])
}

/// Encodes a type G (CP16) date.
pub fn encode_date(date: NaiveDate) -> Result<[u8; 2], MBusEncodeError> {
    encode_cp16(date)
}

/// Encodes a type F (CP32) date and time; seconds are dropped.
pub fn encode_datetime_cp32(datetime: NaiveDateTime) -> Result<[u8; 4], MBusEncodeError> {
    use chrono::Timelike;
    let [low, high] = encode_cp16(datetime.date())?;
    Ok([datetime.minute() as u8, datetime.hour() as u8, low, high])
}

/// Encodes a type I (CP48) date and time.
pub fn encode_datetime_cp48(datetime: NaiveDateTime) -> Result<[u8; 6], MBusEncodeError> {
    use chrono::Timelike;
    let [low, high] = encode_cp16(datetime.date())?;
    Ok([
        datetime.second() as u8,
        datetime.minute() as u8,
        datetime.hour() as u8,
        low,
        high,
        0,
    ])
}

/// Encodes text in transmission order (last character first).
pub fn encode_text(text: &str) -> Result<Vec<u8>, MBusEncodeError> {
    if !text.is_ascii() {
        return Err(MBusEncodeError::ValueMismatch("non-ASCII text".to_string()));
    }
    Ok(text.bytes().rev().collect())
}

/// Encodes a three-letter manufacturer code as little-endian id bytes.
pub fn encode_manufacturer(code: &str) -> Result<[u8; 2], MBusEncodeError> {
    let letters = code.as_bytes();
    if letters.len() != 3 || !letters.iter().all(|c| c.is_ascii_uppercase()) {
        return Err(MBusEncodeError::InvalidManufacturer(code.to_string()));
    }
    let id = letters
        .iter()
        .fold(0u16, |acc, c| (acc << 5) | u16::from(c - 64));
    Ok(id.to_le_bytes())
}
