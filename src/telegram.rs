//! # Telegram Decoding
//!
//! Entry points that turn a byte buffer into an [`MBusTelegram`]: the frame is
//! validated first, then the user data of a long frame is decoded according to
//! its CI field.
//!
//! ```rust
//! use mbus_telegram::{parse_telegram, MBusFrameType, MBusRecordValue};
//!
//! let bytes = [0x68, 0x06, 0x06, 0x68, 0x08, 0x01, 0x78, 0x01, 0x13, 0x2A, 0xBF, 0x16];
//! let telegram = parse_telegram(&bytes).unwrap();
//! assert_eq!(telegram.frame_type, MBusFrameType::Long);
//! assert_eq!(telegram.records[0].value, MBusRecordValue::Integer(42));
//! assert_eq!(telegram.records[0].unit_label(), "litre");
//! ```

use crate::config::{ParserConfig, TrailingInput};
use crate::error::MBusError;
use crate::mbus::control::{Address, Function};
use crate::mbus::frame::{read_frame, MBusFrame, MBusFrameType};
use crate::payload::data::parse_variable_data;
use crate::payload::header::{
    parse_long_header, parse_short_header, ApplicationError, ControlInformation, DataHeader,
};
use crate::payload::record::MBusRecord;
use crate::util::logging::{log_partial_decode, span_frame_processing};
use crate::util::ByteCursor;
use serde::Serialize;
use std::iter::FusedIterator;

/// A decoded telegram: frame metadata plus the records of its user data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MBusTelegram {
    pub frame_type: MBusFrameType,
    /// Offset of the start byte in the parsed buffer.
    pub frame_offset: usize,
    pub frame_len: usize,
    /// Raw control field; 0 for an acknowledgment.
    pub control: u8,
    /// Raw address field; 0 for an acknowledgment.
    pub address: u8,
    pub function: Option<Function>,
    pub addressing: Option<Address>,
    pub control_information: Option<ControlInformation>,
    pub header: Option<DataHeader>,
    /// Status reported by a CI 0x70 telegram.
    pub application_error: Option<ApplicationError>,
    /// Records in the order they appear in the user data.
    pub records: Vec<MBusRecord>,
    pub manufacturer_data: Option<Vec<u8>>,
    /// User data that was not decoded into records.
    pub unparsed: Vec<u8>,
    pub more_records_follow: bool,
    /// Recoverable condition that cut the record walk short.
    pub error: Option<MBusError>,
}

impl MBusTelegram {
    fn from_frame(frame: &MBusFrame<'_>) -> Self {
        Self {
            frame_type: frame.frame_type,
            frame_offset: frame.offset,
            frame_len: frame.len(),
            control: frame.control,
            address: frame.address,
            function: frame.function(),
            addressing: frame.address(),
            control_information: frame.control_information.map(ControlInformation::from_byte),
            header: None,
            application_error: None,
            records: Vec::new(),
            manufacturer_data: None,
            unparsed: Vec::new(),
            more_records_follow: false,
            error: None,
        }
    }

    /// Whether the whole user data decoded without a recoverable error.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Parses the first telegram in `input` with the default configuration.
pub fn parse_telegram(input: &[u8]) -> Result<MBusTelegram, MBusError> {
    parse_telegram_with_config(input, &ParserConfig::default())
}

/// Parses the first telegram in `input`.
///
/// Frame errors and malformed extension chains fail the parse. Truncated or
/// undecodable records yield a telegram whose `error` is set.
pub fn parse_telegram_with_config(
    input: &[u8],
    config: &ParserConfig,
) -> Result<MBusTelegram, MBusError> {
    let _span = span_frame_processing(input.len());
    let mut cursor = ByteCursor::new(input);
    let telegram = decode_telegram(&mut cursor, config)?;

    if config.trailing_input == TrailingInput::Reject && !cursor.is_empty() {
        return Err(MBusError::TrailingData {
            offset: cursor.position(),
            count: cursor.remaining(),
        });
    }
    Ok(telegram)
}

/// Like [`parse_telegram`], but a partially decoded telegram is an error.
pub fn parse_telegram_strict(input: &[u8]) -> Result<MBusTelegram, MBusError> {
    let telegram = parse_telegram(input)?;
    match telegram.error {
        Some(error) => Err(error),
        None => Ok(telegram),
    }
}

fn decode_telegram(
    cursor: &mut ByteCursor<'_>,
    config: &ParserConfig,
) -> Result<MBusTelegram, MBusError> {
    let frame = read_frame(cursor)?;
    let mut telegram = MBusTelegram::from_frame(&frame);

    if frame.frame_type.is_length_bearing() {
        if config.decode_application_layer {
            decode_user_data(&frame, &mut telegram, config)?;
        } else {
            telegram.unparsed = frame.payload.to_vec();
        }
    }
    Ok(telegram)
}

fn decode_user_data(
    frame: &MBusFrame<'_>,
    telegram: &mut MBusTelegram,
    config: &ParserConfig,
) -> Result<(), MBusError> {
    let Some(ci) = telegram.control_information else {
        return Ok(());
    };
    let mut cursor = ByteCursor::with_base(frame.payload, frame.payload_offset);
    let order = ci.byte_order();

    let header = match ci {
        ControlInformation::ApplicationError => {
            telegram.application_error = Some(
                cursor
                    .take_u8()
                    .map_or(ApplicationError::Unspecified, ApplicationError::from),
            );
            telegram.unparsed = cursor.take_rest().to_vec();
            return Ok(());
        }
        ControlInformation::VariableDataLongHeader { .. } => {
            parse_long_header(&mut cursor, order).map(|h| Some(DataHeader::Long(h)))
        }
        ControlInformation::VariableDataShortHeader => {
            parse_short_header(&mut cursor, order).map(|h| Some(DataHeader::Short(h)))
        }
        _ if ci.carries_records() => Ok(None),
        _ => {
            log::debug!(
                target: "mbus::payload",
                "CI 0x{:02X} not decoded, keeping {} bytes",
                ci.to_byte(),
                cursor.remaining()
            );
            telegram.unparsed = cursor.take_rest().to_vec();
            return Ok(());
        }
    };

    match header {
        Ok(header) => telegram.header = header,
        Err(error) => {
            log_partial_decode(&error, 0);
            telegram.unparsed = cursor.take_rest().to_vec();
            telegram.error = Some(error);
            return Ok(());
        }
    }

    let data = parse_variable_data(&mut cursor, order, config.max_records)?;
    telegram.records = data.records;
    telegram.manufacturer_data = data.manufacturer_data;
    telegram.more_records_follow = data.more_records_follow;
    telegram.error = data.error;
    telegram.unparsed = cursor.take_rest().to_vec();
    Ok(())
}

/// Decodes back-to-back telegrams from one buffer.
///
/// Yields each telegram in turn and stops after the first fatal error.
#[derive(Debug, Clone)]
pub struct TelegramIter<'a> {
    cursor: ByteCursor<'a>,
    config: ParserConfig,
    done: bool,
}

impl<'a> TelegramIter<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, ParserConfig::default())
    }

    pub fn with_config(input: &'a [u8], config: ParserConfig) -> Self {
        Self {
            cursor: ByteCursor::new(input),
            config,
            done: false,
        }
    }

    /// Bytes not consumed yet; after an error they start at the failed frame.
    pub fn remaining(&self) -> &'a [u8] {
        self.cursor.as_slice()
    }
}

impl Iterator for TelegramIter<'_> {
    type Item = Result<MBusTelegram, MBusError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.is_empty() {
            return None;
        }
        let result = decode_telegram(&mut self.cursor, &self.config);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl FusedIterator for TelegramIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::record::MBusRecordValue;

    const LONG_FRAME: [u8; 12] = [
        0x68, 0x06, 0x06, 0x68, 0x08, 0x01, 0x78, 0x01, 0x13, 0x2A, 0xBF, 0x16,
    ];

    #[test]
    fn test_ack_and_short() {
        let ack = parse_telegram(&[0xE5]).unwrap();
        assert_eq!(ack.frame_type, MBusFrameType::Ack);
        assert!(ack.records.is_empty());
        assert_eq!(ack.function, None);

        let short = parse_telegram(&[0x10, 0x7B, 0x8B, 0x06, 0x16]).unwrap();
        assert_eq!(short.frame_type, MBusFrameType::Short);
        assert_eq!(short.function, Some(Function::ReqUd2 { fcb: true }));
    }

    #[test]
    fn test_long_frame_record() {
        let telegram = parse_telegram(&LONG_FRAME).unwrap();
        assert_eq!(
            telegram.control_information,
            Some(ControlInformation::VariableDataNoHeader)
        );
        assert_eq!(telegram.records.len(), 1);
        assert_eq!(telegram.records[0].value, MBusRecordValue::Integer(42));
        assert_eq!(telegram.records[0].offset, 7);
        assert!(telegram.is_complete());
        assert!(telegram.unparsed.is_empty());
    }

    #[test]
    fn test_trailing_input_policy() {
        let mut bytes = LONG_FRAME.to_vec();
        bytes.push(0xE5);
        assert!(parse_telegram(&bytes).is_ok());

        let config = ParserConfig::default().with_trailing_input(TrailingInput::Reject);
        assert_eq!(
            parse_telegram_with_config(&bytes, &config).unwrap_err(),
            MBusError::TrailingData { offset: 12, count: 1 }
        );
    }

    #[test]
    fn test_frame_only_config() {
        let telegram = parse_telegram_with_config(&LONG_FRAME, &ParserConfig::frame_only()).unwrap();
        assert!(telegram.records.is_empty());
        assert_eq!(telegram.unparsed, vec![0x01, 0x13, 0x2A]);
    }

    #[test]
    fn test_application_error() {
        // CI 0x70 with status 0x03
        let bytes = [0x68, 0x04, 0x04, 0x68, 0x08, 0x01, 0x70, 0x03, 0x7C, 0x16];
        let telegram = parse_telegram(&bytes).unwrap();
        assert_eq!(telegram.application_error, Some(ApplicationError::TooManyRecords));
        assert!(telegram.records.is_empty());
    }

    #[test]
    fn test_truncated_long_header_is_partial() {
        // CI 0x72 followed by only two header bytes
        let bytes = [0x68, 0x05, 0x05, 0x68, 0x08, 0x01, 0x72, 0x78, 0x56, 0x49, 0x16];
        let telegram = parse_telegram(&bytes).unwrap();
        assert!(telegram.records.is_empty());
        assert_eq!(
            telegram.error,
            Some(MBusError::TruncatedRecord {
                offset: 7,
                needed: 12,
                available: 2
            })
        );
        assert!(parse_telegram_strict(&bytes).is_err());
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut bytes = vec![0xE5];
        bytes.extend_from_slice(&LONG_FRAME);
        bytes.extend_from_slice(&[0x10, 0x7B, 0x8B, 0x07, 0x16, 0xE5]);
        let mut iter = TelegramIter::new(&bytes);
        assert_eq!(iter.next().unwrap().unwrap().frame_type, MBusFrameType::Ack);
        assert_eq!(iter.next().unwrap().unwrap().frame_type, MBusFrameType::Long);
        assert!(matches!(
            iter.next(),
            Some(Err(MBusError::ChecksumMismatch { offset: 16, .. }))
        ));
        assert!(iter.next().is_none());
        assert_eq!(iter.remaining().len(), 6);
    }
}
