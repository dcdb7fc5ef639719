//! # mbus-telegram - Wired M-Bus Telegram Decoder
//!
//! The mbus-telegram crate decodes wired M-Bus (Meter-Bus, EN 13757-2/3)
//! telegrams as read from utility meters: electricity, gas, water and heat.
//!
//! ## Features
//!
//! - Classify and validate link layer frames (ACK, short, control and long frames)
//! - Decode the control and address fields
//! - Decode the fixed data header (identification, manufacturer, medium, status)
//! - Decode variable data records: DIF/DIFE and VIF/VIFE chains, table driven units,
//!   integers, BCD, reals, dates, text and variable length data
//! - Keep the records decoded before a truncated or undecodable record
//! - Encode frames and records for testing and simulation
//!
//! Decoding is a pure function over a borrowed buffer: no I/O, no shared state,
//! every read is bounds checked and every extension chain is bounded.
//!
//! ## Usage
//!
//! ```rust
//! use mbus_telegram::{parse_telegram, MBusError, MBusFrameType};
//!
//! let telegram = parse_telegram(&[0x10, 0x7B, 0x8B, 0x06, 0x16]).unwrap();
//! assert_eq!(telegram.frame_type, MBusFrameType::Short);
//!
//! let err = parse_telegram(&[0x68, 0x04, 0x05, 0x68]).unwrap_err();
//! assert!(matches!(err, MBusError::LengthFieldMismatch { .. }));
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod mbus;
pub mod payload;
pub mod telegram;
pub mod util;

pub use crate::config::{ParserConfig, TrailingInput};
pub use crate::error::{ExtensionChain, MBusError};
pub use crate::logging::init_logger;

// Link layer
pub use mbus::{Address, FrameBuilder, Function, MBusFrame, MBusFrameType};

// Application layer
pub use payload::{
    ControlInformation, DataHeader, DeviceType, MBusEncodeError, MBusRecord, MBusRecordValue,
    Quantity, Unit,
};

pub use telegram::{
    parse_telegram, parse_telegram_strict, parse_telegram_with_config, MBusTelegram,
    TelegramIter,
};
