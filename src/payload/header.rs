//! # Control Information and Data Header
//!
//! The CI field of a long frame decides how the user data is laid out:
//!
//! | CI          | Layout                                             |
//! |-------------|----------------------------------------------------|
//! | 0x72 / 0x76 | 12-byte long header, then records (0x76 MSB first) |
//! | 0x7A        | 4-byte short header, then records                  |
//! | 0x78 / 0x51 | records only                                       |
//! | 0x70        | application error status                           |
//! | others      | not decoded                                        |

use crate::constants::*;
use crate::error::MBusError;
use crate::payload::data_encoding::{decode_bcd_unsigned, manufacturer_code, MBusEncodeError};
use crate::util::ByteCursor;
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

/// Numeric byte order of a variable data structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ByteOrder {
    #[default]
    LsbFirst,
    MsbFirst,
}

/// Classified control information field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlInformation {
    /// SND_UD from master, records without header.
    DataSend,
    /// Secondary address selection.
    SelectSlave,
    ApplicationError,
    VariableDataLongHeader { order: ByteOrder },
    FixedData { order: ByteOrder },
    VariableDataNoHeader,
    VariableDataShortHeader,
    Other(u8),
}

impl ControlInformation {
    pub fn from_byte(ci: u8) -> Self {
        match ci {
            MBUS_CONTROL_INFO_DATA_SEND => ControlInformation::DataSend,
            MBUS_CONTROL_INFO_SELECT_SLAVE => ControlInformation::SelectSlave,
            MBUS_CONTROL_INFO_ERROR_GENERAL => ControlInformation::ApplicationError,
            MBUS_CONTROL_INFO_RESP_VARIABLE => ControlInformation::VariableDataLongHeader {
                order: ByteOrder::LsbFirst,
            },
            MBUS_CONTROL_INFO_RESP_VARIABLE_MSB => ControlInformation::VariableDataLongHeader {
                order: ByteOrder::MsbFirst,
            },
            MBUS_CONTROL_INFO_RESP_FIXED => ControlInformation::FixedData {
                order: ByteOrder::LsbFirst,
            },
            MBUS_CONTROL_INFO_RESP_FIXED_MSB => ControlInformation::FixedData {
                order: ByteOrder::MsbFirst,
            },
            MBUS_CONTROL_INFO_RESP_NO_HEADER => ControlInformation::VariableDataNoHeader,
            MBUS_CONTROL_INFO_RESP_SHORT_HEADER => ControlInformation::VariableDataShortHeader,
            other => ControlInformation::Other(other),
        }
    }

    pub fn to_byte(&self) -> u8 {
        match self {
            ControlInformation::DataSend => MBUS_CONTROL_INFO_DATA_SEND,
            ControlInformation::SelectSlave => MBUS_CONTROL_INFO_SELECT_SLAVE,
            ControlInformation::ApplicationError => MBUS_CONTROL_INFO_ERROR_GENERAL,
            ControlInformation::VariableDataLongHeader {
                order: ByteOrder::LsbFirst,
            } => MBUS_CONTROL_INFO_RESP_VARIABLE,
            ControlInformation::VariableDataLongHeader {
                order: ByteOrder::MsbFirst,
            } => MBUS_CONTROL_INFO_RESP_VARIABLE_MSB,
            ControlInformation::FixedData {
                order: ByteOrder::LsbFirst,
            } => MBUS_CONTROL_INFO_RESP_FIXED,
            ControlInformation::FixedData {
                order: ByteOrder::MsbFirst,
            } => MBUS_CONTROL_INFO_RESP_FIXED_MSB,
            ControlInformation::VariableDataNoHeader => MBUS_CONTROL_INFO_RESP_NO_HEADER,
            ControlInformation::VariableDataShortHeader => MBUS_CONTROL_INFO_RESP_SHORT_HEADER,
            ControlInformation::Other(byte) => *byte,
        }
    }

    /// Whether the user data following the header is a sequence of data records.
    pub fn carries_records(&self) -> bool {
        matches!(
            self,
            ControlInformation::DataSend
                | ControlInformation::VariableDataLongHeader { .. }
                | ControlInformation::VariableDataNoHeader
                | ControlInformation::VariableDataShortHeader
        )
    }

    pub fn byte_order(&self) -> ByteOrder {
        match self {
            ControlInformation::VariableDataLongHeader { order }
            | ControlInformation::FixedData { order } => *order,
            _ => ByteOrder::LsbFirst,
        }
    }
}

bitflags! {
    /// Status byte of the data header.
    ///
    /// Bits 0-1 hold the application status: 01 busy, 10 error, 11 alarm.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub struct StatusField: u8 {
        const APPLICATION_BUSY = 0b0000_0001;
        const APPLICATION_ERROR = 0b0000_0010;
        const POWER_LOW = 0b0000_0100;
        const PERMANENT_ERROR = 0b0000_1000;
        const TEMPORARY_ERROR = 0b0001_0000;
        const MANUFACTURER_SPECIFIC_1 = 0b0010_0000;
        const MANUFACTURER_SPECIFIC_2 = 0b0100_0000;
        const MANUFACTURER_SPECIFIC_3 = 0b1000_0000;
    }
}

impl StatusField {
    /// Both application status bits set.
    pub fn is_alarm(&self) -> bool {
        self.contains(StatusField::APPLICATION_BUSY | StatusField::APPLICATION_ERROR)
    }
}

/// Medium (device type) byte of the long header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceType {
    Other,
    Oil,
    Electricity,
    Gas,
    HeatOutlet,
    Steam,
    WarmWater,
    Water,
    HeatCostAllocator,
    CompressedAir,
    CoolingOutlet,
    CoolingInlet,
    HeatInlet,
    HeatCooling,
    BusSystemComponent,
    Unknown,
    HotWater,
    ColdWater,
    DualRegisterWater,
    Pressure,
    AdConverter,
    SmokeDetector,
    RoomSensor,
    GasDetector,
    Breaker,
    Valve,
    CustomerUnit,
    WasteWater,
    Garbage,
    CarbonDioxide,
    CommunicationController,
    UnidirectionalRepeater,
    BidirectionalRepeater,
    RadioConverterSystemSide,
    RadioConverterMeterSide,
    Reserved(u8),
}

impl From<u8> for DeviceType {
    fn from(medium: u8) -> Self {
        match medium {
            0x00 => DeviceType::Other,
            0x01 => DeviceType::Oil,
            0x02 => DeviceType::Electricity,
            0x03 => DeviceType::Gas,
            0x04 => DeviceType::HeatOutlet,
            0x05 => DeviceType::Steam,
            0x06 => DeviceType::WarmWater,
            0x07 => DeviceType::Water,
            0x08 => DeviceType::HeatCostAllocator,
            0x09 => DeviceType::CompressedAir,
            0x0A => DeviceType::CoolingOutlet,
            0x0B => DeviceType::CoolingInlet,
            0x0C => DeviceType::HeatInlet,
            0x0D => DeviceType::HeatCooling,
            0x0E => DeviceType::BusSystemComponent,
            0x0F => DeviceType::Unknown,
            0x15 => DeviceType::HotWater,
            0x16 => DeviceType::ColdWater,
            0x17 => DeviceType::DualRegisterWater,
            0x18 => DeviceType::Pressure,
            0x19 => DeviceType::AdConverter,
            0x1A => DeviceType::SmokeDetector,
            0x1B => DeviceType::RoomSensor,
            0x1C => DeviceType::GasDetector,
            0x20 => DeviceType::Breaker,
            0x21 => DeviceType::Valve,
            0x25 => DeviceType::CustomerUnit,
            0x28 => DeviceType::WasteWater,
            0x29 => DeviceType::Garbage,
            0x2A => DeviceType::CarbonDioxide,
            0x31 => DeviceType::CommunicationController,
            0x32 => DeviceType::UnidirectionalRepeater,
            0x33 => DeviceType::BidirectionalRepeater,
            0x36 => DeviceType::RadioConverterSystemSide,
            0x37 => DeviceType::RadioConverterMeterSide,
            other => DeviceType::Reserved(other),
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::Other => "Other",
            DeviceType::Oil => "Oil",
            DeviceType::Electricity => "Electricity",
            DeviceType::Gas => "Gas",
            DeviceType::HeatOutlet => "Heat (outlet)",
            DeviceType::Steam => "Steam",
            DeviceType::WarmWater => "Warm water (30-90 °C)",
            DeviceType::Water => "Water",
            DeviceType::HeatCostAllocator => "Heat cost allocator",
            DeviceType::CompressedAir => "Compressed air",
            DeviceType::CoolingOutlet => "Cooling load meter (outlet)",
            DeviceType::CoolingInlet => "Cooling load meter (inlet)",
            DeviceType::HeatInlet => "Heat (inlet)",
            DeviceType::HeatCooling => "Heat / cooling load meter",
            DeviceType::BusSystemComponent => "Bus / system component",
            DeviceType::Unknown => "Unknown medium",
            DeviceType::HotWater => "Hot water (>= 90 °C)",
            DeviceType::ColdWater => "Cold water",
            DeviceType::DualRegisterWater => "Dual register (hot/cold) water",
            DeviceType::Pressure => "Pressure",
            DeviceType::AdConverter => "A/D converter",
            DeviceType::SmokeDetector => "Smoke detector",
            DeviceType::RoomSensor => "Room sensor",
            DeviceType::GasDetector => "Gas detector",
            DeviceType::Breaker => "Breaker (electricity)",
            DeviceType::Valve => "Valve (gas or water)",
            DeviceType::CustomerUnit => "Customer unit (display)",
            DeviceType::WasteWater => "Waste water",
            DeviceType::Garbage => "Garbage",
            DeviceType::CarbonDioxide => "Carbon dioxide",
            DeviceType::CommunicationController => "Communication controller",
            DeviceType::UnidirectionalRepeater => "Unidirectional repeater",
            DeviceType::BidirectionalRepeater => "Bidirectional repeater",
            DeviceType::RadioConverterSystemSide => "Radio converter (system side)",
            DeviceType::RadioConverterMeterSide => "Radio converter (meter side)",
            DeviceType::Reserved(byte) => return write!(f, "Reserved (0x{byte:02X})"),
        };
        f.write_str(name)
    }
}

/// Application error code carried after CI 0x70.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApplicationError {
    Unspecified,
    UnimplementedCi,
    BufferTooLong,
    TooManyRecords,
    PrematureEndOfRecord,
    TooManyDifes,
    TooManyVifes,
    ApplicationBusy,
    TooManyReadouts,
    Reserved(u8),
}

impl From<u8> for ApplicationError {
    fn from(code: u8) -> Self {
        match code {
            0x00 => ApplicationError::Unspecified,
            0x01 => ApplicationError::UnimplementedCi,
            0x02 => ApplicationError::BufferTooLong,
            0x03 => ApplicationError::TooManyRecords,
            0x04 => ApplicationError::PrematureEndOfRecord,
            0x05 => ApplicationError::TooManyDifes,
            0x06 => ApplicationError::TooManyVifes,
            0x08 => ApplicationError::ApplicationBusy,
            0x09 => ApplicationError::TooManyReadouts,
            other => ApplicationError::Reserved(other),
        }
    }
}

/// Three-letter manufacturer code packed into 15 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManufacturerCode(pub u16);

impl ManufacturerCode {
    pub fn from_code(code: &str) -> Result<Self, MBusEncodeError> {
        let bytes = crate::payload::data_encoding::encode_manufacturer(code)?;
        Ok(Self(u16::from_le_bytes(bytes)))
    }
}

impl fmt::Display for ManufacturerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&manufacturer_code(self.0))
    }
}

/// 12-byte header following CI 0x72 / 0x76.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongHeader {
    /// Identification number digits as transmitted (BCD, least significant byte first).
    pub identification: [u8; 4],
    pub manufacturer: ManufacturerCode,
    pub version: u8,
    /// Medium byte; see [`LongHeader::device_type`].
    pub medium: u8,
    pub access_number: u8,
    pub status: StatusField,
    pub signature: u16,
}

impl LongHeader {
    /// Identification number, `None` when the digits are not valid BCD.
    pub fn identification_number(&self) -> Option<u32> {
        decode_bcd_unsigned(&self.identification, 4)
            .ok()
            .map(|(_, id)| id as u32)
    }

    pub fn device_type(&self) -> DeviceType {
        DeviceType::from(self.medium)
    }

    /// Serializes the header in least-significant-byte-first order.
    pub fn to_bytes(&self) -> [u8; MBUS_LONG_HEADER_LENGTH] {
        let [m0, m1] = self.manufacturer.0.to_le_bytes();
        let [s0, s1] = self.signature.to_le_bytes();
        let [i0, i1, i2, i3] = self.identification;
        [
            i0,
            i1,
            i2,
            i3,
            m0,
            m1,
            self.version,
            self.medium,
            self.access_number,
            self.status.bits(),
            s0,
            s1,
        ]
    }
}

/// 4-byte header following CI 0x7A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShortHeader {
    pub access_number: u8,
    pub status: StatusField,
    pub signature: u16,
}

/// Transport header of a variable data response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DataHeader {
    Long(LongHeader),
    Short(ShortHeader),
}

impl DataHeader {
    pub fn access_number(&self) -> u8 {
        match self {
            DataHeader::Long(header) => header.access_number,
            DataHeader::Short(header) => header.access_number,
        }
    }

    pub fn status(&self) -> StatusField {
        match self {
            DataHeader::Long(header) => header.status,
            DataHeader::Short(header) => header.status,
        }
    }
}

fn ordered<const N: usize>(mut bytes: [u8; N], order: ByteOrder) -> [u8; N] {
    if order == ByteOrder::MsbFirst {
        bytes.reverse();
    }
    bytes
}

fn take_array<const N: usize>(
    cursor: &mut ByteCursor<'_>,
    start: usize,
) -> Result<[u8; N], MBusError> {
    let mut out = [0u8; N];
    let bytes = cursor.take(N).map_err(|e| e.into_truncated_record(start))?;
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Reads the 12-byte long header.
pub fn parse_long_header(
    cursor: &mut ByteCursor<'_>,
    order: ByteOrder,
) -> Result<LongHeader, MBusError> {
    let start = cursor.position();
    // Check the whole header up front so a short buffer consumes nothing.
    if cursor.remaining() < MBUS_LONG_HEADER_LENGTH {
        return Err(MBusError::TruncatedRecord {
            offset: start,
            needed: MBUS_LONG_HEADER_LENGTH,
            available: cursor.remaining(),
        });
    }

    let identification = ordered(take_array::<4>(cursor, start)?, order);
    let manufacturer = u16::from_le_bytes(ordered(take_array::<2>(cursor, start)?, order));
    let [version, medium, access_number, status] = take_array::<4>(cursor, start)?;
    let signature = u16::from_le_bytes(ordered(take_array::<2>(cursor, start)?, order));

    Ok(LongHeader {
        identification,
        manufacturer: ManufacturerCode(manufacturer),
        version,
        medium,
        access_number,
        status: StatusField::from_bits_retain(status),
        signature,
    })
}

/// Reads the 4-byte short header.
pub fn parse_short_header(
    cursor: &mut ByteCursor<'_>,
    order: ByteOrder,
) -> Result<ShortHeader, MBusError> {
    let start = cursor.position();
    if cursor.remaining() < MBUS_SHORT_HEADER_LENGTH {
        return Err(MBusError::TruncatedRecord {
            offset: start,
            needed: MBUS_SHORT_HEADER_LENGTH,
            available: cursor.remaining(),
        });
    }

    let [access_number, status] = take_array::<2>(cursor, start)?;
    let signature = u16::from_le_bytes(ordered(take_array::<2>(cursor, start)?, order));
    Ok(ShortHeader {
        access_number,
        status: StatusField::from_bits_retain(status),
        signature,
    })
}
