//! Data Information Block (DIF + DIFE chain) decoding.
//!
//! The DIF carries the data field coding (low nibble), the function field and
//! the lowest storage number bit. Each DIFE adds four storage number bits, two
//! tariff bits and one sub-unit bit, least significant first.

use crate::constants::*;
use crate::error::{ExtensionChain, MBusError};
use crate::payload::data_encoding::MBusEncodeError;
use crate::util::ByteCursor;
use serde::Serialize;

/// Function field of the DIF (bits 4-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FunctionField {
    Instantaneous,
    Maximum,
    Minimum,
    DuringError,
}

impl FunctionField {
    pub fn from_dif(dif: u8) -> Self {
        match (dif & MBUS_DATA_RECORD_DIF_MASK_FUNCTION) >> 4 {
            0 => FunctionField::Instantaneous,
            1 => FunctionField::Maximum,
            2 => FunctionField::Minimum,
            _ => FunctionField::DuringError,
        }
    }

    fn bits(&self) -> u8 {
        match self {
            FunctionField::Instantaneous => 0x00,
            FunctionField::Maximum => 0x10,
            FunctionField::Minimum => 0x20,
            FunctionField::DuringError => 0x30,
        }
    }
}

/// Data field coding of the DIF (bits 0-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataFieldCoding {
    NoData,
    /// Signed integer of the given byte width.
    Integer(u8),
    Real32,
    SelectionForReadout,
    /// BCD of the given byte width.
    Bcd(u8),
    VariableLength,
    Special,
}

impl DataFieldCoding {
    pub fn from_dif(dif: u8) -> Self {
        match dif & MBUS_DATA_RECORD_DIF_MASK_DATA {
            0x00 => DataFieldCoding::NoData,
            0x01 => DataFieldCoding::Integer(1),
            0x02 => DataFieldCoding::Integer(2),
            0x03 => DataFieldCoding::Integer(3),
            0x04 => DataFieldCoding::Integer(4),
            0x05 => DataFieldCoding::Real32,
            0x06 => DataFieldCoding::Integer(6),
            0x07 => DataFieldCoding::Integer(8),
            0x08 => DataFieldCoding::SelectionForReadout,
            0x09 => DataFieldCoding::Bcd(1),
            0x0A => DataFieldCoding::Bcd(2),
            0x0B => DataFieldCoding::Bcd(3),
            0x0C => DataFieldCoding::Bcd(4),
            0x0D => DataFieldCoding::VariableLength,
            0x0E => DataFieldCoding::Bcd(6),
            _ => DataFieldCoding::Special,
        }
    }

    /// Low nibble of the DIF for this coding.
    pub fn nibble(&self) -> u8 {
        match self {
            DataFieldCoding::NoData => 0x00,
            DataFieldCoding::Integer(1) => 0x01,
            DataFieldCoding::Integer(2) => 0x02,
            DataFieldCoding::Integer(3) => 0x03,
            DataFieldCoding::Integer(4) => 0x04,
            DataFieldCoding::Real32 => 0x05,
            DataFieldCoding::Integer(6) => 0x06,
            DataFieldCoding::Integer(_) => 0x07,
            DataFieldCoding::SelectionForReadout => 0x08,
            DataFieldCoding::Bcd(1) => 0x09,
            DataFieldCoding::Bcd(2) => 0x0A,
            DataFieldCoding::Bcd(3) => 0x0B,
            DataFieldCoding::Bcd(4) => 0x0C,
            DataFieldCoding::VariableLength => 0x0D,
            DataFieldCoding::Bcd(_) => 0x0E,
            DataFieldCoding::Special => 0x0F,
        }
    }

    /// Fixed value width in bytes; `None` for variable length data.
    pub fn width(&self) -> Option<usize> {
        match self {
            DataFieldCoding::NoData
            | DataFieldCoding::SelectionForReadout
            | DataFieldCoding::Special => Some(0),
            DataFieldCoding::Integer(width) | DataFieldCoding::Bcd(width) => {
                Some(usize::from(*width))
            }
            DataFieldCoding::Real32 => Some(4),
            DataFieldCoding::VariableLength => None,
        }
    }
}

/// A decoded DIF with its DIFE chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataInformationBlock {
    pub dif: u8,
    pub difes: Vec<u8>,
    pub function: FunctionField,
    pub coding: DataFieldCoding,
    pub storage_number: u64,
    pub tariff: u32,
    pub sub_unit: u16,
}

impl DataInformationBlock {
    /// Builds the DIF/DIFE bytes describing a record, using as few DIFEs as possible.
    pub fn new(
        function: FunctionField,
        coding: DataFieldCoding,
        storage_number: u64,
        tariff: u32,
        sub_unit: u16,
    ) -> Result<Self, MBusEncodeError> {
        let mut storage = storage_number >> 1;
        let mut tariff_bits = tariff;
        let mut unit_bits = sub_unit;
        let mut difes = Vec::new();

        while storage != 0 || tariff_bits != 0 || unit_bits != 0 {
            if difes.len() == MBUS_MAX_EXTENSION_CHAIN {
                return Err(MBusEncodeError::ChainTooLong(difes.len() + 1));
            }
            let dife = (storage & 0x0F) as u8
                | ((tariff_bits & 0x03) as u8) << 4
                | ((unit_bits & 0x01) as u8) << 6;
            difes.push(dife);
            storage >>= 4;
            tariff_bits >>= 2;
            unit_bits >>= 1;
        }

        // Every byte but the last announces a successor.
        let chain_len = difes.len();
        for dife in difes.iter_mut().take(chain_len.saturating_sub(1)) {
            *dife |= MBUS_DIB_DIF_EXTENSION_BIT;
        }

        let mut dif = function.bits() | coding.nibble();
        if storage_number & 1 != 0 {
            dif |= MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO;
        }
        if !difes.is_empty() {
            dif |= MBUS_DIB_DIF_EXTENSION_BIT;
        }

        Ok(Self {
            dif,
            difes,
            function,
            coding,
            storage_number,
            tariff,
            sub_unit,
        })
    }

    /// Raw DIF and DIFE bytes in transmission order.
    pub fn to_bytes(&self) -> Vec<u8> {
        std::iter::once(self.dif)
            .chain(self.difes.iter().copied())
            .collect()
    }
}

/// Outcome of reading one DIF position in the user data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataInformation {
    Record(DataInformationBlock),
    /// 0x2F, skipped.
    IdleFiller,
    /// 0x0F or 0x1F: the rest of the user data is manufacturer specific.
    ManufacturerSpecific { more_records_follow: bool },
    /// Any other special function DIF.
    Reserved(u8),
}

/// Reads a DIF and its DIFE chain.
///
/// Truncation maps to `TruncatedRecord` anchored at `record_start`; a chain of
/// more than `MBUS_MAX_EXTENSION_CHAIN` DIFEs is a `MalformedDifChain`.
pub fn parse_dib(
    cursor: &mut ByteCursor<'_>,
    record_start: usize,
) -> Result<DataInformation, MBusError> {
    let dif = cursor
        .take_u8()
        .map_err(|e| e.into_truncated_record(record_start))?;

    match dif {
        MBUS_DIB_DIF_IDLE_FILLER => return Ok(DataInformation::IdleFiller),
        MBUS_DIB_DIF_MANUFACTURER_SPECIFIC => {
            return Ok(DataInformation::ManufacturerSpecific {
                more_records_follow: false,
            })
        }
        MBUS_DIB_DIF_MORE_RECORDS_FOLLOW => {
            return Ok(DataInformation::ManufacturerSpecific {
                more_records_follow: true,
            })
        }
        _ if dif & MBUS_DATA_RECORD_DIF_MASK_DATA == 0x0F => {
            return Ok(DataInformation::Reserved(dif))
        }
        _ => {}
    }

    let mut storage_number = u64::from((dif & MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO) >> 6);
    let mut tariff = 0u32;
    let mut sub_unit = 0u16;
    let mut difes = Vec::new();
    let mut last = dif;

    while last & MBUS_DIB_DIF_EXTENSION_BIT != 0 {
        if difes.len() == MBUS_MAX_EXTENSION_CHAIN {
            return Err(MBusError::MalformedDifChain {
                offset: cursor.position(),
                chain: ExtensionChain::Dife,
            });
        }
        let dife = cursor
            .take_u8()
            .map_err(|e| e.into_truncated_record(record_start))?;
        let index = difes.len() as u32;
        storage_number |=
            u64::from(dife & MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO) << (1 + 4 * index);
        tariff |= u32::from((dife & MBUS_DATA_RECORD_DIFE_MASK_TARIFF) >> 4) << (2 * index);
        sub_unit |= u16::from((dife & MBUS_DATA_RECORD_DIFE_MASK_DEVICE) >> 6) << index;
        difes.push(dife);
        last = dife;
    }

    Ok(DataInformation::Record(DataInformationBlock {
        dif,
        difes,
        function: FunctionField::from_dif(dif),
        coding: DataFieldCoding::from_dif(dif),
        storage_number,
        tariff,
        sub_unit,
    }))
}
