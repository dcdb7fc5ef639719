//! Value Information Block (VIF + VIFE chain) decoding.
//!
//! The VIF selects a table entry (primary, or one of the 0xFB/0xFD extension
//! tables whose code is the first VIFE). Remaining VIFEs are combinable
//! descriptors that may correct the exponent. The chain is bounded at
//! `MBUS_MAX_EXTENSION_CHAIN` bytes.

use crate::constants::*;
use crate::error::{ExtensionChain, MBusError};
use crate::payload::data_encoding::decode_text;
use crate::payload::vif_maps::{
    lookup_combinable_vife, lookup_primary_vif, lookup_vife_fb, lookup_vife_fd, DecodeHint,
    Quantity, Unit, VifInfo, VifeDescriptor, VifeKind,
};
use crate::util::ByteCursor;
use serde::Serialize;

/// Which table the VIF resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VifTable {
    Primary,
    ExtensionFb,
    ExtensionFd,
    PlainText,
    Any,
    Manufacturer,
}

/// A decoded VIF with its VIFE chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueInformationBlock {
    pub vif: u8,
    pub vifes: Vec<u8>,
    pub table: VifTable,
    pub quantity: Quantity,
    pub unit: Unit,
    /// Decimal exponent after multiplicative VIFE corrections.
    pub exponent: i8,
    pub hint: DecodeHint,
    /// Unit text of a plain text VIF, in reading order.
    pub plain_text_unit: Option<String>,
    pub descriptors: Vec<VifeDescriptor>,
}

impl ValueInformationBlock {
    /// Decodes a standalone VIB from `bytes`, which must hold exactly one.
    pub fn decode(bytes: &[u8]) -> Result<Self, MBusError> {
        let mut cursor = ByteCursor::new(bytes);
        let vib = parse_vib(&mut cursor, 0)?;
        if !cursor.is_empty() {
            return Err(MBusError::TrailingData {
                offset: cursor.position(),
                count: cursor.remaining(),
            });
        }
        Ok(vib)
    }

    /// Raw VIF, VIFE and plain text bytes in transmission order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.vifes.len());
        bytes.push(self.vif);
        bytes.extend_from_slice(&self.vifes);
        if let Some(text) = &self.plain_text_unit {
            bytes.push(text.chars().count() as u8);
            bytes.extend(text.chars().rev().map(|c| c as u8));
        }
        bytes
    }

    /// Whether a combinable VIFE of the given kind is present.
    pub fn has_descriptor(&self, kind: VifeKind) -> bool {
        self.descriptors.iter().any(|d| d.kind == kind)
    }
}

fn reserved_info() -> VifInfo {
    VifInfo {
        quantity: Quantity::Reserved,
        unit: Unit::None,
        exponent: 0,
        hint: DecodeHint::Numeric,
    }
}

fn fixed_info(quantity: Quantity) -> VifInfo {
    VifInfo {
        quantity,
        ..reserved_info()
    }
}

/// Reads a VIF, its VIFE chain and, for a plain text VIF, the unit text.
pub fn parse_vib(
    cursor: &mut ByteCursor<'_>,
    record_start: usize,
) -> Result<ValueInformationBlock, MBusError> {
    let truncated = |e: crate::error::CursorError| e.into_truncated_record(record_start);

    let vif = cursor.take_u8().map_err(truncated)?;
    let mut vifes = Vec::new();
    let mut last = vif;
    while last & MBUS_DIB_VIF_EXTENSION_BIT != 0 {
        if vifes.len() == MBUS_MAX_EXTENSION_CHAIN {
            return Err(MBusError::MalformedDifChain {
                offset: cursor.position(),
                chain: ExtensionChain::Vife,
            });
        }
        last = cursor.take_u8().map_err(truncated)?;
        vifes.push(last);
    }

    let (table, info, combinable): (VifTable, VifInfo, &[u8]) = match vif {
        // 0x7B and 0x7D without extension bit carry no table code and fall through.
        MBUS_DIB_VIF_EXTENSION_FB | MBUS_DIB_VIF_EXTENSION_FD => {
            let (code, rest) = vifes.split_first().map_or((0, &[][..]), |(c, r)| (*c, r));
            let (table, info) = if vif == MBUS_DIB_VIF_EXTENSION_FB {
                (VifTable::ExtensionFb, lookup_vife_fb(code))
            } else {
                (VifTable::ExtensionFd, lookup_vife_fd(code))
            };
            (table, info.unwrap_or_else(reserved_info), rest)
        }
        _ => match vif & MBUS_DIB_VIF_WITHOUT_EXTENSION {
            MBUS_DIB_VIF_PLAIN_TEXT => (
                VifTable::PlainText,
                fixed_info(Quantity::PlainText),
                &vifes[..],
            ),
            MBUS_DIB_VIF_ANY => (VifTable::Any, fixed_info(Quantity::AnyVif), &vifes[..]),
            MBUS_DIB_VIF_MANUFACTURER => (
                VifTable::Manufacturer,
                fixed_info(Quantity::ManufacturerSpecific),
                &[][..],
            ),
            code => (
                VifTable::Primary,
                lookup_primary_vif(code).unwrap_or_else(reserved_info),
                &vifes[..],
            ),
        },
    };

    let mut descriptors = Vec::with_capacity(combinable.len());
    for byte in combinable {
        let descriptor = lookup_combinable_vife(*byte);
        descriptors.push(descriptor);
        if descriptor.kind == VifeKind::ManufacturerSpecific {
            break;
        }
    }
    let exponent = descriptors
        .iter()
        .fold(info.exponent, |acc, d| acc.saturating_add(d.exponent_correction()));

    let plain_text_unit = if table == VifTable::PlainText {
        let len = usize::from(cursor.take_u8().map_err(truncated)?);
        let bytes = cursor.take(len).map_err(truncated)?;
        let text = decode_text(bytes, len)
            .map(|(_, text)| text)
            .unwrap_or_default();
        Some(text)
    } else {
        None
    };

    Ok(ValueInformationBlock {
        vif,
        vifes,
        table,
        quantity: info.quantity,
        unit: info.unit,
        exponent,
        hint: info.hint,
        plain_text_unit,
        descriptors,
    })
}
