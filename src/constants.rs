//! M-Bus Protocol Constants
//!
//! This module defines constants used in the M-Bus protocol implementation,
//! based on the EN 13757-2 (link layer) and EN 13757-3 (application layer) standards.

// ----------------------------------------------------------------------------
// Link layer framing
// ----------------------------------------------------------------------------

/// Single character acknowledgment
pub const MBUS_FRAME_ACK: u8 = 0xE5;

/// Start byte of a short frame
pub const MBUS_FRAME_SHORT_START: u8 = 0x10;

/// Start byte of a control or long frame (sent twice)
pub const MBUS_FRAME_LONG_START: u8 = 0x68;

/// Stop byte shared by all length-bearing frames
pub const MBUS_FRAME_STOP: u8 = 0x16;

/// Total length of a short frame: start, C, A, checksum, stop
pub const MBUS_FRAME_SHORT_LENGTH: usize = 5;

/// Bytes of a long frame outside the L counted bytes: start, L, L, start, checksum, stop
pub const MBUS_FRAME_LONG_OVERHEAD: usize = 6;

/// Minimum L field value: C, A and CI
pub const MBUS_FRAME_MIN_LENGTH_FIELD: u8 = 3;

/// L field value of a control frame (no user data)
pub const MBUS_FRAME_CONTROL_LENGTH_FIELD: u8 = 3;

// ----------------------------------------------------------------------------
// Control field (C) and address field (A)
// ----------------------------------------------------------------------------

pub const MBUS_CONTROL_MASK_SND_NKE: u8 = 0x40;
pub const MBUS_CONTROL_MASK_SND_UD: u8 = 0x53;
pub const MBUS_CONTROL_MASK_REQ_UD2: u8 = 0x5B;
pub const MBUS_CONTROL_MASK_REQ_UD1: u8 = 0x5A;
pub const MBUS_CONTROL_MASK_RSP_UD: u8 = 0x08;

// Control flag bits
pub const MBUS_CONTROL_MASK_FCB: u8 = 0x20;
pub const MBUS_CONTROL_MASK_ACD: u8 = 0x20;
pub const MBUS_CONTROL_MASK_DFC: u8 = 0x10;

pub const MBUS_ADDRESS_UNCONFIGURED: u8 = 0x00;
pub const MBUS_ADDRESS_PRIMARY_MAX: u8 = 0xFA;
pub const MBUS_ADDRESS_NETWORK_LAYER: u8 = 0xFD;
pub const MBUS_ADDRESS_BROADCAST_REPLY: u8 = 0xFE;
pub const MBUS_ADDRESS_BROADCAST_NOREPLY: u8 = 0xFF;

// ----------------------------------------------------------------------------
// Control information (CI) codes
// ----------------------------------------------------------------------------

pub const MBUS_CONTROL_INFO_DATA_SEND: u8 = 0x51;
pub const MBUS_CONTROL_INFO_SELECT_SLAVE: u8 = 0x52;
pub const MBUS_CONTROL_INFO_ERROR_GENERAL: u8 = 0x70;
pub const MBUS_CONTROL_INFO_RESP_VARIABLE: u8 = 0x72;
pub const MBUS_CONTROL_INFO_RESP_FIXED: u8 = 0x73;
pub const MBUS_CONTROL_INFO_RESP_VARIABLE_MSB: u8 = 0x76;
pub const MBUS_CONTROL_INFO_RESP_FIXED_MSB: u8 = 0x77;
pub const MBUS_CONTROL_INFO_RESP_NO_HEADER: u8 = 0x78;
pub const MBUS_CONTROL_INFO_RESP_SHORT_HEADER: u8 = 0x7A;

/// Size of the long transport header following CI 0x72/0x76
pub const MBUS_LONG_HEADER_LENGTH: usize = 12;

/// Size of the short transport header following CI 0x7A
pub const MBUS_SHORT_HEADER_LENGTH: usize = 4;

// ----------------------------------------------------------------------------
// Data information block
// ----------------------------------------------------------------------------

/// DIF (Data Information Field) mask for data length / coding
pub const MBUS_DATA_RECORD_DIF_MASK_DATA: u8 = 0x0F;

/// DIF mask for function
pub const MBUS_DATA_RECORD_DIF_MASK_FUNCTION: u8 = 0x30;

/// DIF mask for storage number
pub const MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO: u8 = 0x40;

/// DIFE (Data Information Field Extension) mask for storage number
pub const MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO: u8 = 0x0F;

/// DIFE mask for tariff
pub const MBUS_DATA_RECORD_DIFE_MASK_TARIFF: u8 = 0x30;

/// DIFE mask for device (sub-unit)
pub const MBUS_DATA_RECORD_DIFE_MASK_DEVICE: u8 = 0x40;

/// DIF idle filler
pub const MBUS_DIB_DIF_IDLE_FILLER: u8 = 0x2F;

/// DIF manufacturer specific
pub const MBUS_DIB_DIF_MANUFACTURER_SPECIFIC: u8 = 0x0F;

/// DIF more records follow
pub const MBUS_DIB_DIF_MORE_RECORDS_FOLLOW: u8 = 0x1F;

/// DIF extension bit
pub const MBUS_DIB_DIF_EXTENSION_BIT: u8 = 0x80;

// ----------------------------------------------------------------------------
// Value information block
// ----------------------------------------------------------------------------

/// VIF without extension bit
pub const MBUS_DIB_VIF_WITHOUT_EXTENSION: u8 = 0x7F;

/// VIF extension bit
pub const MBUS_DIB_VIF_EXTENSION_BIT: u8 = 0x80;

/// Plain text VIF (unit given as ASCII after the VIFE chain)
pub const MBUS_DIB_VIF_PLAIN_TEXT: u8 = 0x7C;

/// First extension table selector (0xFB)
pub const MBUS_DIB_VIF_EXTENSION_FB: u8 = 0xFB;

/// Main extension table selector (0xFD)
pub const MBUS_DIB_VIF_EXTENSION_FD: u8 = 0xFD;

/// Any VIF (readout selection)
pub const MBUS_DIB_VIF_ANY: u8 = 0x7E;

/// Manufacturer specific VIF
pub const MBUS_DIB_VIF_MANUFACTURER: u8 = 0x7F;

/// Maximum number of DIFE (or VIFE) bytes following a DIF (or VIF)
pub const MBUS_MAX_EXTENSION_CHAIN: usize = 10;

// ----------------------------------------------------------------------------
// LVAR (variable length data, DIF coding 0x0D)
// ----------------------------------------------------------------------------

pub const MBUS_LVAR_TEXT_MAX: u8 = 0xBF;
pub const MBUS_LVAR_BCD_POSITIVE: u8 = 0xC0;
pub const MBUS_LVAR_BCD_NEGATIVE: u8 = 0xD0;
pub const MBUS_LVAR_BINARY: u8 = 0xE0;
pub const MBUS_LVAR_BINARY_LONG: u8 = 0xF0;
