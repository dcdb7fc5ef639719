//! Decoding of the link layer control (C) and address (A) fields.
//!
//! Unknown control codes are not an error: the frame checksum already vouches
//! for the byte, so it is kept as [`Function::Unknown`] for the caller to judge.

use crate::constants::*;
use serde::Serialize;
use std::fmt;

/// Link layer function encoded in the control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Function {
    /// Link reset (SND_NKE).
    SndNke,
    /// Send user data to slave (SND_UD).
    SndUd { fcb: bool },
    /// Request class 1 data (REQ_UD1).
    ReqUd1 { fcb: bool },
    /// Request class 2 data (REQ_UD2).
    ReqUd2 { fcb: bool },
    /// Slave response with user data (RSP_UD).
    RspUd { acd: bool, dfc: bool },
    Unknown(u8),
}

impl Function {
    pub fn from_control(control: u8) -> Self {
        // Master-to-slave codes are matched with the FCB bit cleared.
        let fcb = control & MBUS_CONTROL_MASK_FCB != 0;
        match control & !MBUS_CONTROL_MASK_FCB {
            MBUS_CONTROL_MASK_SND_NKE if !fcb => Function::SndNke,
            MBUS_CONTROL_MASK_SND_UD => Function::SndUd { fcb },
            MBUS_CONTROL_MASK_REQ_UD1 => Function::ReqUd1 { fcb },
            MBUS_CONTROL_MASK_REQ_UD2 => Function::ReqUd2 { fcb },
            _ if control & !(MBUS_CONTROL_MASK_ACD | MBUS_CONTROL_MASK_DFC)
                == MBUS_CONTROL_MASK_RSP_UD =>
            {
                Function::RspUd {
                    acd: control & MBUS_CONTROL_MASK_ACD != 0,
                    dfc: control & MBUS_CONTROL_MASK_DFC != 0,
                }
            }
            _ => Function::Unknown(control),
        }
    }

    /// Whether the frame travels from master to slave.
    pub fn is_master_to_slave(&self) -> bool {
        matches!(
            self,
            Function::SndNke | Function::SndUd { .. } | Function::ReqUd1 { .. } | Function::ReqUd2 { .. }
        )
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::SndNke => write!(f, "SND_NKE"),
            Function::SndUd { fcb } => write!(f, "SND_UD (FCB: {fcb})"),
            Function::ReqUd1 { fcb } => write!(f, "REQ_UD1 (FCB: {fcb})"),
            Function::ReqUd2 { fcb } => write!(f, "REQ_UD2 (FCB: {fcb})"),
            Function::RspUd { acd, dfc } => write!(f, "RSP_UD (ACD: {acd}, DFC: {dfc})"),
            Function::Unknown(byte) => write!(f, "Unknown (0x{byte:02X})"),
        }
    }
}

/// Link layer address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Address {
    Unconfigured,
    Primary(u8),
    /// Reserved for selection by secondary address.
    NetworkLayer,
    Broadcast { reply_required: bool },
    Reserved(u8),
}

impl From<u8> for Address {
    fn from(byte: u8) -> Self {
        match byte {
            MBUS_ADDRESS_UNCONFIGURED => Address::Unconfigured,
            1..=MBUS_ADDRESS_PRIMARY_MAX => Address::Primary(byte),
            MBUS_ADDRESS_NETWORK_LAYER => Address::NetworkLayer,
            MBUS_ADDRESS_BROADCAST_REPLY => Address::Broadcast {
                reply_required: true,
            },
            MBUS_ADDRESS_BROADCAST_NOREPLY => Address::Broadcast {
                reply_required: false,
            },
            _ => Address::Reserved(byte),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Unconfigured => write!(f, "Unconfigured"),
            Address::Primary(byte) => write!(f, "Primary ({byte})"),
            Address::NetworkLayer => write!(f, "Network layer"),
            Address::Broadcast { reply_required } => {
                write!(f, "Broadcast (reply required: {reply_required})")
            }
            Address::Reserved(byte) => write!(f, "Reserved ({byte})"),
        }
    }
}
