//! The payload module contains the components responsible for decoding the
//! application layer carried in the user data of long frames.

pub mod data;
pub mod data_encoding;
pub mod dif;
pub mod header;
pub mod record;
pub mod vif;
pub mod vif_maps;

pub use data::{encode_record, parse_variable_data, MBusUserData};
pub use data_encoding::MBusEncodeError;
pub use dif::{DataFieldCoding, DataInformationBlock, FunctionField};
pub use header::{
    ApplicationError, ByteOrder, ControlInformation, DataHeader, DeviceType, LongHeader,
    ManufacturerCode, ShortHeader, StatusField,
};
pub use vif::{ValueInformationBlock, VifTable};
pub use vif_maps::{DecodeHint, Quantity, Unit, VifeDescriptor, VifeKind};

/// Represents a data record in the M-Bus protocol.
pub use record::MBusRecord;

/// Represents the value of an M-Bus data record.
pub use record::MBusRecordValue;

pub use record::MBusDataRecordHeader;
