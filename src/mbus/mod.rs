//! The mbus module contains the link layer of the wired M-Bus protocol:
//! frame classification and validation, control and address field decoding,
//! and the matching frame encoder.

pub mod control;
pub mod frame;
pub mod pack;

pub use control::{Address, Function};
pub use frame::{calculate_checksum, classify_frame, parse_frame, read_frame};
pub use pack::{pack_frame, FrameBuilder};

/// Represents an M-Bus frame.
pub use frame::MBusFrame;

/// Represents the different types of M-Bus frames.
pub use frame::MBusFrameType;
