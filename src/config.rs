//! # Parser Configuration
//!
//! `ParserConfig` tunes how strictly a buffer is treated around the telegram.
//! The protocol bounds themselves (extension chain length, frame layout) are
//! constants and not configurable.
//!
//! ```rust
//! use mbus_telegram::{ParserConfig, TrailingInput};
//!
//! let config = ParserConfig::default()
//!     .with_trailing_input(TrailingInput::Reject)
//!     .with_max_records(64);
//! assert!(config.decode_application_layer);
//! ```

use serde::{Deserialize, Serialize};

/// What to do with bytes following the first complete frame in the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrailingInput {
    /// Decode the first frame and leave the rest to the caller.
    #[default]
    Ignore,
    /// Fail with `TrailingData` if anything follows the frame.
    Reject,
}

/// Options for a single telegram parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Decode the user data of long frames into records.
    pub decode_application_layer: bool,
    /// Handling of input after the end of the frame.
    pub trailing_input: TrailingInput,
    /// Upper bound on records decoded from one telegram.
    pub max_records: usize,
}

impl ParserConfig {
    /// Default cap on records per telegram. A 255-byte long frame cannot hold more
    /// than a few hundred records, so this only bites on misuse.
    pub const DEFAULT_MAX_RECORDS: usize = 1024;

    /// Only validate framing; leave records empty.
    pub fn frame_only() -> Self {
        Self {
            decode_application_layer: false,
            ..Self::default()
        }
    }

    pub fn with_application_layer(mut self, enabled: bool) -> Self {
        self.decode_application_layer = enabled;
        self
    }

    pub fn with_trailing_input(mut self, policy: TrailingInput) -> Self {
        self.trailing_input = policy;
        self
    }

    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            decode_application_layer: true,
            trailing_input: TrailingInput::Ignore,
            max_records: Self::DEFAULT_MAX_RECORDS,
        }
    }
}
