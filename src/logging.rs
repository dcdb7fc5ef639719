//! Logging setup for applications embedding the decoder.
//!
//! The decoder itself only emits through the `log` facade under the
//! `mbus::frame` and `mbus::payload` targets; this wires up `env_logger`.

/// Initializes the logger with the `env_logger` crate (honours `RUST_LOG`).
///
/// Calling it more than once is harmless; later calls are ignored.
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .try_init();
}
