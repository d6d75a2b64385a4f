use std::io;
use std::time::Duration;
use thiserror::Error;

/// The primary error type for the `broadlink-lib` library.
///
/// Each variant belongs to exactly one phase of an exchange.
#[derive(Error, Debug)]
pub enum BLError {
    #[error("Device type {0} ({0:#06x}) is not supported")]
    UnsupportedDeviceType(u16),

    #[error("Invalid hardware address: {0}")]
    InvalidHardwareAddress(String),

    #[error("Payload length must be a multiple of 16, got {0}")]
    InvalidPayloadLength(usize),

    #[error("Could not send packet after {attempts} attempt(s): {source}")]
    SendFailed {
        attempts: u8,
        #[source]
        source: io::Error,
    },

    #[error("No response from device within {0:?}")]
    ResponseTimeout(Duration),

    #[error("Error while waiting for device response: {0}")]
    ReceiveFailed(#[source] io::Error),

    #[error("Malformed response: expected at least {expected} bytes, got {actual}")]
    MalformedResponse { expected: usize, actual: usize },

    #[error("Response shorter than a frame header: expected {expected} bytes, got {actual}")]
    ShortResponse { expected: usize, actual: usize },

    #[error("Encrypted payload is not a whole number of AES blocks ({0} bytes)")]
    BlockAlignment(usize),

    #[error("Device reported error code {0} ({0:#06x})")]
    DeviceError(u16),

    #[error("Authentication was answered with command {0:#04x} instead of a key exchange")]
    UnexpectedReply(u8),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
