//! Error types for culw-core

use crate::router::Protocol;

/// Result type alias for culw-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Frame payload is too short to be valid
    #[error("{protocol} frame too short: expected at least {expected} characters, got {actual}")]
    FrameTooShort {
        protocol: Protocol,
        expected: usize,
        actual: usize,
    },

    /// Payload contains non-ASCII characters
    #[error("{protocol} frame is not ASCII")]
    NonAscii {
        protocol: Protocol,
    },

    /// Numeric field is not hexadecimal
    #[error("Invalid hex field at offset {offset}: {value:?}")]
    InvalidHex {
        offset: usize,
        value: String,
    },

    /// FHT function code needs a value byte the frame does not carry
    #[error("FHT function 0x{code:02x} requires a value byte")]
    MissingValue {
        code: u8,
    },

    /// Requested temperature outside 5.5..=30.5 degrees
    #[error("Temperature out of range: {value}")]
    TemperatureOutOfRange {
        value: f64,
    },

    /// Requested temperature is not a decimal number
    #[error("Invalid temperature: {0:?}")]
    InvalidTemperature(String),

    /// Command needs a `current` value
    #[error("Command {0} requires a current value")]
    MissingCurrent(String),

    /// Unknown mode value
    #[error("Invalid mode: {0:?}")]
    InvalidMode(String),

    /// Command cannot be encoded for the target device
    #[error("Unsupported command {command:?} for device {device:?}")]
    UnsupportedCommand {
        device: String,
        command: String,
    },

    /// Configuration rejected by [`Config::validate`](crate::Config::validate)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Check if error comes from a corrupted or truncated inbound frame
    pub fn is_malformed_frame(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. }
                | Self::NonAscii { .. }
                | Self::InvalidHex { .. }
                | Self::MissingValue { .. }
        )
    }

    /// Check if error is an outbound command rejected by validation
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::TemperatureOutOfRange { .. }
                | Self::InvalidTemperature(_)
                | Self::MissingCurrent(_)
                | Self::InvalidMode(_)
                | Self::UnsupportedCommand { .. }
        )
    }
}
