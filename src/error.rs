//! Our error types for the HV chip.

use thiserror::Error;

use crate::command::{CODE_LEN, Command};

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for HV chip communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    Serial(I),
    #[error("No complete frame received within {waited_ms} ms")]
    Timeout { waited_ms: u32 },
    #[error("Malformed frame: {0}")]
    Frame(#[from] FrameError),
    #[error("Device reported an error: {0}")]
    Device(#[from] DeviceError),
    #[error("Invalid parameter: {0}")]
    Validation(#[from] ValidationError),
    #[error("Could not determine the {function} state (raw value {raw})")]
    StateQuery { function: &'static str, raw: u16 },
}

/// Structural problems with a received frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame of {len} bytes is too short")]
    Truncated { len: usize },
    #[error("expected STX, found {found:#04x}")]
    MissingStart { found: u8 },
    #[error("expected CR terminator, found {found:#04x}")]
    MissingTerminator { found: u8 },
    #[error("expected ETX before checksum, found {found:#04x}")]
    MissingEnd { found: u8 },
    #[error("unknown command code {code:?}")]
    UnknownCommand { code: [u8; CODE_LEN] },
    #[error("{command} response should be {expected} bytes, got {actual}")]
    LengthMismatch {
        command: Command,
        expected: usize,
        actual: usize,
    },
    #[error("checksum mismatch: calculated {expected:#04x}, received {received:#04x}")]
    ChecksumMismatch { expected: u8, received: u8 },
    #[error("invalid hex digits in frame")]
    InvalidHex,
    #[error("expected {expected} echo, got {actual}")]
    UnexpectedCommand { expected: Command, actual: Command },
    #[error("payload of {len} bytes exceeds frame capacity of {capacity}")]
    PayloadTooLarge { len: usize, capacity: usize },
    #[error("no frame terminator within {capacity} bytes")]
    Overrun { capacity: usize },
}

impl From<hex::FromHexError> for FrameError {
    fn from(_: hex::FromHexError) -> Self {
        FrameError::InvalidHex
    }
}

/// Error codes the chip reports with an `hxx` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum DeviceErrorCode {
    UartCommunication = 1,
    Timeout = 2,
    Syntax = 3,
    Checksum = 4,
    Command = 5,
    Parameter = 6,
    ParameterSize = 7,
}

impl DeviceErrorCode {
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    pub const fn message(&self) -> &'static str {
        match self {
            DeviceErrorCode::UartCommunication => "UART Communication Error",
            DeviceErrorCode::Timeout => "Timeout Error",
            DeviceErrorCode::Syntax => "Syntax Error",
            DeviceErrorCode::Checksum => "Checksum Error",
            DeviceErrorCode::Command => "Command Error",
            DeviceErrorCode::Parameter => "Parameter Error",
            DeviceErrorCode::ParameterSize => "Parameter Size Error",
        }
    }
}

impl TryFrom<u16> for DeviceErrorCode {
    type Error = DeviceError;

    fn try_from(value: u16) -> core::result::Result<Self, Self::Error> {
        use DeviceErrorCode as DEC;
        match value {
            1 => Ok(DEC::UartCommunication),
            2 => Ok(DEC::Timeout),
            3 => Ok(DEC::Syntax),
            4 => Ok(DEC::Checksum),
            5 => Ok(DEC::Command),
            6 => Ok(DEC::Parameter),
            7 => Ok(DEC::ParameterSize),
            other => Err(DeviceError::Unmapped(other)),
        }
    }
}

/// An error reported by the chip itself.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    #[error("{} (code {})", .0.message(), .0.code())]
    Reported(DeviceErrorCode),
    #[error("unmapped error code {0}")]
    Unmapped(u16),
}

impl DeviceError {
    /// Interpret the word carried by an `hxx` frame.
    pub fn from_code(code: u16) -> Self {
        match DeviceErrorCode::try_from(code) {
            Ok(code) => DeviceError::Reported(code),
            Err(unmapped) => unmapped,
        }
    }

    /// The human readable message, if the code is one the chip documents.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DeviceError::Reported(code) => Some(code.message()),
            DeviceError::Unmapped(_) => None,
        }
    }
}

/// A caller supplied value which can't be encoded for the chip.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("{parameter} = {value} is outside {min} ..= {max}")]
pub struct ValidationError {
    pub parameter: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}
