//! Error types for P9710 command parsing and line transport

use thiserror::Error;

/// Errors that can occur while parsing command or reply text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Empty or whitespace-only text
    #[error("empty input")]
    Empty,

    /// Unknown or unsupported command mnemonic
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Parameter of a known command is malformed
    #[error("invalid parameter for {command}: {param:?}")]
    InvalidParameter {
        command: &'static str,
        param: String,
    },

    /// Reply could not be read as a number
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),
}

/// Failures of the physical line underneath a session
///
/// These never reach callers of the instrument API; the session turns them
/// into the sentinel reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Port could not be opened
    #[error("failed to open {port}: {reason}")]
    OpenFailed { port: String, reason: String },

    /// Operation attempted on a closed line
    #[error("line is not open")]
    NotOpen,

    /// Writing the command failed
    #[error("write failed: {0}")]
    Write(String),

    /// Reading the reply failed
    #[error("read failed: {0}")]
    Read(String),

    /// No complete reply line before the deadline
    #[error("no reply within {0}ms")]
    Timeout(u64),
}
