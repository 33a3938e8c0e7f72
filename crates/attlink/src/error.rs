//! Error types for the attlink library
//!
//! Every fallible operation of the transport, discovery and reassembly layers
//! reports one of the variants below. Protocol violations are never retried:
//! ATT has no recovery short of re-running discovery, so they surface to the
//! caller immediately.

use crate::att::AttErrorCode;
use thiserror::Error;

/// Errors that can occur while talking ATT over a connected channel
#[derive(Error, Debug)]
pub enum Error {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out waiting for data")]
    Timeout,

    #[error("empty message")]
    EmptyMessage,

    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] Violation),

    #[error("can't find characteristic descriptor")]
    DescriptorNotFound,

    #[error("notification payload truncated")]
    Truncated,

    #[error("resolved {resolved} of {requested} characteristics")]
    Incomplete { resolved: usize, requested: usize },

    #[error("ATT error response to opcode 0x{request:02x}: {code} on handle 0x{handle:04x}")]
    Att {
        request: u8,
        handle: u16,
        code: AttErrorCode,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The ways a peer can break the ATT request/response discipline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("unexpected length ({0})")]
    BadLength(usize),

    #[error("unexpected opcode (expected 0x{expected:02x}, got 0x{actual:02x})")]
    UnexpectedOpcode { expected: u8, actual: u8 },

    #[error("unexpected error response (opcode 0x{request:02x}, handle 0x{handle:04x}, code {code})")]
    UnexpectedErrorResponse {
        request: u8,
        handle: u16,
        code: AttErrorCode,
    },

    #[error("unexpected record length ({0})")]
    BadRecordLength(u8),

    #[error("unexpected remainder ({remainder} bytes over stride {stride})")]
    RaggedRecords { stride: usize, remainder: usize },

    #[error("handle 0x{handle:04x} out of range 0x{start:04x}..=0x{end:04x}")]
    HandleOutOfRange { handle: u16, start: u16, end: u16 },

    #[error("invalid handle range 0x{start:04x}..=0x{end:04x}")]
    InvalidRange { start: u16, end: u16 },

    #[error("notification for handle 0x{actual:04x}, expected 0x{expected:04x}")]
    HandleMismatch { expected: u16, actual: u16 },

    #[error("fragment of {len} bytes overshoots remaining {remaining}")]
    FragmentOvershoot { len: usize, remaining: usize },

    #[error("unexpected service range response")]
    MalformedServiceRange,
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the violation if this error is a protocol violation
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Error::ProtocolViolation(v) => Some(v),
            _ => None,
        }
    }
}
