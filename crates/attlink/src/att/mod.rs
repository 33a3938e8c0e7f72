//! Attribute Protocol (ATT) implementation
//!
//! This module provides the client side of the ATT wire format: opcodes and
//! error codes, the PDU codec, and the record layouts of the three GATT
//! discovery queries.

pub mod constants;
pub mod discovery;
pub mod error;
pub mod pdu;
pub mod types;

// Re-export the public API
pub use self::constants::*;
pub use self::discovery::{CharacteristicProperties, DiscoveryMode, DiscoveryRecord};
pub use self::error::AttErrorCode;
pub use self::pdu::*;
pub use self::types::HandleRange;
