//! Transport layer
//!
//! A [`Channel`] owns one connected byte stream and turns it into a sequence of
//! ATT PDUs: timed receive, send, and the two behaviors every receive applies
//! in ATT mode (Exchange MTU rejection and notification filtering).

pub mod channel;
pub mod dump;
pub mod socket;
pub mod stream;

#[cfg(test)]
pub(crate) mod mock;

pub use channel::{Channel, ChannelConfig, NotificationFilter, TransportMode};
pub use dump::HexDump;
pub use socket::{AddressType, BdAddr, BtSocket};
pub use stream::{AttStream, Readiness};
