//! attlink - An ATT/GATT client over a connected Bluetooth channel
//!
//! This library talks the Attribute Protocol to a single peer over an L2CAP
//! fixed channel (or RFCOMM in raw mode). It discovers services,
//! characteristics and descriptors, subscribes to notifications, and
//! reassembles notification payloads that arrive in several PDUs.
//!
//! ```no_run
//! use attlink::{AddressType, BdAddr, BtSocket, ChannelConfig, GattClient};
//!
//! # fn main() -> attlink::Result<()> {
//! let peer: BdAddr = "C0:11:22:33:44:5A".parse().unwrap();
//! let socket = BtSocket::connect_att(&BdAddr::ANY, AddressType::LePublic, &peer, AddressType::LePublic)?;
//! let mut client = GattClient::new(socket, ChannelConfig::default());
//! if let Some((_, level)) = client.battery_level()? {
//!     println!("Battery Level = {}%", level);
//! }
//! # Ok(())
//! # }
//! ```

pub mod att;
pub mod error;
pub mod gatt;
pub mod transport;
pub mod uuid;

// Re-export common types for convenience
pub use att::{AttErrorCode, CharacteristicProperties, DiscoveryMode, DiscoveryRecord, HandleRange};
pub use error::{Error, Result, Violation};
pub use gatt::{uuid_name, Discovery, Enumeration, GattClient, Subscription};
pub use transport::{
    AddressType, AttStream, BdAddr, BtSocket, Channel, ChannelConfig, HexDump, NotificationFilter,
    Readiness, TransportMode,
};
pub use uuid::Uuid;
