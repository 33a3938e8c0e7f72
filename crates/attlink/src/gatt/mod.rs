//! GATT (Generic Attribute Profile) client
//!
//! This module discovers the services, characteristics and descriptors of a
//! peer, subscribes to notifications, and reassembles notification payloads
//! that span several PDUs.

pub mod client;
mod enumerate;
pub mod names;
mod reassembly;
mod resolve;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::GattClient;
pub use names::uuid_name;
pub use resolve::Subscription;
pub use types::{Discovery, Enumeration};
