//! Record layouts of the three GATT discovery queries
//!
//! Primary service, characteristic and descriptor discovery share one
//! enumeration loop and differ only in the query they send and in the shape
//! of the records that come back:
//!
//! | mode           | query | response | short record | long record |
//! |----------------|-------|----------|--------------|-------------|
//! | primary        | 0x10  | 0x11     | 6            | 20          |
//! | characteristic | 0x08  | 0x09     | 7            | 21          |
//! | descriptor     | 0x04  | 0x05     | 4            | 18          |
//!
//! Descriptor responses carry a format byte (1 = short, 2 = long) where the
//! other two carry the record length.

use super::constants::*;
use super::pdu::{AttPacket, FindInformationRequest, ReadByGroupTypeRequest, ReadByTypeRequest};
use super::types::HandleRange;
use crate::uuid::Uuid;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Characteristic properties as defined in the Bluetooth specification
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharacteristicProperties: u8 {
        const BROADCAST = 0x01;
        const READ = 0x02;
        const WRITE_WITHOUT_RESPONSE = 0x04;
        const WRITE = 0x08;
        const NOTIFY = 0x10;
        const INDICATE = 0x20;
        const AUTHENTICATED_SIGNED_WRITES = 0x40;
        const EXTENDED_PROPERTIES = 0x80;
    }
}

/// Which discovery query an enumeration pass runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Read By Group Type over the primary service declaration type
    PrimaryService,
    /// Read By Type over the characteristic declaration type
    Characteristic,
    /// Find Information
    Descriptor,
}

impl DiscoveryMode {
    /// Opcode of the query this mode sends
    pub fn request_opcode(&self) -> u8 {
        match self {
            DiscoveryMode::PrimaryService => ATT_READ_BY_GROUP_TYPE_REQ,
            DiscoveryMode::Characteristic => ATT_READ_BY_TYPE_REQ,
            DiscoveryMode::Descriptor => ATT_FIND_INFO_REQ,
        }
    }

    /// Opcode of a successful response to that query
    pub fn response_opcode(&self) -> u8 {
        self.request_opcode() + 1
    }

    /// Encodes the query PDU for `range`
    pub fn query(&self, range: HandleRange) -> Vec<u8> {
        match self {
            DiscoveryMode::PrimaryService => ReadByGroupTypeRequest {
                range,
                group_type: Uuid::Short(PRIMARY_SERVICE_UUID),
            }
            .serialize(),
            DiscoveryMode::Characteristic => ReadByTypeRequest {
                range,
                attribute_type: Uuid::Short(CHARACTERISTIC_UUID),
            }
            .serialize(),
            DiscoveryMode::Descriptor => FindInformationRequest { range }.serialize(),
        }
    }

    /// Size of the fields preceding the UUID in one record
    fn fixed_len(&self) -> usize {
        match self {
            DiscoveryMode::PrimaryService => 4,
            DiscoveryMode::Characteristic => 5,
            DiscoveryMode::Descriptor => 2,
        }
    }

    /// Maps the second response byte to the record stride.
    ///
    /// Returns `None` when the byte names neither the short nor the long form.
    pub fn record_stride(&self, field: u8) -> Option<usize> {
        let fixed = self.fixed_len();
        match self {
            DiscoveryMode::Descriptor => match field {
                ATT_FIND_INFO_RSP_FORMAT_16BIT => Some(fixed + 2),
                ATT_FIND_INFO_RSP_FORMAT_128BIT => Some(fixed + 16),
                _ => None,
            },
            _ => {
                let len = field as usize;
                (len == fixed + 2 || len == fixed + 16).then_some(len)
            }
        }
    }

    /// Decodes one record whose stride was validated by [`record_stride`](Self::record_stride)
    pub fn decode(&self, raw: &[u8]) -> Option<DiscoveryRecord> {
        let fixed = self.fixed_len();
        if raw.len() < fixed {
            return None;
        }
        let handle = u16::from_le_bytes([raw[0], raw[1]]);
        let uuid = Uuid::from_le_slice(&raw[fixed..])?;
        let record = match self {
            DiscoveryMode::PrimaryService => DiscoveryRecord::PrimaryService {
                handle,
                end_group_handle: u16::from_le_bytes([raw[2], raw[3]]),
                uuid,
            },
            DiscoveryMode::Characteristic => DiscoveryRecord::Characteristic {
                handle,
                properties: CharacteristicProperties::from_bits_retain(raw[2]),
                value_handle: u16::from_le_bytes([raw[3], raw[4]]),
                uuid,
            },
            DiscoveryMode::Descriptor => DiscoveryRecord::Descriptor { handle, uuid },
        };
        Some(record)
    }
}

impl fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiscoveryMode::PrimaryService => "primary",
            DiscoveryMode::Characteristic => "chars",
            DiscoveryMode::Descriptor => "char_desc",
        })
    }
}

/// One record produced by an enumeration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryRecord {
    /// A primary service declaration and the end of its group
    PrimaryService {
        handle: u16,
        end_group_handle: u16,
        uuid: Uuid,
    },
    /// A characteristic declaration
    Characteristic {
        handle: u16,
        properties: CharacteristicProperties,
        value_handle: u16,
        uuid: Uuid,
    },
    /// A handle/type pair from Find Information
    Descriptor { handle: u16, uuid: Uuid },
}

impl DiscoveryRecord {
    /// The handle the record was reported at
    pub fn handle(&self) -> u16 {
        match self {
            DiscoveryRecord::PrimaryService { handle, .. }
            | DiscoveryRecord::Characteristic { handle, .. }
            | DiscoveryRecord::Descriptor { handle, .. } => *handle,
        }
    }

    pub fn uuid(&self) -> &Uuid {
        match self {
            DiscoveryRecord::PrimaryService { uuid, .. }
            | DiscoveryRecord::Characteristic { uuid, .. }
            | DiscoveryRecord::Descriptor { uuid, .. } => uuid,
        }
    }
}

impl fmt::Display for DiscoveryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryRecord::PrimaryService {
                handle,
                end_group_handle,
                uuid,
            } => write!(
                f,
                "0x{:04x}: end = 0x{:04x}, uuid = {}",
                handle, end_group_handle, uuid
            ),
            DiscoveryRecord::Characteristic {
                handle,
                properties,
                value_handle,
                uuid,
            } => write!(
                f,
                "0x{:04x}: prop = 0x{:02x}, val = 0x{:04x}, uuid = {}",
                handle,
                properties.bits(),
                value_handle,
                uuid
            ),
            DiscoveryRecord::Descriptor { handle, uuid } => {
                write!(f, "0x{:04x}: uuid = {}", handle, uuid)
            }
        }
    }
}
