//! Bluetooth UUIDs in 16-bit and 128-bit form

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;

/// A Bluetooth UUID as it appears in an ATT discovery record.
///
/// ATT carries either the 16-bit SIG-assigned short form or the full 128-bit
/// form; the record length on the wire decides which one a record uses, so the
/// form is kept rather than normalized.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub enum Uuid {
    /// 16-bit short form
    Short(u16),
    /// 128-bit long form, little-endian as on the wire
    Long([u8; 16]),
}

/// The base UUID used for expanding 16-bit values.
/// Defined as "00000000-0000-1000-8000-00805F9B34FB" (little-endian representation).
const BASE_UUID_BYTES: [u8; 16] = [
    0xFB, 0x34, 0x9B, 0x5F, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Offset within the base UUID where the 16-bit value is inserted.
const BASE_OFFSET: usize = 12;

impl Uuid {
    /// Decodes a little-endian UUID field of 2 or 16 bytes.
    pub fn from_le_slice(slice: &[u8]) -> Option<Self> {
        match slice.len() {
            2 => Some(Uuid::Short(u16::from_le_bytes([slice[0], slice[1]]))),
            16 => {
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(slice);
                Some(Uuid::Long(bytes))
            }
            _ => None,
        }
    }

    /// Returns the 16-bit value if this UUID was carried in short form.
    pub fn as_short(&self) -> Option<u16> {
        match self {
            Uuid::Short(value) => Some(*value),
            Uuid::Long(_) => None,
        }
    }

    /// Size of this UUID on the wire
    pub fn wire_len(&self) -> usize {
        match self {
            Uuid::Short(_) => 2,
            Uuid::Long(_) => 16,
        }
    }

    /// Returns the full 128-bit value in little-endian order.
    pub fn to_bytes_le(&self) -> [u8; 16] {
        match self {
            Uuid::Short(value) => {
                let mut bytes = BASE_UUID_BYTES;
                bytes[BASE_OFFSET..BASE_OFFSET + 2].copy_from_slice(&value.to_le_bytes());
                bytes
            }
            Uuid::Long(bytes) => *bytes,
        }
    }
}

impl From<u16> for Uuid {
    fn from(value: u16) -> Self {
        Uuid::Short(value)
    }
}

impl From<[u8; 16]> for Uuid {
    /// Assumes bytes are in little-endian order.
    fn from(bytes: [u8; 16]) -> Self {
        Uuid::Long(bytes)
    }
}

impl PartialEq<u16> for Uuid {
    fn eq(&self, other: &u16) -> bool {
        self.as_short() == Some(*other)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Standard hyphenated format (big-endian)
        let mut b = self.to_bytes_le();
        b.reverse();
        write!(
            f,
            "{}-{}-{}-{}-{}",
            hex::encode(&b[0..4]),
            hex::encode(&b[4..6]),
            hex::encode(&b[6..8]),
            hex::encode(&b[8..10]),
            hex::encode(&b[10..16])
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uuid::Short(value) => write!(f, "Uuid(0x{:04X})", value),
            Uuid::Long(_) => write!(f, "Uuid({})", self),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UuidParseError {
    #[error("UUID must have 4 or 32 hex digits")]
    InvalidLength,

    #[error("malformed UUID")]
    InvalidFormat,
}

impl From<hex::FromHexError> for UuidParseError {
    fn from(_: hex::FromHexError) -> Self {
        UuidParseError::InvalidFormat
    }
}

impl From<ParseIntError> for UuidParseError {
    fn from(_: ParseIntError) -> Self {
        UuidParseError::InvalidFormat
    }
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.chars().any(|c| c != '-' && !c.is_ascii_hexdigit()) {
            return Err(UuidParseError::InvalidFormat);
        }
        let cleaned: String = s.chars().filter(|c| *c != '-').collect();

        match cleaned.len() {
            4 => Ok(Uuid::Short(u16::from_str_radix(&cleaned, 16)?)),
            32 => {
                let mut bytes = [0u8; 16];
                hex::decode_to_slice(&cleaned, &mut bytes)?;
                bytes.reverse();
                Ok(Uuid::Long(bytes))
            }
            _ => Err(UuidParseError::InvalidLength),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_uuid_expands_onto_base() {
        let uuid = Uuid::Short(0x180F);
        assert_eq!(uuid.to_string(), "0000180f-0000-1000-8000-00805f9b34fb");
        assert_eq!(uuid, 0x180F);
        assert_eq!(uuid.wire_len(), 2);
    }

    #[test]
    fn test_long_uuid_from_wire() {
        // 6e400001-b5a3-f393-e0a9-e50e24dcca9e, little-endian on the wire
        let wire = [
            0x9e, 0xca, 0xdc, 0x24, 0x0e, 0xe5, 0xa9, 0xe0, 0x93, 0xf3, 0xa3, 0xb5, 0x01, 0x00,
            0x40, 0x6e,
        ];
        let uuid = Uuid::from_le_slice(&wire).unwrap();
        assert_eq!(uuid.to_string(), "6e400001-b5a3-f393-e0a9-e50e24dcca9e");
        assert_eq!(uuid.as_short(), None);
        assert_eq!("6e400001-b5a3-f393-e0a9-e50e24dcca9e".parse::<Uuid>().unwrap(), uuid);
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!("ffe0".parse::<Uuid>().unwrap(), Uuid::Short(0xFFE0));
        assert_eq!("0x2A19".parse::<Uuid>().unwrap(), Uuid::Short(0x2A19));
        assert_eq!("123".parse::<Uuid>(), Err(UuidParseError::InvalidLength));
        assert_eq!("12g4".parse::<Uuid>(), Err(UuidParseError::InvalidFormat));
        assert_eq!(
            UuidParseError::InvalidLength.to_string(),
            "UUID must have 4 or 32 hex digits"
        );
        assert!(Uuid::from_le_slice(&[0x01, 0x02, 0x03]).is_none());
    }
}
