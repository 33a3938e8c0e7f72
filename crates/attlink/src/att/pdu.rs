//! ATT PDU encoding and decoding
//!
//! Each PDU the client sends or expects back is a small struct implementing
//! [`AttPacket`]. All multi-byte fields are little-endian.
use super::constants::*;
use super::error::AttErrorCode;
use super::types::HandleRange;
use crate::error::{Result, Violation};
use crate::uuid::Uuid;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// ATT packet formats
pub trait AttPacket: Sized {
    /// Opcode for this packet
    fn opcode() -> u8;

    /// Parse packet from bytes
    fn parse(data: &[u8]) -> Result<Self>;

    /// Serialize packet to bytes
    fn serialize(&self) -> Vec<u8>;
}

/// Checks the opcode and minimum length shared by every parser
fn check_header(data: &[u8], opcode: u8, min_len: usize) -> Result<()> {
    if data.len() < min_len {
        return Err(Violation::BadLength(data.len()).into());
    }
    if data[0] != opcode {
        return Err(Violation::UnexpectedOpcode {
            expected: opcode,
            actual: data[0],
        }
        .into());
    }
    Ok(())
}

fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16> {
    let len = cursor.get_ref().len();
    cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| Violation::BadLength(len).into())
}

fn read_range(cursor: &mut Cursor<&[u8]>) -> Result<HandleRange> {
    let start = read_u16(cursor)?;
    let end = read_u16(cursor)?;
    HandleRange::new(start, end).ok_or_else(|| Violation::InvalidRange { start, end }.into())
}

fn push_range(packet: &mut Vec<u8>, range: HandleRange) {
    packet.extend_from_slice(&range.start().to_le_bytes());
    packet.extend_from_slice(&range.end().to_le_bytes());
}

fn push_uuid(packet: &mut Vec<u8>, uuid: &Uuid) {
    match uuid {
        Uuid::Short(value) => packet.extend_from_slice(&value.to_le_bytes()),
        Uuid::Long(bytes) => packet.extend_from_slice(bytes),
    }
}

/// Error response packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Request opcode in error
    pub request_opcode: u8,
    /// Attribute handle in error
    pub handle: u16,
    /// Error code
    pub error_code: AttErrorCode,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(request_opcode: u8, handle: u16, error_code: AttErrorCode) -> Self {
        Self {
            request_opcode,
            handle,
            error_code,
        }
    }

    /// The reply sent to a peer's Exchange MTU Request
    pub fn mtu_not_supported() -> Self {
        Self::new(
            ATT_EXCHANGE_MTU_REQ,
            0x0000,
            AttErrorCode::RequestNotSupported,
        )
    }

    /// True when this response only says that `request` found nothing at `start`
    pub fn is_end_of_range(&self, request: u8, start: u16) -> bool {
        self.request_opcode == request
            && self.handle == start
            && self.error_code == AttErrorCode::AttributeNotFound
    }
}

impl AttPacket for ErrorResponse {
    fn opcode() -> u8 {
        ATT_ERROR_RSP
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 5)?;
        if data.len() != 5 {
            return Err(Violation::BadLength(data.len()).into());
        }

        let mut cursor = Cursor::new(&data[2..]);
        let handle = read_u16(&mut cursor)?;

        Ok(Self {
            request_opcode: data[1],
            handle,
            error_code: data[4].into(),
        })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(5);

        packet.push(Self::opcode());
        packet.push(self.request_opcode);
        packet.extend_from_slice(&self.handle.to_le_bytes());
        packet.push(self.error_code.into());

        packet
    }
}

/// Exchange MTU Request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeMtuRequest {
    /// Client Rx MTU size
    pub client_mtu: u16,
}

impl ExchangeMtuRequest {
    /// Exchange MTU Requests are exactly three bytes long
    pub fn matches(data: &[u8]) -> bool {
        data.len() == 3 && data[0] == ATT_EXCHANGE_MTU_REQ
    }
}

impl AttPacket for ExchangeMtuRequest {
    fn opcode() -> u8 {
        ATT_EXCHANGE_MTU_REQ
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 3)?;
        let mut cursor = Cursor::new(&data[1..]);
        Ok(Self {
            client_mtu: read_u16(&mut cursor)?,
        })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(3);
        packet.push(Self::opcode());
        packet.extend_from_slice(&self.client_mtu.to_le_bytes());
        packet
    }
}

/// Find Information Request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindInformationRequest {
    pub range: HandleRange,
}

impl AttPacket for FindInformationRequest {
    fn opcode() -> u8 {
        ATT_FIND_INFO_REQ
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 5)?;
        let mut cursor = Cursor::new(&data[1..]);
        Ok(Self {
            range: read_range(&mut cursor)?,
        })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(5);
        packet.push(Self::opcode());
        push_range(&mut packet, self.range);
        packet
    }
}

/// Find By Type Value Request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindByTypeValueRequest {
    pub range: HandleRange,
    /// 16-bit attribute type
    pub attribute_type: u16,
    /// Attribute value to match
    pub value: Vec<u8>,
}

impl AttPacket for FindByTypeValueRequest {
    fn opcode() -> u8 {
        ATT_FIND_BY_TYPE_VALUE_REQ
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 7)?;
        let mut cursor = Cursor::new(&data[1..]);
        let range = read_range(&mut cursor)?;
        let attribute_type = read_u16(&mut cursor)?;
        Ok(Self {
            range,
            attribute_type,
            value: data[7..].to_vec(),
        })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(7 + self.value.len());
        packet.push(Self::opcode());
        push_range(&mut packet, self.range);
        packet.extend_from_slice(&self.attribute_type.to_le_bytes());
        packet.extend_from_slice(&self.value);
        packet
    }
}

/// Find By Type Value Response packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindByTypeValueResponse {
    /// Found attribute handle and group end handle pairs
    pub groups: Vec<HandleRange>,
}

impl AttPacket for FindByTypeValueResponse {
    fn opcode() -> u8 {
        ATT_FIND_BY_TYPE_VALUE_RSP
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 5)?;
        if (data.len() - 1) % 4 != 0 {
            return Err(Violation::RaggedRecords {
                stride: 4,
                remainder: (data.len() - 1) % 4,
            }
            .into());
        }

        let mut cursor = Cursor::new(&data[1..]);
        let mut groups = Vec::with_capacity((data.len() - 1) / 4);
        for _ in 0..(data.len() - 1) / 4 {
            groups.push(read_range(&mut cursor)?);
        }
        Ok(Self { groups })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(1 + 4 * self.groups.len());
        packet.push(Self::opcode());
        for group in &self.groups {
            push_range(&mut packet, *group);
        }
        packet
    }
}

/// Read By Type Request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadByTypeRequest {
    pub range: HandleRange,
    pub attribute_type: Uuid,
}

impl AttPacket for ReadByTypeRequest {
    fn opcode() -> u8 {
        ATT_READ_BY_TYPE_REQ
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 7)?;
        let mut cursor = Cursor::new(&data[1..]);
        let range = read_range(&mut cursor)?;
        let attribute_type =
            Uuid::from_le_slice(&data[5..]).ok_or(Violation::BadLength(data.len()))?;
        Ok(Self {
            range,
            attribute_type,
        })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(5 + self.attribute_type.wire_len());
        packet.push(Self::opcode());
        push_range(&mut packet, self.range);
        push_uuid(&mut packet, &self.attribute_type);
        packet
    }
}

/// Read By Type Response packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadByTypeResponse {
    /// Length of each item
    pub length: u8,
    /// List of handle-value pairs
    pub data: Vec<(u16, Vec<u8>)>,
}

impl AttPacket for ReadByTypeResponse {
    fn opcode() -> u8 {
        ATT_READ_BY_TYPE_RSP
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 4)?;

        let length = data[1];
        if length < 2 {
            return Err(Violation::BadRecordLength(length).into());
        }
        let stride = length as usize;
        let records = &data[2..];
        if records.len() % stride != 0 {
            return Err(Violation::RaggedRecords {
                stride,
                remainder: records.len() % stride,
            }
            .into());
        }

        let data = records
            .chunks_exact(stride)
            .map(|item| (u16::from_le_bytes([item[0], item[1]]), item[2..].to_vec()))
            .collect();

        Ok(Self { length, data })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = vec![Self::opcode(), self.length];
        for (handle, value) in &self.data {
            packet.extend_from_slice(&handle.to_le_bytes());
            packet.extend_from_slice(value);
        }
        packet
    }
}

/// Read By Group Type Request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadByGroupTypeRequest {
    pub range: HandleRange,
    pub group_type: Uuid,
}

impl AttPacket for ReadByGroupTypeRequest {
    fn opcode() -> u8 {
        ATT_READ_BY_GROUP_TYPE_REQ
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 7)?;
        let mut cursor = Cursor::new(&data[1..]);
        let range = read_range(&mut cursor)?;
        let group_type = Uuid::from_le_slice(&data[5..]).ok_or(Violation::BadLength(data.len()))?;
        Ok(Self { range, group_type })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(5 + self.group_type.wire_len());
        packet.push(Self::opcode());
        push_range(&mut packet, self.range);
        push_uuid(&mut packet, &self.group_type);
        packet
    }
}

/// Read Request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub handle: u16,
}

impl AttPacket for ReadRequest {
    fn opcode() -> u8 {
        ATT_READ_REQ
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 3)?;
        let mut cursor = Cursor::new(&data[1..]);
        Ok(Self {
            handle: read_u16(&mut cursor)?,
        })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(3);
        packet.push(Self::opcode());
        packet.extend_from_slice(&self.handle.to_le_bytes());
        packet
    }
}

/// Read Response packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResponse {
    pub value: Vec<u8>,
}

impl AttPacket for ReadResponse {
    fn opcode() -> u8 {
        ATT_READ_RSP
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 1)?;
        Ok(Self {
            value: data[1..].to_vec(),
        })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(1 + self.value.len());
        packet.push(Self::opcode());
        packet.extend_from_slice(&self.value);
        packet
    }
}

/// Write Request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub handle: u16,
    pub value: Vec<u8>,
}

impl AttPacket for WriteRequest {
    fn opcode() -> u8 {
        ATT_WRITE_REQ
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 3)?;
        let mut cursor = Cursor::new(&data[1..]);
        Ok(Self {
            handle: read_u16(&mut cursor)?,
            value: data[3..].to_vec(),
        })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(3 + self.value.len());
        packet.push(Self::opcode());
        packet.extend_from_slice(&self.handle.to_le_bytes());
        packet.extend_from_slice(&self.value);
        packet
    }
}

/// Write Command packet (no response)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCommand {
    pub handle: u16,
    pub value: Vec<u8>,
}

impl AttPacket for WriteCommand {
    fn opcode() -> u8 {
        ATT_WRITE_CMD
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), 3)?;
        let mut cursor = Cursor::new(&data[1..]);
        Ok(Self {
            handle: read_u16(&mut cursor)?,
            value: data[3..].to_vec(),
        })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(3 + self.value.len());
        packet.push(Self::opcode());
        packet.extend_from_slice(&self.handle.to_le_bytes());
        packet.extend_from_slice(&self.value);
        packet
    }
}

/// Handle Value Notification packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleValueNotification {
    pub handle: u16,
    pub value: Vec<u8>,
}

impl HandleValueNotification {
    /// Peeks at the handle of a notification without copying its value
    pub fn peek_handle(data: &[u8]) -> Option<u16> {
        if data.len() >= ATT_HEADER_SIZE && data[0] == ATT_HANDLE_VALUE_NTF {
            Some(u16::from_le_bytes([data[1], data[2]]))
        } else {
            None
        }
    }
}

impl AttPacket for HandleValueNotification {
    fn opcode() -> u8 {
        ATT_HANDLE_VALUE_NTF
    }

    fn parse(data: &[u8]) -> Result<Self> {
        check_header(data, Self::opcode(), ATT_HEADER_SIZE)?;
        let mut cursor = Cursor::new(&data[1..]);
        Ok(Self {
            handle: read_u16(&mut cursor)?,
            value: data[ATT_HEADER_SIZE..].to_vec(),
        })
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(ATT_HEADER_SIZE + self.value.len());
        packet.push(Self::opcode());
        packet.extend_from_slice(&self.handle.to_le_bytes());
        packet.extend_from_slice(&self.value);
        packet
    }
}
