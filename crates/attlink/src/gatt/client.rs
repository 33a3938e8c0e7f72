//! GATT Client implementation
//!
//! This module provides a client for talking to a GATT server over one
//! connected ATT channel. Requests are strictly sequential: the next PDU the
//! channel hands back after a request is taken to be its response.

use crate::att::{
    AttPacket, ErrorResponse, HandleRange, ReadByTypeRequest, ReadByTypeResponse, ReadRequest,
    ReadResponse, WriteCommand, WriteRequest, ATT_ERROR_RSP, ATT_READ_BY_TYPE_RSP,
    ATT_WRITE_RSP, BATTERY_LEVEL_UUID,
};
use crate::error::{Error, Result, Violation};
use crate::transport::{AttStream, Channel, ChannelConfig};
use crate::uuid::Uuid;
use log::{debug, info};

/// A GATT client bound to one connected channel
pub struct GattClient<S> {
    pub(crate) channel: Channel<S>,
}

impl<S: AttStream> GattClient<S> {
    /// Creates a client over an already-connected stream
    pub fn new(stream: S, config: ChannelConfig) -> Self {
        Self::from_channel(Channel::new(stream, config))
    }

    pub fn from_channel(channel: Channel<S>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &Channel<S> {
        &self.channel
    }

    /// Raw access for application protocols layered on top of ATT
    pub fn channel_mut(&mut self) -> &mut Channel<S> {
        &mut self.channel
    }

    pub fn into_channel(self) -> Channel<S> {
        self.channel
    }

    /// Sends `request` and returns the response, turning an Error Response
    /// into [`Error::Att`] and any other opcode into a violation.
    fn exchange(&mut self, request: &[u8], expected: u8) -> Result<Vec<u8>> {
        self.channel.send(request)?;
        let response = self.channel.receive_pdu()?;

        match response.first() {
            Some(&opcode) if opcode == expected => Ok(response),
            Some(&ATT_ERROR_RSP) => {
                let err = ErrorResponse::parse(&response)?;
                Err(Error::Att {
                    request: err.request_opcode,
                    handle: err.handle,
                    code: err.error_code,
                })
            }
            Some(&actual) => Err(Violation::UnexpectedOpcode { expected, actual }.into()),
            None => Err(Violation::BadLength(0).into()),
        }
    }

    /// Read the value of the attribute at `handle`
    pub fn read(&mut self, handle: u16) -> Result<Vec<u8>> {
        let request = ReadRequest { handle }.serialize();
        let response = self.exchange(&request, ReadResponse::opcode())?;
        Ok(ReadResponse::parse(&response)?.value)
    }

    /// Write `value` to `handle` and wait for the Write Response
    pub fn write_request(&mut self, handle: u16, value: &[u8]) -> Result<()> {
        let request = WriteRequest {
            handle,
            value: value.to_vec(),
        }
        .serialize();
        self.exchange(&request, ATT_WRITE_RSP)?;
        Ok(())
    }

    /// Write `value` to `handle` without waiting for anything back
    pub fn write_command(&mut self, handle: u16, value: &[u8]) -> Result<()> {
        let command = WriteCommand {
            handle,
            value: value.to_vec(),
        };
        self.channel.send(&command.serialize())
    }

    /// Returns the first handle/value pair of `attribute_type` in `range`
    pub fn read_by_type(
        &mut self,
        range: HandleRange,
        attribute_type: u16,
    ) -> Result<(u16, Vec<u8>)> {
        let request = ReadByTypeRequest {
            range,
            attribute_type: Uuid::Short(attribute_type),
        }
        .serialize();
        let response = self.exchange(&request, ATT_READ_BY_TYPE_RSP)?;
        ReadByTypeResponse::parse(&response)?
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Violation::BadLength(response.len()).into())
    }

    /// Reads the Battery Level characteristic anywhere in the table.
    ///
    /// Returns the characteristic handle and the level in percent, or `None`
    /// when the peer answers with anything but a single one-byte value.
    pub fn battery_level(&mut self) -> Result<Option<(u16, u8)>> {
        let request = ReadByTypeRequest {
            range: HandleRange::full(),
            attribute_type: Uuid::Short(BATTERY_LEVEL_UUID),
        }
        .serialize();
        self.channel.send(&request)?;

        let response = match self.channel.receive()? {
            Some(response) => response,
            None => return Ok(None),
        };
        if response.len() != 5 || response[0] != ATT_READ_BY_TYPE_RSP || response[1] != 3 {
            debug!("no battery level in response of {} bytes", response.len());
            return Ok(None);
        }

        let handle = u16::from_le_bytes([response[2], response[3]]);
        if self.channel.verbosity() >= 1 {
            info!("Handle = 0x{:04x} (Battery Level)", handle);
        }
        Ok(Some((handle, response[4])))
    }
}
