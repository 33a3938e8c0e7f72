//! ATT channel over a connected stream
//!
//! The channel is the only owner of the stream. Every receive in ATT mode
//! transparently answers an Exchange MTU Request with "request not supported"
//! and drops Handle Value Notifications rejected by the current
//! [`NotificationFilter`]; neither ever reaches the caller.

use super::dump::HexDump;
use super::stream::{AttStream, Readiness};
use crate::att::{
    AttPacket, ErrorResponse, ExchangeMtuRequest, HandleValueNotification, ATT_HEADER_SIZE,
};
use crate::error::{Error, Result};
use log::{debug, trace, warn};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Receive buffer size; one PDU never exceeds it
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// Default receive timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// How received bytes are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// ATT over the L2CAP fixed channel
    Att,
    /// Raw passthrough (RFCOMM), no ATT handling on receive
    Raw,
}

/// Which Handle Value Notifications a receive lets through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationFilter {
    /// Every notification is delivered
    #[default]
    Off,
    /// No handle matches, so every notification with a payload is dropped
    DiscardAll,
    /// Only notifications for this handle are delivered
    Only(u16),
}

impl NotificationFilter {
    /// True if a notification for `handle` must be dropped
    pub fn discards(&self, handle: u16) -> bool {
        match self {
            NotificationFilter::Off => false,
            NotificationFilter::DiscardAll => true,
            NotificationFilter::Only(wanted) => *wanted != handle,
        }
    }
}

/// Channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// How long a receive waits for data; `None` waits forever
    pub timeout: Option<Duration>,
    /// 0 = quiet, 1 = discovery results, 2 = PDU dumps
    pub verbosity: u8,
    pub mode: TransportMode,
    /// Receive buffer capacity in bytes
    pub buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            verbosity: 0,
            mode: TransportMode::Att,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// A connected ATT channel
pub struct Channel<S> {
    stream: S,
    buf: Vec<u8>,
    timeout: Option<Duration>,
    verbosity: u8,
    mode: TransportMode,
    filter: NotificationFilter,
}

impl<S: AttStream> Channel<S> {
    /// Wraps an already-connected stream
    pub fn new(stream: S, config: ChannelConfig) -> Self {
        Self {
            stream,
            buf: vec![0; config.buffer_size.max(ATT_HEADER_SIZE)],
            timeout: config.timeout,
            verbosity: config.verbosity,
            mode: config.mode,
            filter: NotificationFilter::Off,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sets the receive timeout for subsequent calls
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Sets the receive timeout in milliseconds; negative waits forever
    pub fn set_timeout_ms(&mut self, millis: i64) {
        self.timeout = u64::try_from(millis).ok().map(Duration::from_millis);
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: u8) {
        self.verbosity = verbosity;
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn filter(&self) -> NotificationFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: NotificationFilter) {
        self.filter = filter;
    }

    /// Largest PDU a single receive can hold
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Receives one PDU.
    ///
    /// Returns `Ok(None)` when the timeout expires without data and
    /// `Err(Error::ConnectionClosed)` when the peer hangs up.
    pub fn receive(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(timeout) = self.timeout {
                match self.stream.wait_readable(timeout)? {
                    Readiness::Readable => {}
                    Readiness::TimedOut => {
                        trace!("no data within {:?}", timeout);
                        return Ok(None);
                    }
                    Readiness::HangUp => return Err(Error::ConnectionClosed),
                }
            }

            let len = match self.stream.read(&mut self.buf) {
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(len) => len,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            let pdu = &self.buf[..len];
            if self.verbosity >= 2 {
                debug!("recv ({}):\n{}", len, HexDump(pdu));
            }

            if self.mode == TransportMode::Raw {
                return Ok(Some(pdu.to_vec()));
            }

            if ExchangeMtuRequest::matches(pdu) {
                debug!("rejecting Exchange MTU Request");
                self.send(&ErrorResponse::mtu_not_supported().serialize())?;
                continue;
            }

            if pdu.len() > ATT_HEADER_SIZE {
                if let Some(handle) = HandleValueNotification::peek_handle(pdu) {
                    if self.filter.discards(handle) {
                        trace!("dropping notification for handle 0x{:04x}", handle);
                        continue;
                    }
                }
            }

            return Ok(Some(pdu.to_vec()));
        }
    }

    /// Receives one PDU, treating an expired timeout as an error
    pub fn receive_pdu(&mut self) -> Result<Vec<u8>> {
        self.receive()?.ok_or(Error::Timeout)
    }

    /// Sends `data` as one PDU
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyMessage);
        }
        if self.verbosity >= 2 {
            debug!("send ({}):\n{}", data.len(), HexDump(data));
        }

        let written = self.stream.write(data)?;
        if written != data.len() {
            warn!("short write ({} of {} bytes)", written, data.len());
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }

    /// Sends a request and receives the PDU that follows it
    pub fn request(&mut self, pdu: &[u8]) -> Result<Option<Vec<u8>>> {
        self.send(pdu)?;
        self.receive()
    }
}
