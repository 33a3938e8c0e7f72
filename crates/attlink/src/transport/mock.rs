//! Scripted in-memory stream for tests

use super::stream::{AttStream, Readiness};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Plays back queued inbound PDUs and records every outbound one.
///
/// Inbound PDUs are delivered one per `read`, the way a SEQPACKET socket
/// delivers them. Once the script runs dry the stream either times out or,
/// with `hang_up_when_drained`, reports a hang-up.
#[derive(Debug, Default)]
pub(crate) struct MockStream {
    inbound: VecDeque<Vec<u8>>,
    pub sent: Vec<Vec<u8>>,
    pub hang_up_when_drained: bool,
    pub short_writes: bool,
}

impl MockStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inbound<I, P>(pdus: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let mut stream = Self::new();
        for pdu in pdus {
            stream.push_inbound(pdu.as_ref());
        }
        stream
    }

    pub fn push_inbound(&mut self, pdu: &[u8]) {
        self.inbound.push_back(pdu.to_vec());
    }

    pub fn pending(&self) -> usize {
        self.inbound.len()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inbound.pop_front() {
            Some(pdu) => {
                let n = pdu.len().min(buf.len());
                buf[..n].copy_from_slice(&pdu[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sent.push(buf.to_vec());
        if self.short_writes {
            Ok(buf.len().saturating_sub(1))
        } else {
            Ok(buf.len())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AttStream for MockStream {
    fn wait_readable(&mut self, _timeout: Duration) -> io::Result<Readiness> {
        if !self.inbound.is_empty() {
            Ok(Readiness::Readable)
        } else if self.hang_up_when_drained {
            Ok(Readiness::HangUp)
        } else {
            Ok(Readiness::TimedOut)
        }
    }
}
