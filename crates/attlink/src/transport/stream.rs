//! The byte-stream abstraction a [`Channel`](super::Channel) runs over

use std::io::{self, Read, Write};
use std::time::Duration;

/// Outcome of waiting for a stream to become readable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Data is waiting
    Readable,
    /// The deadline passed without data
    TimedOut,
    /// The peer hung up
    HangUp,
}

/// A connected, blocking byte stream that can be polled for readability.
///
/// On an L2CAP SEQPACKET socket one `read` returns exactly one PDU.
pub trait AttStream: Read + Write {
    /// Waits up to `timeout` for data to arrive
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<Readiness>;
}

impl<S: AttStream + ?Sized> AttStream for Box<S> {
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<Readiness> {
        (**self).wait_readable(timeout)
    }
}
