//! Bluetooth sockets for the ATT fixed channel and RFCOMM
//!
//! This module wraps the raw BlueZ socket interface just far enough to hand a
//! connected stream to a [`Channel`](super::Channel).

use super::stream::{AttStream, Readiness};
use crate::att::ATT_CID;
use std::fmt;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// Bluetooth socket constants
const AF_BLUETOOTH: i32 = 31;
const BTPROTO_L2CAP: i32 = 0;
const BTPROTO_RFCOMM: i32 = 3;

/// A Bluetooth device address, stored little-endian as the kernel expects it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    /// The wildcard address, 00:00:00:00:00:00
    pub const ANY: BdAddr = BdAddr { bytes: [0; 6] };

    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed address: {0}")]
pub struct BdAddrParseError(pub String);

impl FromStr for BdAddr {
    type Err = BdAddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || BdAddrParseError(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(err());
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(err());
            }
            // Most significant octet comes first in the text form
            bytes[5 - i] = u8::from_str_radix(part, 16).map_err(|_| err())?;
        }
        Ok(BdAddr { bytes })
    }
}

/// Address type used when binding and connecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    BrEdr,
    LePublic,
    LeRandom,
}

impl TryFrom<u8> for AddressType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AddressType::BrEdr),
            1 => Ok(AddressType::LePublic),
            2 => Ok(AddressType::LeRandom),
            other => Err(other),
        }
    }
}

impl From<AddressType> for u8 {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::BrEdr => 0,
            AddressType::LePublic => 1,
            AddressType::LeRandom => 2,
        }
    }
}

// Define the sockaddr_l2 structure
#[repr(C)]
struct SockaddrL2 {
    l2_family: libc::sa_family_t,
    l2_psm: u16,
    l2_bdaddr: [u8; 6],
    l2_cid: u16,
    l2_bdaddr_type: u8,
}

impl SockaddrL2 {
    fn fixed_channel(addr: &BdAddr, addr_type: AddressType, cid: u16) -> Self {
        Self {
            l2_family: AF_BLUETOOTH as libc::sa_family_t,
            l2_psm: 0,
            l2_bdaddr: addr.bytes,
            l2_cid: cid.to_le(),
            l2_bdaddr_type: addr_type.into(),
        }
    }
}

// Define the sockaddr_rc structure
#[repr(C)]
struct SockaddrRc {
    rc_family: libc::sa_family_t,
    rc_bdaddr: [u8; 6],
    rc_channel: u8,
}

/// A connected Bluetooth socket
#[derive(Debug)]
pub struct BtSocket {
    fd: RawFd,
}

impl BtSocket {
    fn open(kind: libc::c_int, protocol: i32) -> io::Result<Self> {
        let fd = unsafe { libc::socket(AF_BLUETOOTH, kind, protocol) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(BtSocket { fd })
    }

    fn connect_addr<T>(&self, addr: &T) -> io::Result<()> {
        let result = unsafe {
            libc::connect(
                self.fd,
                addr as *const T as *const libc::sockaddr,
                std::mem::size_of::<T>() as libc::socklen_t,
            )
        };
        if result < 0 {
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EAGAIN) | Some(libc::EINPROGRESS) => {}
                _ => return Err(err),
            }
        }
        Ok(())
    }

    /// Opens a SEQPACKET socket on the LE ATT fixed channel (CID 4)
    ///
    /// # Arguments
    ///
    /// * `src` - Local adapter address (`BdAddr::ANY` for the default adapter)
    /// * `dst` - Peer address
    pub fn connect_att(
        src: &BdAddr,
        src_type: AddressType,
        dst: &BdAddr,
        dst_type: AddressType,
    ) -> io::Result<Self> {
        let socket = Self::open(libc::SOCK_SEQPACKET, BTPROTO_L2CAP)?;

        let local = SockaddrL2::fixed_channel(src, src_type, ATT_CID);
        let result = unsafe {
            libc::bind(
                socket.fd,
                &local as *const SockaddrL2 as *const libc::sockaddr,
                std::mem::size_of::<SockaddrL2>() as libc::socklen_t,
            )
        };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }

        let remote = SockaddrL2::fixed_channel(dst, dst_type, ATT_CID);
        socket.connect_addr(&remote)?;
        Ok(socket)
    }

    /// Opens a STREAM socket to RFCOMM `channel` on `dst`
    pub fn connect_rfcomm(dst: &BdAddr, channel: u8) -> io::Result<Self> {
        let socket = Self::open(libc::SOCK_STREAM, BTPROTO_RFCOMM)?;
        let remote = SockaddrRc {
            rc_family: AF_BLUETOOTH as libc::sa_family_t,
            rc_bdaddr: dst.bytes,
            rc_channel: channel,
        };
        socket.connect_addr(&remote)?;
        Ok(socket)
    }
}

impl Read for BtSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

impl Write for BtSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AttStream for BtSocket {
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<Readiness> {
        let mut fds = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

        let result = unsafe { libc::poll(&mut fds, 1, millis) };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        if fds.revents & libc::POLLHUP != 0 {
            return Ok(Readiness::HangUp);
        }
        if result == 0 {
            return Ok(Readiness::TimedOut);
        }
        Ok(Readiness::Readable)
    }
}

impl AsRawFd for BtSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for BtSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
