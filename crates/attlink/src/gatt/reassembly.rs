//! Notification payloads spread over several PDUs

use super::client::GattClient;
use crate::att::{AttPacket, HandleValueNotification, ATT_HANDLE_VALUE_NTF, ATT_HEADER_SIZE};
use crate::error::{Error, Result, Violation};
use crate::transport::AttStream;
use log::trace;

impl<S: AttStream> GattClient<S> {
    /// Collects a notification payload of `total` bytes.
    ///
    /// `first` is the complete first notification PDU, header included. The
    /// remaining fragments must be notifications for the same handle, and
    /// together they must add up to exactly `total` payload bytes. Returns the
    /// concatenated payload without any header.
    pub fn reassemble_notification(&mut self, first: &[u8], total: usize) -> Result<Vec<u8>> {
        let first = HandleValueNotification::parse(first)?;
        let mut payload = first.value;
        if payload.len() >= total {
            return Ok(payload);
        }
        if total > self.channel.capacity().saturating_sub(ATT_HEADER_SIZE) {
            return Err(Error::Truncated);
        }
        payload.reserve(total - payload.len());

        while payload.len() < total {
            let pdu = match self.channel.receive()? {
                Some(pdu) if pdu.len() >= ATT_HEADER_SIZE => pdu,
                _ => return Err(Error::Truncated),
            };
            if pdu[0] != ATT_HANDLE_VALUE_NTF {
                return Err(Violation::UnexpectedOpcode {
                    expected: ATT_HANDLE_VALUE_NTF,
                    actual: pdu[0],
                }
                .into());
            }

            let handle = u16::from_le_bytes([pdu[1], pdu[2]]);
            if handle != first.handle {
                return Err(Violation::HandleMismatch {
                    expected: first.handle,
                    actual: handle,
                }
                .into());
            }

            let fragment = &pdu[ATT_HEADER_SIZE..];
            let remaining = total - payload.len();
            if fragment.len() > remaining {
                return Err(Violation::FragmentOvershoot {
                    len: fragment.len(),
                    remaining,
                }
                .into());
            }
            trace!(
                "fragment of {} bytes, {} to go",
                fragment.len(),
                remaining - fragment.len()
            );
            payload.extend_from_slice(fragment);
        }

        Ok(payload)
    }
}
