//! Handle-range enumeration shared by all three discovery queries

use super::client::GattClient;
use super::types::{Discovery, Enumeration};
use crate::att::{
    AttPacket, DiscoveryMode, DiscoveryRecord, ErrorResponse, HandleRange, ATT_ERROR_RSP,
};
use crate::error::{Result, Violation};
use crate::transport::AttStream;
use log::{debug, warn};
use std::ops::ControlFlow;

impl<S: AttStream> GattClient<S> {
    /// Walks `range` with the query of `mode`, handing every record to `visit`.
    ///
    /// Each response moves the start of the remaining range past the last
    /// handle it reported, so the walk always makes progress. An Error Response
    /// with Attribute Not Found at the current start handle ends the walk
    /// normally. A response that is too short, or none at all, ends it with
    /// [`Enumeration::Incomplete`]. Every other deviation is a protocol
    /// violation.
    pub fn enumerate<F>(
        &mut self,
        range: HandleRange,
        mode: DiscoveryMode,
        mut visit: F,
    ) -> Result<Enumeration>
    where
        F: FnMut(&DiscoveryRecord) -> ControlFlow<()>,
    {
        let end = range.end();
        // u32 so that a record at 0xFFFF can still move past the end
        let mut start = u32::from(range.start());

        while start <= u32::from(end) {
            let current = start as u16;
            let query = HandleRange::new(current, end)
                .ok_or(Violation::InvalidRange { start: current, end })?;
            self.channel.send(&mode.query(query))?;

            let response = match self.channel.receive()? {
                Some(response) if response.len() > 2 => response,
                Some(response) => {
                    warn!("{}: unexpected length ({})", mode, response.len());
                    return Ok(Enumeration::Incomplete);
                }
                None => {
                    debug!("{}: no response for {}", mode, query);
                    return Ok(Enumeration::Incomplete);
                }
            };

            if response[0] == ATT_ERROR_RSP {
                let err = ErrorResponse::parse(&response)?;
                if err.is_end_of_range(mode.request_opcode(), current) {
                    return Ok(Enumeration::Exhausted);
                }
                return Err(Violation::UnexpectedErrorResponse {
                    request: err.request_opcode,
                    handle: err.handle,
                    code: err.error_code,
                }
                .into());
            }
            if response[0] != mode.response_opcode() {
                return Err(Violation::UnexpectedOpcode {
                    expected: mode.response_opcode(),
                    actual: response[0],
                }
                .into());
            }

            let stride = mode
                .record_stride(response[1])
                .ok_or(Violation::BadRecordLength(response[1]))?;
            let records = &response[2..];
            if records.len() % stride != 0 {
                return Err(Violation::RaggedRecords {
                    stride,
                    remainder: records.len() % stride,
                }
                .into());
            }

            for raw in records.chunks_exact(stride) {
                let handle = u16::from_le_bytes([raw[0], raw[1]]);
                if u32::from(handle) < start || handle > end {
                    return Err(Violation::HandleOutOfRange {
                        handle,
                        start: u16::try_from(start).unwrap_or(u16::MAX),
                        end,
                    }
                    .into());
                }
                start = u32::from(handle) + 1;

                let record = mode
                    .decode(raw)
                    .ok_or(Violation::BadRecordLength(response[1]))?;
                if visit(&record).is_break() {
                    return Ok(Enumeration::Stopped);
                }
            }
        }

        Ok(Enumeration::Exhausted)
    }

    /// Collects every record of `mode` in `range`.
    ///
    /// At verbosity 1 and above each record is logged as it arrives.
    pub fn discover(&mut self, range: HandleRange, mode: DiscoveryMode) -> Result<Discovery> {
        let verbose = self.channel.verbosity() >= 1;
        let mut records = Vec::new();

        let outcome = self.enumerate(range, mode, |record| {
            if verbose {
                debug!("{}: {}", mode, record);
            }
            records.push(record.clone());
            ControlFlow::Continue(())
        })?;

        Ok(Discovery {
            mode,
            records,
            outcome,
        })
    }
}
