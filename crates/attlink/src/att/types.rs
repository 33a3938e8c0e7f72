//! Type definitions for the ATT protocol
use super::constants::{ATT_HANDLE_MAX, ATT_HANDLE_MIN};
use std::fmt;

/// An inclusive range of attribute handles used to bound a query.
///
/// `start <= end` and `start != 0` hold for every constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleRange {
    start: u16,
    end: u16,
}

impl HandleRange {
    /// Create a range, rejecting an empty or zero-based one
    pub fn new(start: u16, end: u16) -> Option<Self> {
        if start < ATT_HANDLE_MIN || start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// The whole attribute table, 0x0001..=0xFFFF
    pub const fn full() -> Self {
        Self {
            start: ATT_HANDLE_MIN,
            end: ATT_HANDLE_MAX,
        }
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// The handles following `handle` up to the end of this range, if any
    pub fn after(&self, handle: u16) -> Option<Self> {
        let next = handle.checked_add(1)?;
        Self::new(next.max(self.start), self.end)
    }
}

impl Default for HandleRange {
    fn default() -> Self {
        Self::full()
    }
}

impl fmt::Display for HandleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}..=0x{:04x}", self.start, self.end)
    }
}
