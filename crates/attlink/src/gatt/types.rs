//! Common types for GATT discovery
//!
//! This module defines the outcomes an enumeration pass can end with and the
//! collected result of a full discovery listing.

use crate::att::{DiscoveryMode, DiscoveryRecord};
use std::fmt;

/// How an enumeration pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enumeration {
    /// The whole range was walked, or the peer reported no more attributes
    Exhausted,
    /// The visitor asked to stop early
    Stopped,
    /// A response was too short or never arrived before the timeout
    Incomplete,
}

impl Enumeration {
    /// True unless the pass was cut short by a missing response
    pub fn is_complete(&self) -> bool {
        !matches!(self, Enumeration::Incomplete)
    }
}

impl fmt::Display for Enumeration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Enumeration::Exhausted => "exhausted",
            Enumeration::Stopped => "stopped",
            Enumeration::Incomplete => "incomplete",
        })
    }
}

/// Every record one discovery pass produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub mode: DiscoveryMode,
    pub records: Vec<DiscoveryRecord>,
    pub outcome: Enumeration,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiscoveryRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Discovery {
    type Item = &'a DiscoveryRecord;
    type IntoIter = std::slice::Iter<'a, DiscoveryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
