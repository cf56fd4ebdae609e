//! Per-report change log, keyed by a caller-chosen version number
use super::context::Principal;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    #[n(0)]
    pub author: Principal,
    #[n(1)]
    pub changes: String,
    #[n(2)]
    pub timestamp: u64, // logical clock
}

impl HistoryEntry {
    pub fn new(author: Principal, changes: String, timestamp: u64) -> Self {
        Self {
            author,
            changes,
            timestamp,
        }
    }
}
