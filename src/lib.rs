//! A tamper-evident ledger for user-submitted reports: record storage,
//! owner/collaborator access control, versioned history, attachment
//! references and engagement metrics, kept in sled.

pub mod access;
pub mod attachment;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod ids;
pub mod limits;
pub mod metrics;
pub mod report;
pub mod service;
pub mod store;

pub use access::{Capability, CapabilitySet, CollaboratorGrant};
pub use attachment::{Attachment, ContentHash};
pub use config::LedgerConfig;
pub use context::{CallContext, Principal};
pub use error::{ErrorKind, LedgerError};
pub use history::HistoryEntry;
pub use metrics::Metrics;
pub use report::{Report, ReportDraft, ReportId, Visibility};
pub use service::ReportLedger;
