//! Collaborator grants and the authorization predicate
use super::context::Principal;
use super::error::LedgerError;
use super::limits::{MAX_PERMISSIONS, check_count};
use super::report::Report;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(
    minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Capability {
    #[n(0)]
    ViewReport,
    #[n(1)]
    UpdateStatus,
    #[n(2)]
    AddAttachment,
    #[n(3)]
    RecordHistory,
    #[n(4)]
    UpdateMetrics,
}

/// The capabilities carried by a single grant. Built only through
/// [`CapabilitySet::bounded`], which enforces the permission bound.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet(#[n(0)] BTreeSet<Capability>);

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorGrant {
    #[n(0)]
    pub role: String,
    #[n(1)]
    pub permissions: CapabilitySet,
    #[n(2)]
    pub granted_at: u64, // logical clock
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::ViewReport,
        Capability::UpdateStatus,
        Capability::AddAttachment,
        Capability::RecordHistory,
        Capability::UpdateMetrics,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Capability::ViewReport => "view",
            Capability::UpdateStatus => "update-status",
            Capability::AddAttachment => "add-attachment",
            Capability::RecordHistory => "record-history",
            Capability::UpdateMetrics => "update-metrics",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Capability {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| LedgerError::InvalidParameter(format!("unknown capability {s:?}")))
    }
}

impl CapabilitySet {
    /// The requested list is counted as given, duplicates included.
    pub fn bounded(requested: &[Capability]) -> Result<Self, LedgerError> {
        check_count("permissions", requested.len(), MAX_PERMISSIONS)?;
        Ok(Self(requested.iter().copied().collect()))
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }
}

impl CollaboratorGrant {
    pub fn allows(&self, capability: Capability) -> bool {
        self.permissions.contains(capability)
    }
}

/// Owner always passes; anyone else needs a grant carrying `capability`.
pub fn is_authorized(
    report: &Report,
    grant: Option<&CollaboratorGrant>,
    identity: &Principal,
    capability: Capability,
) -> bool {
    if &report.owner == identity {
        return true;
    }
    grant.is_some_and(|g| g.allows(capability))
}
