//! Report records and the draft used to submit them
use super::context::Principal;
use super::error::LedgerError;
use super::limits::{
    MAX_CATEGORY_LEN, MAX_DESCRIPTION_LEN, MAX_TAG_LEN, MAX_TAGS, MAX_TITLE_LEN, check_count,
    check_len,
};
use std::fmt;

pub const INITIAL_STATUS: &str = "open";

/// Ledger-assigned report identifier. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportId(pub u64);

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    #[n(0)]
    Private,
    #[n(1)]
    Public,
}

// Also used for constructing drafts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDraft {
    title: String,
    description: String,
    category: String,
    tags: Vec<String>,
    eco_impact_estimate: u64,
    visibility: Visibility,
}

/// A stored report. Only `status` changes after submission.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Report {
    #[n(0)]
    pub id: ReportId,
    #[n(1)]
    pub owner: Principal,
    #[n(2)]
    pub created_at: u64, // logical clock
    #[n(3)]
    pub title: String,
    #[n(4)]
    pub description: String,
    #[n(5)]
    pub category: String,
    #[n(6)]
    pub tags: Vec<String>,
    #[n(7)]
    pub status: String,
    #[n(8)]
    pub eco_impact_estimate: u64,
    #[n(9)]
    pub visibility: Visibility,
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ReportId {
    fn from(value: u64) -> Self {
        ReportId(value)
    }
}

impl Visibility {
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

impl From<bool> for Visibility {
    fn from(public: bool) -> Self {
        if public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

impl Default for ReportDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: String::new(),
            tags: vec![],
            eco_impact_estimate: 0,
            visibility: Visibility::Public,
        }
    }
}

impl ReportDraft {
    /// Construct an empty public draft
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
    pub fn set_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }
    pub fn add_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }
    pub fn set_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
    pub fn set_eco_impact_estimate(mut self, estimate: u64) -> Self {
        self.eco_impact_estimate = estimate;
        self
    }
    pub fn set_visibility(mut self, visibility: impl Into<Visibility>) -> Self {
        self.visibility = visibility.into();
        self
    }

    /// Checks every static bound. Nothing is written when this fails.
    pub fn validate(&self) -> Result<(), LedgerError> {
        check_len("title", &self.title, MAX_TITLE_LEN)?;
        check_len("description", &self.description, MAX_DESCRIPTION_LEN)?;
        check_len("category", &self.category, MAX_CATEGORY_LEN)?;
        check_count("tags", self.tags.len(), MAX_TAGS)?;
        for tag in &self.tags {
            check_len("tag", tag, MAX_TAG_LEN)?;
        }
        Ok(())
    }

    /// Seal the draft into a stored report with the initial status.
    pub fn into_report(self, id: ReportId, owner: Principal, created_at: u64) -> Report {
        Report {
            id,
            owner,
            created_at,
            title: self.title,
            description: self.description,
            category: self.category,
            tags: self.tags,
            status: INITIAL_STATUS.to_string(),
            eco_impact_estimate: self.eco_impact_estimate,
            visibility: self.visibility,
        }
    }
}

impl Report {
    /// Hex sha256 over the CBOR encoding of every field except `status`.
    /// Stable for the lifetime of the report.
    pub fn fingerprint(&self) -> Result<String, LedgerError> {
        let mut sealed = self.clone();
        sealed.status.clear();
        let contents = minicbor::to_vec(&sealed)?;

        Ok(sha256::digest(&contents))
    }
}

impl<C> minicbor::Encode<C> for ReportId {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.u64(self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ReportId {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(ReportId(d.u64()?))
    }
}
