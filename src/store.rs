//! sled trees backing the ledger, and the CBOR key layout inside them
//!
//! Every dependent store is keyed by a CBOR tuple `(report_id, second)`.
//! Unsigned integers use the shortest CBOR form, which sorts the same way
//! the numbers do, so a prefix scan over `[0x82, report_id..]` walks one
//! report's entries in key order.
use super::error::LedgerError;
use super::report::ReportId;
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult};
use sled::{Db, Tree};

pub const REPORTS: &str = "reports";
pub const COUNTERS: &str = "counters";
pub const COLLABORATORS: &str = "collaborators";
pub const HISTORY: &str = "history";
pub const ATTACHMENTS: &str = "attachments";
pub const METRICS: &str = "metrics";

/// The keyed stores other than the counters, which the id generator owns.
#[derive(Clone)]
pub struct Stores {
    pub reports: Tree,
    pub collaborators: Tree,
    pub history: Tree,
    pub attachments: Tree,
    pub metrics: Tree,
}

impl Stores {
    pub fn open(db: &Db) -> Result<Self, LedgerError> {
        Ok(Self {
            reports: db.open_tree(REPORTS)?,
            collaborators: db.open_tree(COLLABORATORS)?,
            history: db.open_tree(HISTORY)?,
            attachments: db.open_tree(ATTACHMENTS)?,
            metrics: db.open_tree(METRICS)?,
        })
    }
}

pub fn report_key(id: ReportId) -> Result<Vec<u8>, LedgerError> {
    Ok(minicbor::to_vec(id)?)
}

pub fn composite_key<K: minicbor::Encode<()>>(id: ReportId, second: K) -> Result<Vec<u8>, LedgerError> {
    Ok(minicbor::to_vec((id, second))?)
}

/// The shared leading bytes of every composite key for `id`.
pub fn report_prefix(id: ReportId) -> Result<Vec<u8>, LedgerError> {
    let mut e = minicbor::Encoder::new(Vec::new());
    e.array(2)?.encode(id)?;
    Ok(e.into_writer())
}

pub fn read<T>(tree: &Tree, key: &[u8]) -> Result<Option<T>, LedgerError>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    match tree.get(key)? {
        Some(bytes) => Ok(Some(minicbor::decode(&bytes)?)),
        None => Ok(None),
    }
}

pub fn write<T: minicbor::Encode<()>>(tree: &Tree, key: &[u8], value: &T) -> Result<(), LedgerError> {
    let contents = minicbor::to_vec(value)?;
    tree.insert(key, contents)?;
    Ok(())
}

/// Lift a codec or key failure inside a transaction closure into an abort.
pub fn abortable<T, E: Into<LedgerError>>(
    result: Result<T, E>,
) -> ConflictableTransactionResult<T, LedgerError> {
    result.map_err(|e| ConflictableTransactionError::Abort(e.into()))
}

/// Decode every `(second, value)` pair stored under one report.
pub fn scan_report<K, T>(tree: &Tree, id: ReportId) -> Result<Vec<(K, T)>, LedgerError>
where
    K: for<'b> minicbor::Decode<'b, ()>,
    T: for<'b> minicbor::Decode<'b, ()>,
{
    let mut entries = Vec::new();
    for item in tree.scan_prefix(report_prefix(id)?) {
        let (key, value) = item?;
        let (_, second): (ReportId, K) = minicbor::decode(&key)?;
        entries.push((second, minicbor::decode(&value)?));
    }
    Ok(entries)
}
