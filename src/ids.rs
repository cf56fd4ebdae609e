//! Report id allocation and per-principal submission counts
//!
//! The generator is the only writer of the `counters` tree. An id is
//! reserved and applied inside the submit transaction, so the counters are
//! read and bumped atomically and a failed submit leaves no trace.
use super::context::Principal;
use super::error::LedgerError;
use super::report::ReportId;
use super::store::{self, COUNTERS, abortable};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionalTree,
    UnabortableTransactionError,
};
use sled::{Db, Tree};

#[derive(minicbor::Encode, Debug)]
enum CounterKey {
    #[n(0)]
    Sequence,
    #[n(1)]
    Submissions(#[n(0)] Principal),
}

pub struct IdGenerator {
    counters: Tree,
}

/// A reserved id plus the counter writes that make the reservation stick.
#[derive(Debug)]
pub struct Reservation {
    pub id: ReportId,
    sequence: (Vec<u8>, Vec<u8>),
    submissions: (Vec<u8>, Vec<u8>),
}

fn read_count(
    counters: &TransactionalTree,
    key: &[u8],
) -> ConflictableTransactionResult<u64, LedgerError> {
    match counters.get(key)? {
        Some(bytes) => abortable(minicbor::decode::<u64>(&bytes)),
        None => Ok(0),
    }
}

impl IdGenerator {
    pub fn open(db: &Db) -> Result<Self, LedgerError> {
        Ok(Self {
            counters: db.open_tree(COUNTERS)?,
        })
    }

    pub(crate) fn tree(&self) -> &Tree {
        &self.counters
    }

    fn count(&self, key: &CounterKey) -> Result<u64, LedgerError> {
        let key = minicbor::to_vec(key)?;
        Ok(store::read::<u64>(&self.counters, &key)?.unwrap_or(0))
    }

    /// Number of reports `principal` has successfully submitted.
    pub fn user_report_count(&self, principal: &Principal) -> Result<u64, LedgerError> {
        self.count(&CounterKey::Submissions(principal.clone()))
    }

    /// Total reports issued by this ledger; also the last id handed out.
    pub fn issued(&self) -> Result<u64, LedgerError> {
        self.count(&CounterKey::Sequence)
    }

    /// Reserve the next id for `caller` from within a transaction over the
    /// counters tree. Nothing is written until the reservation is applied.
    pub fn reserve(
        counters: &TransactionalTree,
        caller: &Principal,
    ) -> ConflictableTransactionResult<Reservation, LedgerError> {
        let sequence_key = abortable(minicbor::to_vec(&CounterKey::Sequence))?;
        let submissions_key = abortable(minicbor::to_vec(&CounterKey::Submissions(
            caller.clone(),
        )))?;

        let next = read_count(counters, &sequence_key)?
            .checked_add(1)
            .ok_or_else(|| {
                ConflictableTransactionError::Abort(LedgerError::AlreadyExists(
                    "report id sequence exhausted".into(),
                ))
            })?;
        let submitted = read_count(counters, &submissions_key)?.saturating_add(1);

        Ok(Reservation {
            id: ReportId(next),
            sequence: (sequence_key, abortable(minicbor::to_vec(next))?),
            submissions: (submissions_key, abortable(minicbor::to_vec(submitted))?),
        })
    }
}

impl Reservation {
    pub(crate) fn apply(
        &self,
        counters: &TransactionalTree,
    ) -> Result<(), UnabortableTransactionError> {
        counters.insert(self.sequence.0.as_slice(), self.sequence.1.as_slice())?;
        counters.insert(self.submissions.0.as_slice(), self.submissions.1.as_slice())?;
        Ok(())
    }
}
