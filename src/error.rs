//! Typed failures returned by every ledger operation

/// The four domain failure codes, without their detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyExists,
    Unauthorized,
    InvalidParameter,
    NotFound,
    // host-level failures, outside the ledger's own contract
    Storage,
    Codec,
}

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("cbor codec error: {0}")]
    Codec(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            LedgerError::Unauthorized(_) => ErrorKind::Unauthorized,
            LedgerError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::Storage(_) => ErrorKind::Storage,
            LedgerError::Codec(_) => ErrorKind::Codec,
        }
    }
}

impl From<minicbor::decode::Error> for LedgerError {
    fn from(value: minicbor::decode::Error) -> Self {
        LedgerError::Codec(value.to_string())
    }
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for LedgerError {
    fn from(value: minicbor::encode::Error<E>) -> Self {
        LedgerError::Codec(value.to_string())
    }
}

impl From<sled::transaction::TransactionError<LedgerError>> for LedgerError {
    fn from(value: sled::transaction::TransactionError<LedgerError>) -> Self {
        match value {
            sled::transaction::TransactionError::Abort(err) => err,
            sled::transaction::TransactionError::Storage(err) => LedgerError::Storage(err),
        }
    }
}
