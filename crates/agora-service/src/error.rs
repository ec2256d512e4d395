//! Service error taxonomy.
//!
//! Every failure a caller can see falls into one of five buckets, which
//! the HTTP boundary maps to status codes one-to-one. Ledger rejections
//! fold into this taxonomy here so handlers never match on crate-internal
//! error shapes.

use agora_ledger::LedgerError;
use agora_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller-fixable input or state problem (bad quantity, insufficient
    /// funds, amount out of bounds).
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist (account, instrument, deposit).
    #[error("{0}")]
    NotFound(String),

    /// Caller is not allowed to perform the operation.
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Operation already happened; repeating it is an error, not a retry.
    #[error("{0}")]
    Conflict(String),

    /// Persistence failed. The operation aborted with no partial state.
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl From<LedgerError> for ServiceError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DepositNotFound(_) => Self::NotFound(e.to_string()),
            LedgerError::DepositAlreadyResolved { .. } => Self::Conflict(e.to_string()),
            _ => Self::Validation(e.to_string()),
        }
    }
}

/// Result type alias for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
