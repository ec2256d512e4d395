//! Ledger error types.

use agora_core::DepositStatus;
use thiserror::Error;

/// Rejections raised by account mutations. All are user-fixable
/// validation or state conflicts; none leave the account modified.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("Price must be positive, got {0}")]
    InvalidPrice(i64),

    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("No holding in {0}")]
    UnknownHolding(String),

    #[error("Insufficient quantity: requested {requested}, holding {held}")]
    InsufficientQuantity { requested: i64, held: i64 },

    #[error("Invalid deposit amount {amount}: must be between 1 and {cap}")]
    InvalidAmount { amount: i64, cap: i64 },

    #[error("Deposit {0} not found")]
    DepositNotFound(i64),

    #[error("Deposit {id} already resolved as {status}")]
    DepositAlreadyResolved { id: i64, status: DepositStatus },
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
