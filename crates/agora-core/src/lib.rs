//! Core domain types for the Agora market simulator.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Instrument`, `MarketSnapshot`: one tradable synthetic company and the
//!   persisted/served market unit
//! - `Account`, `Holding`, `Transaction`: per-identity bookkeeping state
//! - `PendingDeposit`: the deposit-approval workflow record
//! - `CallerIdentity`: opaque identity resolved by an external
//!   authentication collaborator

pub mod account;
pub mod deposit;
pub mod error;
pub mod identity;
pub mod instrument;

pub use account::{Account, Holding, Transaction, TransactionKind, MAX_TRANSACTIONS};
pub use deposit::{DepositStatus, PendingDeposit};
pub use error::{CoreError, Result};
pub use identity::CallerIdentity;
pub use instrument::{Instrument, MarketSnapshot, OrderSide, PriceImpact, MIN_PRICE};
