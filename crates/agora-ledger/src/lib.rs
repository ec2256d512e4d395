//! Account bookkeeping for the Agora simulator.
//!
//! The ledger owns every rule that touches an account's balance or
//! holdings: buy/sell application with weighted-average cost basis, the
//! deposit request/resolve state machine and the initial-balance policy.
//! Functions here mutate a single `Account` in place and either succeed
//! completely or leave it untouched; orchestration across accounts and
//! market state lives in `agora-service`.

pub mod book;
pub mod deposit;
pub mod error;
pub mod policy;

pub use book::{apply_buy, apply_sell};
pub use deposit::{apply_immediate_deposit, request_deposit, resolve_deposit, DepositDecision};
pub use error::{LedgerError, Result};
pub use policy::InitialBalancePolicy;
