//! Trading orchestration for the Agora simulator.
//!
//! [`TradingService`] is the single mutation path: every write takes the
//! global write gate, computes the change against a consistent read of
//! both stores, then persists. The ranking and stats aggregations in
//! [`ranking`] are pure read-side functions over the same documents.

pub mod error;
pub mod ranking;
pub mod trading;

pub use error::{ServiceError, ServiceResult};
pub use ranking::{instrument_stats, rank_accounts, DemandTier, InstrumentStats, RankingEntry};
pub use trading::{QueuedDeposit, TradeOutcome, TradingService};
