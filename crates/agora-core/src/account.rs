//! Per-identity account state.
//!
//! An account holds an integer gold-coin balance, a map of holdings keyed
//! by instrument symbol, a bounded most-recent-first transaction log and
//! the queue of pending deposit requests. Accounts are created on first
//! sight of an identity and never destroyed.
//!
//! Mutation rules (solvency, quantity invariants) live in `agora-ledger`;
//! this module only carries the state and the log-truncation discipline.

use crate::deposit::PendingDeposit;
use crate::identity::CallerIdentity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum retained transactions per account, most recent first.
pub const MAX_TRANSACTIONS: usize = 50;

/// Kind of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
    Deposit,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
            Self::Deposit => write!(f, "deposit"),
        }
    }
}

/// Approval metadata carried by deposit transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalMeta {
    pub deposit_id: i64,
    pub resolved_by: CallerIdentity,
}

/// Immutable record of one balance-affecting event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub kind: TransactionKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total: Option<i64>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub approval: Option<ApprovalMeta>,
}

impl Transaction {
    pub fn buy(symbol: &str, quantity: i64, price: i64, total: i64, at: DateTime<Utc>) -> Self {
        Self {
            kind: TransactionKind::Buy,
            symbol: Some(symbol.to_string()),
            quantity: Some(quantity),
            price: Some(price),
            amount: None,
            total: Some(total),
            timestamp: at,
            approval: None,
        }
    }

    pub fn sell(symbol: &str, quantity: i64, price: i64, total: i64, at: DateTime<Utc>) -> Self {
        Self {
            kind: TransactionKind::Sell,
            symbol: Some(symbol.to_string()),
            quantity: Some(quantity),
            price: Some(price),
            amount: None,
            total: Some(total),
            timestamp: at,
            approval: None,
        }
    }

    pub fn deposit(amount: i64, at: DateTime<Utc>, approval: Option<ApprovalMeta>) -> Self {
        Self {
            kind: TransactionKind::Deposit,
            symbol: None,
            quantity: None,
            price: None,
            amount: Some(amount),
            total: None,
            timestamp: at,
            approval,
        }
    }
}

/// An account's position in one instrument.
///
/// `avg_price = total_invested / quantity`, recomputed as a weighted
/// average on each additional buy of the same symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    pub quantity: i64,
    pub avg_price: Decimal,
    pub total_invested: Decimal,
    pub acquired_at: DateTime<Utc>,
}

/// Per-identity account state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub identity: CallerIdentity,
    pub display_name: String,
    pub balance: i64,
    /// Holdings keyed by symbol, one entry per held instrument.
    #[serde(default)]
    pub holdings: BTreeMap<String, Holding>,
    /// Bounded log, most recent first.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Ordered queue of deposit requests awaiting (or past) resolution.
    #[serde(default)]
    pub pending_deposits: Vec<PendingDeposit>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Account {
    /// Create an account for a first-seen identity.
    pub fn new(
        identity: CallerIdentity,
        display_name: impl Into<String>,
        starting_balance: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            identity,
            display_name: display_name.into(),
            balance: starting_balance,
            holdings: BTreeMap::new(),
            transactions: Vec::new(),
            pending_deposits: Vec::new(),
            created_at: now,
            last_seen_at: now,
        }
    }

    /// Prepend a transaction and truncate the log to [`MAX_TRANSACTIONS`].
    pub fn record(&mut self, tx: Transaction) {
        self.transactions.insert(0, tx);
        self.transactions.truncate(MAX_TRANSACTIONS);
    }
}
