//! Deposit-approval workflow records.
//!
//! A deposit request enters the account's queue as `Pending` and
//! transitions exactly once, to `Approved` (credits the balance) or
//! `Rejected` (terminal, no balance effect). Resolved records are
//! immutable; the transition guard lives in `agora-ledger`.

use crate::identity::CallerIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a deposit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A balance-credit request awaiting administrator resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDeposit {
    /// Epoch-millis-derived id, unique within the account's queue.
    pub id: i64,
    pub amount: i64,
    pub requested_at: DateTime<Utc>,
    pub status: DepositStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolved_by: Option<CallerIdentity>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
}

impl PendingDeposit {
    /// Create a new pending request with a time-derived id.
    pub fn new(amount: i64, requested_at: DateTime<Utc>) -> Self {
        Self {
            id: requested_at.timestamp_millis(),
            amount,
            requested_at,
            status: DepositStatus::Pending,
            resolved_at: None,
            resolved_by: None,
            reason: None,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == DepositStatus::Pending
    }
}
