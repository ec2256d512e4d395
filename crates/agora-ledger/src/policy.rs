//! Initial-balance policy.
//!
//! Two deployment variants exist for new accounts: an immediate starting
//! credit, or a zero balance with every deposit routed through the
//! admin-approval queue. The choice is explicit configuration, never
//! implicit.

use serde::{Deserialize, Serialize};

/// Default starting credit under the immediate-credit policy.
pub const DEFAULT_STARTING_BALANCE: i64 = 10_000;

/// How a first-seen identity's account is funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum InitialBalancePolicy {
    /// Credit `amount` at registration; deposits credit immediately too.
    ImmediateCredit { amount: i64 },
    /// Start at zero; deposits await administrator approval.
    RequiresApproval,
}

impl Default for InitialBalancePolicy {
    fn default() -> Self {
        Self::ImmediateCredit {
            amount: DEFAULT_STARTING_BALANCE,
        }
    }
}

impl InitialBalancePolicy {
    /// Balance a freshly created account starts with.
    #[must_use]
    pub fn starting_balance(&self) -> i64 {
        match self {
            Self::ImmediateCredit { amount } => *amount,
            Self::RequiresApproval => 0,
        }
    }

    /// Whether deposit requests credit the balance without approval.
    #[must_use]
    pub fn credits_immediately(&self) -> bool {
        matches!(self, Self::ImmediateCredit { .. })
    }
}
