//! Deposit request and resolution.
//!
//! Requests enqueue a `PendingDeposit`; resolution transitions it exactly
//! once. A second resolution attempt is a conflict error, never a double
//! credit, regardless of caller interleaving (the service serializes
//! mutations, this module enforces the state guard).

use crate::error::{LedgerError, Result};
use agora_core::account::ApprovalMeta;
use agora_core::{Account, CallerIdentity, PendingDeposit, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Administrator decision on a pending deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositDecision {
    Approve,
    Reject,
}

fn check_amount(amount: i64, cap: i64) -> Result<()> {
    if amount <= 0 || amount > cap {
        return Err(LedgerError::InvalidAmount { amount, cap });
    }
    Ok(())
}

/// Enqueue a deposit request awaiting administrator resolution.
///
/// The id is epoch-millis-derived; bumped past any existing id so it stays
/// unique within the account's queue. Returns the id. No balance change.
pub fn request_deposit(
    account: &mut Account,
    amount: i64,
    cap: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    check_amount(amount, cap)?;

    let mut deposit = PendingDeposit::new(amount, now);
    while account.pending_deposits.iter().any(|d| d.id == deposit.id) {
        deposit.id += 1;
    }
    let id = deposit.id;
    account.pending_deposits.push(deposit);
    Ok(id)
}

/// Credit a deposit directly, bypassing the approval queue.
///
/// Used under the immediate-credit policy, where deployments do not run an
/// approval desk. Same amount bounds as the queued path.
pub fn apply_immediate_deposit(
    account: &mut Account,
    amount: i64,
    cap: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    check_amount(amount, cap)?;
    account.balance += amount;
    account.record(Transaction::deposit(amount, now, None));
    Ok(())
}

/// Resolve a pending deposit exactly once.
///
/// Approval credits the balance and appends a deposit transaction carrying
/// the approval metadata; rejection only stamps status and reason. Either
/// way the record becomes immutable and a repeat call fails with
/// `DepositAlreadyResolved`.
pub fn resolve_deposit(
    account: &mut Account,
    deposit_id: i64,
    decision: DepositDecision,
    resolved_by: &CallerIdentity,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<()> {
    let deposit = account
        .pending_deposits
        .iter_mut()
        .find(|d| d.id == deposit_id)
        .ok_or(LedgerError::DepositNotFound(deposit_id))?;

    if !deposit.is_pending() {
        return Err(LedgerError::DepositAlreadyResolved {
            id: deposit_id,
            status: deposit.status,
        });
    }

    deposit.resolved_at = Some(now);
    deposit.resolved_by = Some(resolved_by.clone());

    match decision {
        DepositDecision::Approve => {
            deposit.status = agora_core::DepositStatus::Approved;
            let amount = deposit.amount;
            account.balance += amount;
            account.record(Transaction::deposit(
                amount,
                now,
                Some(ApprovalMeta {
                    deposit_id,
                    resolved_by: resolved_by.clone(),
                }),
            ));
        }
        DepositDecision::Reject => {
            deposit.status = agora_core::DepositStatus::Rejected;
            deposit.reason = reason;
        }
    }

    Ok(())
}
