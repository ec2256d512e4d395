//! Read-side aggregations: wealth ranking and per-instrument stats.
//!
//! Pure functions over the two documents; no mutation, no gate. Cost is
//! O(accounts × instruments), fine at document-store scale.

use agora_core::{Account, MarketSnapshot};
use agora_store::AccountMap;
use rust_decimal::Decimal;
use serde::Serialize;

/// One row of the wealth leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub display_name: String,
    pub balance: i64,
    /// Holdings marked to the current quotes.
    pub portfolio_value: i64,
    pub total_wealth: i64,
    pub holdings_count: usize,
}

/// Crowd-interest tier for an instrument, by distinct investor count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandTier {
    Low,
    High,
    VeryHigh,
}

impl DemandTier {
    fn from_investors(investors: usize) -> Self {
        if investors > 5 {
            Self::VeryHigh
        } else if investors > 0 {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// Aggregate holdings across all accounts for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentStats {
    pub symbol: String,
    pub name: String,
    pub current_price: i64,
    pub investors: usize,
    pub quantity_held: i64,
    pub total_invested: Decimal,
    pub demand: DemandTier,
}

fn portfolio_value(account: &Account, snapshot: &MarketSnapshot) -> i64 {
    account
        .holdings
        .values()
        .map(|h| {
            snapshot
                .instrument(&h.symbol)
                .map(|i| i.price * h.quantity)
                .unwrap_or(0)
        })
        .sum()
}

/// Leaderboard by total wealth (balance plus marked holdings), richest
/// first. Ties break on display name so the order is stable.
pub fn rank_accounts(accounts: &AccountMap, snapshot: &MarketSnapshot) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = accounts
        .values()
        .map(|account| {
            let portfolio = portfolio_value(account, snapshot);
            RankingEntry {
                display_name: account.display_name.clone(),
                balance: account.balance,
                portfolio_value: portfolio,
                total_wealth: account.balance + portfolio,
                holdings_count: account.holdings.len(),
            }
        })
        .collect();
    entries.sort_by(|a, b| {
        b.total_wealth
            .cmp(&a.total_wealth)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    entries
}

/// Per-instrument aggregates across every account, in roster order.
pub fn instrument_stats(accounts: &AccountMap, snapshot: &MarketSnapshot) -> Vec<InstrumentStats> {
    snapshot
        .instruments
        .iter()
        .map(|inst| {
            let mut investors = 0;
            let mut quantity_held = 0;
            let mut total_invested = Decimal::ZERO;
            for account in accounts.values() {
                if let Some(holding) = account.holdings.get(&inst.symbol) {
                    investors += 1;
                    quantity_held += holding.quantity;
                    total_invested += holding.total_invested;
                }
            }
            InstrumentStats {
                symbol: inst.symbol.clone(),
                name: inst.name.clone(),
                current_price: inst.price,
                investors,
                quantity_held,
                total_invested,
                demand: DemandTier::from_investors(investors),
            }
        })
        .collect()
}
