//! Trading service: the single mutation path over both documents.
//!
//! Every mutating operation serializes behind one write gate, reads a
//! consistent view of the market and account documents, applies the
//! change and persists. Orders touch both documents; the market snapshot
//! is written first and rolled back to its prior contents if the account
//! write fails, so a partial apply is never observable.

use crate::error::{ServiceError, ServiceResult};
use agora_core::{
    Account, CallerIdentity, Instrument, MarketSnapshot, OrderSide, PendingDeposit, PriceImpact,
};
use agora_ledger::{
    apply_buy, apply_immediate_deposit, apply_sell, request_deposit, resolve_deposit,
    DepositDecision, InitialBalancePolicy,
};
use agora_market::{
    apply_impact, generate_roster, next_grid_instant, revalue, ClockError, RevaluationHandler,
};
use agora_store::{AccountStore, MarketStore};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};

/// Result of a filled order: the updated account plus the realized
/// market move.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOutcome {
    pub account: Account,
    pub price_impact: Option<PriceImpact>,
}

/// A pending deposit joined with its owning account, for the admin queue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedDeposit {
    pub account_id: String,
    pub display_name: String,
    #[serde(flatten)]
    pub deposit: PendingDeposit,
}

pub struct TradingService {
    market_store: Arc<dyn MarketStore>,
    account_store: Arc<dyn AccountStore>,
    policy: InitialBalancePolicy,
    deposit_cap: i64,
    grid_interval: Duration,
    admin_identities: HashSet<String>,
    write_gate: Mutex<()>,
}

impl TradingService {
    pub fn new(
        market_store: Arc<dyn MarketStore>,
        account_store: Arc<dyn AccountStore>,
        policy: InitialBalancePolicy,
        deposit_cap: i64,
        grid_interval: Duration,
        admin_identities: Vec<String>,
    ) -> Self {
        Self {
            market_store,
            account_store,
            policy,
            deposit_cap,
            grid_interval,
            admin_identities: admin_identities.into_iter().collect(),
            write_gate: Mutex::new(()),
        }
    }

    pub fn is_admin(&self, identity: &CallerIdentity) -> bool {
        self.admin_identities.contains(identity.as_str())
    }

    fn require_admin(&self, identity: &CallerIdentity) -> ServiceResult<()> {
        if self.is_admin(identity) {
            Ok(())
        } else {
            Err(ServiceError::Authorization(format!(
                "{identity} is not an administrator"
            )))
        }
    }

    /// Load the market snapshot, generating and persisting a fresh roster
    /// the first time the simulator runs. Caller holds the write gate.
    fn load_market_or_init(&self, now: DateTime<Utc>) -> ServiceResult<MarketSnapshot> {
        if let Some(snapshot) = self.market_store.load()? {
            return Ok(snapshot);
        }
        let mut rng = StdRng::from_os_rng();
        let instruments = generate_roster(&mut rng);
        info!(instruments = instruments.len(), "Generated initial market roster");
        let snapshot =
            MarketSnapshot::new(instruments, now, next_grid_instant(now, self.grid_interval));
        self.market_store.replace(&snapshot)?;
        Ok(snapshot)
    }

    fn not_found_account(identity: &str) -> ServiceError {
        ServiceError::NotFound(format!("No account for identity {identity}"))
    }

    /// Register or refresh the caller's account.
    ///
    /// First sight creates the account under the configured initial-balance
    /// policy, defaulting the display name to `Investor_<n>`. Repeat calls
    /// refresh `last_seen_at` and optionally rename.
    pub fn identify(
        &self,
        identity: &CallerIdentity,
        display_name: Option<String>,
    ) -> ServiceResult<Account> {
        let _gate = self.write_gate.lock();
        let now = Utc::now();
        let mut accounts = self.account_store.load()?;

        let key = identity.as_str().to_string();
        match accounts.get_mut(&key) {
            Some(account) => {
                account.last_seen_at = now;
                if let Some(name) = display_name {
                    account.display_name = name;
                }
            }
            None => {
                let name =
                    display_name.unwrap_or_else(|| format!("Investor_{}", accounts.len() + 1));
                info!(identity = %identity, name = %name, "Registering account");
                accounts.insert(
                    key.clone(),
                    Account::new(identity.clone(), name, self.policy.starting_balance(), now),
                );
            }
        }

        self.account_store.replace(&accounts)?;
        accounts
            .remove(&key)
            .ok_or_else(|| Self::not_found_account(&key))
    }

    /// Fetch the caller's account, refreshing `last_seen_at`.
    pub fn account(&self, identity: &CallerIdentity) -> ServiceResult<Account> {
        let _gate = self.write_gate.lock();
        let mut accounts = self.account_store.load()?;
        let account = accounts
            .get_mut(identity.as_str())
            .ok_or_else(|| Self::not_found_account(identity.as_str()))?;
        account.last_seen_at = Utc::now();
        let updated = account.clone();
        self.account_store.replace(&accounts)?;
        Ok(updated)
    }

    /// Current market snapshot, initializing the roster on first call.
    pub fn market(&self) -> ServiceResult<MarketSnapshot> {
        let _gate = self.write_gate.lock();
        self.load_market_or_init(Utc::now())
    }

    /// Replace the full instrument set (administrators only).
    pub fn replace_market(
        &self,
        identity: &CallerIdentity,
        instruments: Vec<Instrument>,
    ) -> ServiceResult<MarketSnapshot> {
        self.require_admin(identity)?;
        let _gate = self.write_gate.lock();
        let now = Utc::now();
        let snapshot =
            MarketSnapshot::new(instruments, now, next_grid_instant(now, self.grid_interval));
        self.market_store.replace(&snapshot)?;
        info!(identity = %identity, instruments = snapshot.instruments.len(), "Market replaced");
        Ok(snapshot)
    }

    pub fn buy(
        &self,
        identity: &CallerIdentity,
        symbol: &str,
        quantity: i64,
        price: i64,
    ) -> ServiceResult<TradeOutcome> {
        self.execute_order(identity, symbol, quantity, price, OrderSide::Buy)
    }

    pub fn sell(
        &self,
        identity: &CallerIdentity,
        symbol: &str,
        quantity: i64,
        price: i64,
    ) -> ServiceResult<TradeOutcome> {
        self.execute_order(identity, symbol, quantity, price, OrderSide::Sell)
    }

    /// Fill an order at the caller-sent price, then move the quote by the
    /// trade's market impact. The impact is sized off the instrument's
    /// current quote, not the fill price, and the revaluation clock is
    /// left untouched.
    fn execute_order(
        &self,
        identity: &CallerIdentity,
        symbol: &str,
        quantity: i64,
        price: i64,
        side: OrderSide,
    ) -> ServiceResult<TradeOutcome> {
        let _gate = self.write_gate.lock();
        let now = Utc::now();

        let prior = self.load_market_or_init(now)?;
        if prior.instrument(symbol).is_none() {
            return Err(ServiceError::NotFound(format!(
                "Unknown instrument {symbol}"
            )));
        }

        let mut accounts = self.account_store.load()?;
        let account = accounts
            .get_mut(identity.as_str())
            .ok_or_else(|| Self::not_found_account(identity.as_str()))?;

        match side {
            OrderSide::Buy => apply_buy(account, symbol, quantity, price, now)?,
            OrderSide::Sell => apply_sell(account, symbol, quantity, price, now)?,
        };
        let updated = account.clone();

        let mut snapshot = prior.clone();
        let price_impact = apply_impact(&mut snapshot.instruments, symbol, quantity, side);

        self.market_store.replace(&snapshot)?;
        if let Err(e) = self.account_store.replace(&accounts) {
            // Undo the market write so the two documents stay consistent.
            if let Err(undo) = self.market_store.replace(&prior) {
                error!(error = %undo, "Failed to roll back market document");
            }
            return Err(e.into());
        }

        info!(
            identity = %identity,
            side = %side,
            symbol,
            quantity,
            price,
            "Order filled"
        );
        Ok(TradeOutcome {
            account: updated,
            price_impact,
        })
    }

    /// Deposit request. Under the immediate-credit policy the balance is
    /// credited right away; otherwise the request queues for an
    /// administrator.
    pub fn request_deposit(
        &self,
        identity: &CallerIdentity,
        amount: i64,
    ) -> ServiceResult<Account> {
        let _gate = self.write_gate.lock();
        let now = Utc::now();
        let mut accounts = self.account_store.load()?;
        let account = accounts
            .get_mut(identity.as_str())
            .ok_or_else(|| Self::not_found_account(identity.as_str()))?;

        if self.policy.credits_immediately() {
            apply_immediate_deposit(account, amount, self.deposit_cap, now)?;
        } else {
            let id = request_deposit(account, amount, self.deposit_cap, now)?;
            info!(identity = %identity, amount, deposit_id = id, "Deposit queued for approval");
        }

        let updated = account.clone();
        self.account_store.replace(&accounts)?;
        Ok(updated)
    }

    /// All still-pending deposits across every account (administrators
    /// only), oldest first.
    pub fn pending_deposits(&self, identity: &CallerIdentity) -> ServiceResult<Vec<QueuedDeposit>> {
        self.require_admin(identity)?;
        let accounts = self.account_store.load()?;

        let mut queue: Vec<QueuedDeposit> = accounts
            .values()
            .flat_map(|account| {
                account
                    .pending_deposits
                    .iter()
                    .filter(|d| d.is_pending())
                    .map(|d| QueuedDeposit {
                        account_id: account.identity.as_str().to_string(),
                        display_name: account.display_name.clone(),
                        deposit: d.clone(),
                    })
            })
            .collect();
        queue.sort_by_key(|q| q.deposit.requested_at);
        Ok(queue)
    }

    /// Resolve one pending deposit (administrators only). Approval credits
    /// the target account; rejection stamps the reason. Either way the
    /// deposit becomes immutable.
    pub fn resolve_deposit(
        &self,
        identity: &CallerIdentity,
        account_id: &str,
        deposit_id: i64,
        decision: DepositDecision,
        reason: Option<String>,
    ) -> ServiceResult<Account> {
        self.require_admin(identity)?;
        let _gate = self.write_gate.lock();
        let now = Utc::now();
        let mut accounts = self.account_store.load()?;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| Self::not_found_account(account_id))?;

        resolve_deposit(account, deposit_id, decision, identity, reason, now)?;
        let updated = account.clone();
        self.account_store.replace(&accounts)?;
        info!(identity = %identity, account_id, deposit_id, ?decision, "Deposit resolved");
        Ok(updated)
    }

    /// Wealth leaderboard over all accounts at current quotes.
    pub fn ranking(&self) -> ServiceResult<Vec<crate::ranking::RankingEntry>> {
        let snapshot = self.market()?;
        let accounts = self.account_store.load()?;
        Ok(crate::ranking::rank_accounts(&accounts, &snapshot))
    }

    /// Per-instrument holding aggregates over all accounts.
    pub fn stats(&self) -> ServiceResult<Vec<crate::ranking::InstrumentStats>> {
        let snapshot = self.market()?;
        let accounts = self.account_store.load()?;
        Ok(crate::ranking::instrument_stats(&accounts, &snapshot))
    }

    /// One revaluation cycle: random-walk every quote and persist the
    /// snapshot with a freshly grid-aligned `next_update_at`.
    pub fn revaluation_tick(&self, now: DateTime<Utc>) -> ServiceResult<MarketSnapshot> {
        let _gate = self.write_gate.lock();
        let prior = self.load_market_or_init(now)?;

        let mut rng = StdRng::from_os_rng();
        let instruments = revalue(&mut rng, &prior.instruments);
        let snapshot =
            MarketSnapshot::new(instruments, now, next_grid_instant(now, self.grid_interval));
        self.market_store.replace(&snapshot)?;
        info!(
            instruments = snapshot.instruments.len(),
            next = %snapshot.next_update_at,
            "Market revalued"
        );
        Ok(snapshot)
    }
}

impl RevaluationHandler for TradingService {
    fn on_tick(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClockError> {
        let snapshot = self
            .revaluation_tick(now)
            .map_err(|e| ClockError::Tick(e.to_string()))?;
        Ok(snapshot.next_update_at)
    }

    fn scheduled_next(&self) -> Option<DateTime<Utc>> {
        self.market_store
            .load()
            .ok()
            .flatten()
            .map(|s| s.next_update_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_store::{MemoryAccountStore, MemoryMarketStore};
    use rust_decimal_macros::dec;

    fn identity(s: &str) -> CallerIdentity {
        CallerIdentity::new(s).unwrap()
    }

    fn snapshot_with(instruments: Vec<Instrument>) -> MarketSnapshot {
        let now = Utc::now();
        MarketSnapshot::new(instruments, now, next_grid_instant(now, Duration::minutes(10)))
    }

    struct Harness {
        market: Arc<MemoryMarketStore>,
        accounts: Arc<MemoryAccountStore>,
        service: TradingService,
    }

    fn harness(policy: InitialBalancePolicy) -> Harness {
        let market = Arc::new(MemoryMarketStore::new());
        let accounts = Arc::new(MemoryAccountStore::new());
        market
            .replace(&snapshot_with(vec![
                Instrument::listed("VALMI", "Valdrian Mines", "Valdria", "Mining", 100, 10_000),
                Instrument::listed("OSTTR", "Ostmark Trading", "Ostmark", "Trade", 50, 500_000),
            ]))
            .unwrap();
        let service = TradingService::new(
            market.clone(),
            accounts.clone(),
            policy,
            100_000,
            Duration::minutes(10),
            vec!["admin-1".into()],
        );
        Harness {
            market,
            accounts,
            service,
        }
    }

    #[test]
    fn test_identify_creates_account_with_default_name() {
        let h = harness(InitialBalancePolicy::default());
        let account = h.service.identify(&identity("caller-1"), None).unwrap();

        assert_eq!(account.display_name, "Investor_1");
        assert_eq!(account.balance, 10_000);

        let second = h
            .service
            .identify(&identity("caller-2"), Some("Kestrel".into()))
            .unwrap();
        assert_eq!(second.display_name, "Kestrel");
        assert_eq!(h.accounts.load().unwrap().len(), 2);
    }

    #[test]
    fn test_identify_is_idempotent_for_known_identity() {
        let h = harness(InitialBalancePolicy::default());
        let first = h.service.identify(&identity("caller-1"), None).unwrap();
        let again = h.service.identify(&identity("caller-1"), None).unwrap();

        assert_eq!(again.balance, first.balance);
        assert!(again.last_seen_at >= first.last_seen_at);
        assert_eq!(h.accounts.load().unwrap().len(), 1);
    }

    #[test]
    fn test_account_for_unknown_identity_is_not_found() {
        let h = harness(InitialBalancePolicy::default());
        let err = h.service.account(&identity("ghost")).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_buy_charges_sent_price_and_moves_quote() {
        let h = harness(InitialBalancePolicy::default());
        let caller = identity("caller-1");
        h.service.identify(&caller, None).unwrap();

        // VALMI: price 100, volume 10_000 → cap 1_000_000; 50 shares is
        // 5_000 / 1_000_000 = 0.5% impact → new price 101.
        let outcome = h.service.buy(&caller, "VALMI", 50, 100).unwrap();

        assert_eq!(outcome.account.balance, 10_000 - 5_000);
        assert_eq!(outcome.account.holdings["VALMI"].quantity, 50);
        let impact = outcome.price_impact.unwrap();
        assert_eq!(impact.previous_price, 100);
        assert_eq!(impact.new_price, 101);

        let persisted = h.market.load().unwrap().unwrap();
        assert_eq!(persisted.instrument("VALMI").unwrap().price, 101);
        assert_eq!(persisted.instrument("VALMI").unwrap().volume, 15_000);
        let stored = &h.accounts.load().unwrap()["caller-1"];
        assert_eq!(stored.balance, 5_000);
    }

    #[test]
    fn test_fill_price_is_callers_not_the_quote() {
        let h = harness(InitialBalancePolicy::default());
        let caller = identity("caller-1");
        h.service.identify(&caller, None).unwrap();

        // Cost uses the sent price (90), impact still sizes off the
        // quote (100).
        let outcome = h.service.buy(&caller, "VALMI", 50, 90).unwrap();

        assert_eq!(outcome.account.balance, 10_000 - 4_500);
        assert_eq!(outcome.account.holdings["VALMI"].avg_price, dec!(90));
        let impact = outcome.price_impact.unwrap();
        assert_eq!(impact.previous_price, 100);
        assert_eq!(impact.new_price, 101);
    }

    #[test]
    fn test_order_leaves_revaluation_clock_untouched() {
        let h = harness(InitialBalancePolicy::default());
        let caller = identity("caller-1");
        h.service.identify(&caller, None).unwrap();
        let before = h.market.load().unwrap().unwrap();

        h.service.buy(&caller, "VALMI", 50, 100).unwrap();
        h.service.sell(&caller, "VALMI", 20, 100).unwrap();

        let after = h.market.load().unwrap().unwrap();
        assert_eq!(after.last_update_at, before.last_update_at);
        assert_eq!(after.next_update_at, before.next_update_at);
    }

    #[test]
    fn test_sell_round_trip_restores_balance() {
        let h = harness(InitialBalancePolicy::default());
        let caller = identity("caller-1");
        h.service.identify(&caller, None).unwrap();

        h.service.buy(&caller, "OSTTR", 10, 50).unwrap();
        let outcome = h.service.sell(&caller, "OSTTR", 10, 50).unwrap();

        assert_eq!(outcome.account.balance, 10_000);
        assert!(outcome.account.holdings.is_empty());
        let impact = outcome.price_impact.unwrap();
        assert!(impact.new_price <= impact.previous_price);
    }

    #[test]
    fn test_order_for_unknown_symbol_is_not_found() {
        let h = harness(InitialBalancePolicy::default());
        let caller = identity("caller-1");
        h.service.identify(&caller, None).unwrap();

        let err = h.service.buy(&caller, "NOPE", 1, 100).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_insufficient_funds_is_validation() {
        let h = harness(InitialBalancePolicy::default());
        let caller = identity("caller-1");
        h.service.identify(&caller, None).unwrap();

        let err = h.service.buy(&caller, "VALMI", 200, 100).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_non_positive_sent_price_is_validation() {
        let h = harness(InitialBalancePolicy::default());
        let caller = identity("caller-1");
        h.service.identify(&caller, None).unwrap();

        let err = h.service.buy(&caller, "VALMI", 1, 0).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_failed_account_persist_rolls_back_market() {
        let h = harness(InitialBalancePolicy::default());
        let caller = identity("caller-1");
        h.service.identify(&caller, None).unwrap();
        let before = h.market.load().unwrap().unwrap();

        h.accounts.fail_next_replace();
        let err = h.service.buy(&caller, "VALMI", 50, 100).unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));

        // Neither document moved.
        assert_eq!(h.market.load().unwrap().unwrap(), before);
        assert_eq!(h.accounts.load().unwrap()["caller-1"].balance, 10_000);
    }

    #[test]
    fn test_immediate_policy_credits_deposit() {
        let h = harness(InitialBalancePolicy::default());
        let caller = identity("caller-1");
        h.service.identify(&caller, None).unwrap();

        let account = h.service.request_deposit(&caller, 2_500).unwrap();
        assert_eq!(account.balance, 12_500);
        assert!(account.pending_deposits.is_empty());
    }

    #[test]
    fn test_approval_policy_queues_then_credits_on_approve() {
        let h = harness(InitialBalancePolicy::RequiresApproval);
        let caller = identity("caller-1");
        let admin = identity("admin-1");
        h.service.identify(&caller, None).unwrap();

        let account = h.service.request_deposit(&caller, 5_000).unwrap();
        assert_eq!(account.balance, 0);
        assert_eq!(account.pending_deposits.len(), 1);
        let deposit_id = account.pending_deposits[0].id;

        let queue = h.service.pending_deposits(&admin).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].account_id, "caller-1");

        let resolved = h
            .service
            .resolve_deposit(&admin, "caller-1", deposit_id, DepositDecision::Approve, None)
            .unwrap();
        assert_eq!(resolved.balance, 5_000);

        // Resolved deposits leave the queue; a second resolve conflicts.
        assert!(h.service.pending_deposits(&admin).unwrap().is_empty());
        let err = h
            .service
            .resolve_deposit(&admin, "caller-1", deposit_id, DepositDecision::Approve, None)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn test_admin_routes_reject_non_admin() {
        let h = harness(InitialBalancePolicy::RequiresApproval);
        let caller = identity("caller-1");
        h.service.identify(&caller, None).unwrap();

        assert!(matches!(
            h.service.pending_deposits(&caller).unwrap_err(),
            ServiceError::Authorization(_)
        ));
        assert!(matches!(
            h.service
                .resolve_deposit(&caller, "caller-1", 1, DepositDecision::Approve, None)
                .unwrap_err(),
            ServiceError::Authorization(_)
        ));
        assert!(matches!(
            h.service.replace_market(&caller, Vec::new()).unwrap_err(),
            ServiceError::Authorization(_)
        ));
    }

    #[test]
    fn test_market_bootstraps_roster_when_empty() {
        let market = Arc::new(MemoryMarketStore::new());
        let accounts = Arc::new(MemoryAccountStore::new());
        let service = TradingService::new(
            market.clone(),
            accounts,
            InitialBalancePolicy::default(),
            100_000,
            Duration::minutes(10),
            Vec::new(),
        );

        let snapshot = service.market().unwrap();
        assert!(!snapshot.instruments.is_empty());
        assert!(snapshot.next_update_at > Utc::now());
        // Persisted, so the next call serves the same roster.
        assert_eq!(market.load().unwrap().unwrap(), snapshot);
    }

    #[test]
    fn test_revaluation_tick_advances_clock_and_respects_bounds() {
        let h = harness(InitialBalancePolicy::default());
        let now = Utc::now();
        let before = h.market.load().unwrap().unwrap();
        let snapshot = h.service.revaluation_tick(now).unwrap();

        assert_eq!(snapshot.last_update_at, now);
        assert_eq!(
            snapshot.next_update_at,
            next_grid_instant(now, Duration::minutes(10))
        );
        for (old, new) in before.instruments.iter().zip(&snapshot.instruments) {
            assert_eq!(old.symbol, new.symbol);
            assert!(new.price >= 1);
            let max_step = (old.price as f64 * 0.08).ceil() as i64 + 1;
            assert!((new.price - old.price).abs() <= max_step);
        }
        assert_eq!(h.market.load().unwrap().unwrap(), snapshot);
    }

    #[test]
    fn test_scheduled_next_reflects_persisted_snapshot() {
        let h = harness(InitialBalancePolicy::default());
        let persisted = h.market.load().unwrap().unwrap();
        assert_eq!(h.service.scheduled_next(), Some(persisted.next_update_at));
    }
}
