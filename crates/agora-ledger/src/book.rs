//! Buy/sell application with weighted-average cost basis.

use crate::error::{LedgerError, Result};
use agora_core::{Account, Holding, Transaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Apply a buy to the account: debit `quantity * price`, accumulate the
/// holding at weighted-average cost, record the transaction.
///
/// Fails without touching the account if the quantity or price is
/// non-positive or the balance cannot cover the cost. Returns the cost.
pub fn apply_buy(
    account: &mut Account,
    symbol: &str,
    quantity: i64,
    price: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    if quantity <= 0 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    if price <= 0 {
        return Err(LedgerError::InvalidPrice(price));
    }
    let cost = quantity
        .checked_mul(price)
        .ok_or(LedgerError::InvalidQuantity(quantity))?;
    if account.balance < cost {
        return Err(LedgerError::InsufficientFunds {
            needed: cost,
            available: account.balance,
        });
    }

    account.balance -= cost;

    match account.holdings.get_mut(symbol) {
        Some(holding) => {
            holding.quantity += quantity;
            holding.total_invested += Decimal::from(cost);
            holding.avg_price = holding.total_invested / Decimal::from(holding.quantity);
        }
        None => {
            account.holdings.insert(
                symbol.to_string(),
                Holding {
                    symbol: symbol.to_string(),
                    quantity,
                    avg_price: Decimal::from(price),
                    total_invested: Decimal::from(cost),
                    acquired_at: now,
                },
            );
        }
    }

    account.record(Transaction::buy(symbol, quantity, price, cost, now));
    Ok(cost)
}

/// Apply a sell to the account: credit `quantity * price`, reduce the
/// holding and its invested capital proportionally, record the
/// transaction. The holding is removed once its quantity reaches zero.
///
/// Fails without touching the account if the holding is absent or too
/// small. Returns the proceeds.
pub fn apply_sell(
    account: &mut Account,
    symbol: &str,
    quantity: i64,
    price: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    if quantity <= 0 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    if price <= 0 {
        return Err(LedgerError::InvalidPrice(price));
    }

    let holding = account
        .holdings
        .get_mut(symbol)
        .ok_or_else(|| LedgerError::UnknownHolding(symbol.to_string()))?;
    if quantity > holding.quantity {
        return Err(LedgerError::InsufficientQuantity {
            requested: quantity,
            held: holding.quantity,
        });
    }

    let proceeds = quantity
        .checked_mul(price)
        .ok_or(LedgerError::InvalidQuantity(quantity))?;

    account.balance += proceeds;
    holding.quantity -= quantity;
    holding.total_invested =
        (holding.total_invested - holding.avg_price * Decimal::from(quantity)).max(Decimal::ZERO);

    if holding.quantity == 0 {
        account.holdings.remove(symbol);
    }

    account.record(Transaction::sell(symbol, quantity, price, proceeds, now));
    Ok(proceeds)
}
