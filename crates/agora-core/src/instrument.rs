//! Tradable instruments and the persisted market unit.
//!
//! An `Instrument` is one synthetic company. Prices are integer gold
//! coins and never fall below [`MIN_PRICE`]. Instruments are created at
//! roster-generation time and never deleted; only the price model
//! (periodic revaluation) and the market-impact engine (on trade) mutate
//! them, and both do so through [`Instrument::apply_price`] so the
//! previous/change/high/low bookkeeping stays consistent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Floor for every instrument price, before and after any mutation.
pub const MIN_PRICE: i64 = 1;

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// One tradable synthetic company.
///
/// Invariants: `high >= price >= MIN_PRICE`, `low <= price`,
/// `price = previous_price + change`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Ticker symbol. Unique key in practice; collisions at roster
    /// generation are tolerated since tickers are display-oriented.
    pub symbol: String,
    pub name: String,
    pub country: String,
    pub sector: String,
    pub price: i64,
    pub previous_price: i64,
    pub change: i64,
    pub change_percent: f64,
    pub volume: i64,
    pub high: i64,
    pub low: i64,
}

impl Instrument {
    /// Create a freshly listed instrument at its initial quote.
    pub fn listed(
        symbol: impl Into<String>,
        name: impl Into<String>,
        country: impl Into<String>,
        sector: impl Into<String>,
        price: i64,
        volume: i64,
    ) -> Self {
        let price = price.max(MIN_PRICE);
        Self {
            symbol: symbol.into(),
            name: name.into(),
            country: country.into(),
            sector: sector.into(),
            price,
            previous_price: price,
            change: 0,
            change_percent: 0.0,
            volume,
            high: price,
            low: price,
        }
    }

    /// Move the quote to `new_price`, updating previous price, change,
    /// percent change, high and low in one step.
    ///
    /// Clamps at [`MIN_PRICE`]. Both the periodic revaluation and the
    /// market-impact engine go through here.
    pub fn apply_price(&mut self, new_price: i64) {
        let new_price = new_price.max(MIN_PRICE);
        self.previous_price = self.price;
        self.price = new_price;
        self.change = new_price - self.previous_price;
        self.change_percent =
            (new_price - self.previous_price) as f64 / self.previous_price as f64 * 100.0;
        self.high = self.high.max(new_price);
        self.low = self.low.min(new_price);
    }

    /// Estimated capitalization used for market-impact sizing.
    #[inline]
    pub fn market_cap(&self) -> i64 {
        self.volume * self.price
    }
}

/// Realized price movement caused by a single trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceImpact {
    pub symbol: String,
    pub previous_price: i64,
    pub new_price: i64,
    /// Signed applied impact, percent of pre-trade price.
    pub impact_percent: f64,
}

/// The persisted and served market unit.
///
/// `next_update_at` is always aligned to the revaluation grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub instruments: Vec<Instrument>,
    pub last_update_at: DateTime<Utc>,
    pub next_update_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new(
        instruments: Vec<Instrument>,
        last_update_at: DateTime<Utc>,
        next_update_at: DateTime<Utc>,
    ) -> Self {
        Self {
            instruments,
            last_update_at,
            next_update_at,
        }
    }

    /// Find an instrument by symbol.
    pub fn instrument(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Instrument {
        Instrument::listed("VALMI", "Valdrian Mines", "Valdria", "Mining", 100, 500_000)
    }

    #[test]
    fn test_listed_instrument_starts_flat() {
        let inst = sample();
        assert_eq!(inst.previous_price, 100);
        assert_eq!(inst.change, 0);
        assert_eq!(inst.high, 100);
        assert_eq!(inst.low, 100);
    }

    #[test]
    fn test_apply_price_updates_bookkeeping() {
        let mut inst = sample();
        inst.apply_price(110);
        assert_eq!(inst.previous_price, 100);
        assert_eq!(inst.price, 110);
        assert_eq!(inst.change, 10);
        assert!((inst.change_percent - 10.0).abs() < 1e-9);
        assert_eq!(inst.high, 110);
        assert_eq!(inst.low, 100);

        inst.apply_price(90);
        assert_eq!(inst.price, 90);
        assert_eq!(inst.change, -20);
        assert_eq!(inst.high, 110);
        assert_eq!(inst.low, 90);
        assert_eq!(inst.price, inst.previous_price + inst.change);
    }

    #[test]
    fn test_apply_price_clamps_at_floor() {
        let mut inst = sample();
        inst.apply_price(0);
        assert_eq!(inst.price, MIN_PRICE);
    }

    #[test]
    fn test_camel_case_wire_shape() {
        let inst = sample();
        let json = serde_json::to_value(&inst).unwrap();
        assert!(json.get("previousPrice").is_some());
        assert!(json.get("changePercent").is_some());
    }
}
