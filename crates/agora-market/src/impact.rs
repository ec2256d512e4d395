//! Market-impact engine.
//!
//! A single trade moves the traded instrument's price immediately,
//! proportionally to the trade's share of estimated liquidity
//! (`volume * price`), bounded to [0.1%, 5%] so no single order can shock
//! the price. Buys push the price up, sells push it down. The move is a
//! trade reaction, not a scheduled revaluation, and never touches the
//! revaluation clock.

use agora_core::{Instrument, OrderSide, PriceImpact, MIN_PRICE};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Lower bound on the applied impact, percent of pre-trade price.
const MIN_IMPACT_PCT: Decimal = dec!(0.1);
/// Upper bound on the applied impact, percent of pre-trade price.
const MAX_IMPACT_PCT: Decimal = dec!(5.0);

/// Apply the price impact of one trade to the instrument set.
///
/// Returns `None` when the symbol is absent (silent no-op, not an error)
/// or the instrument has no positive capitalization. On success the
/// instrument is mutated in place and the realized delta is returned.
pub fn apply_impact(
    instruments: &mut [Instrument],
    symbol: &str,
    quantity: i64,
    side: OrderSide,
) -> Option<PriceImpact> {
    let inst = instruments.iter_mut().find(|i| i.symbol == symbol)?;

    let market_cap = inst.market_cap();
    if market_cap <= 0 || quantity <= 0 {
        return None;
    }

    let tx_value = Decimal::from(quantity) * Decimal::from(inst.price);
    let raw_pct = tx_value / Decimal::from(market_cap) * dec!(100);
    let impact_pct = raw_pct.clamp(MIN_IMPACT_PCT, MAX_IMPACT_PCT);
    let signed_pct = match side {
        OrderSide::Buy => impact_pct,
        OrderSide::Sell => -impact_pct,
    };

    let scaled = Decimal::from(inst.price) * (Decimal::ONE + signed_pct / dec!(100));
    let new_price = scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(MIN_PRICE)
        .max(MIN_PRICE);

    let previous_price = inst.price;
    inst.apply_price(new_price);
    // Trading interest shows up as volume as well.
    inst.volume += quantity * 100;

    Some(PriceImpact {
        symbol: inst.symbol.clone(),
        previous_price,
        new_price: inst.price,
        impact_percent: signed_pct.to_f64().unwrap_or(0.0),
    })
}
