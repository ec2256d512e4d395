//! Roster generation and periodic revaluation.
//!
//! Both functions are pure over their inputs apart from the injected RNG:
//! same instrument list shape in, same shape out, no other side effects.
//! Callers pass a seedable `Rng` so tests run reproducibly.

use agora_core::{Instrument, MIN_PRICE};
use rand::Rng;
use tracing::debug;

/// Trading volume never drops below this after a revaluation.
pub const VOLUME_FLOOR: i64 = 10_000;

/// Initial price range, inclusive.
const PRICE_RANGE: std::ops::RangeInclusive<i64> = 10..=1000;
/// Initial volume range, half-open.
const VOLUME_RANGE: std::ops::Range<i64> = 100_000..1_000_000;
/// Per-revaluation percentage change range.
const DRIFT_PCT: std::ops::RangeInclusive<f64> = -8.0..=8.0;
/// Per-revaluation multiplicative volume perturbation.
const VOLUME_DRIFT: std::ops::RangeInclusive<f64> = -0.2..=0.2;

struct Country {
    name: &'static str,
    prefix: &'static str,
}

struct Sector {
    name: &'static str,
    companies: [&'static str; 4],
}

/// Fixed issuer countries of the simulated world.
const COUNTRIES: [Country; 12] = [
    Country { name: "Valdria", prefix: "Valdrian" },
    Country { name: "Ostmark", prefix: "of Ostmark" },
    Country { name: "House Aldern", prefix: "Aldern" },
    Country { name: "House Ferros", prefix: "Ferros" },
    Country { name: "Sons of the Vale", prefix: "Vale" },
    Country { name: "House Miran", prefix: "Miran" },
    Country { name: "Kestrel Reach", prefix: "Kestreli" },
    Country { name: "Lunara", prefix: "Lunaran" },
    Country { name: "Asterion", prefix: "Asterian" },
    Country { name: "Sorveth", prefix: "Sorvethi" },
    Country { name: "Tulmere", prefix: "Tulmeran" },
    Country { name: "House Veyran", prefix: "Veyran" },
];

/// Economic sectors with company-name stems.
const SECTORS: [Sector; 8] = [
    Sector { name: "Mining", companies: ["Mines", "Metals", "Gems", "Ironworks"] },
    Sector { name: "Trade", companies: ["Merchants", "Caravans", "Ventures", "Emporium"] },
    Sector { name: "Agriculture", companies: ["Farms", "Grains", "Harvests", "Estates"] },
    Sector { name: "Manufacturing", companies: ["Forges", "Works", "Artisans", "Workshops"] },
    Sector { name: "Arcana", companies: ["Arcanists", "Mystics", "Enchantments", "Runes"] },
    Sector { name: "Shipping", companies: ["Ships", "Routes", "Voyages", "Freight"] },
    Sector { name: "Construction", companies: ["Builders", "Masons", "Engineering", "Quarries"] },
    Sector { name: "Alchemy", companies: ["Potions", "Elixirs", "Alchemists", "Laboratories"] },
];

/// Generate the full instrument roster: 3-5 instruments per country, each
/// in a sector drawn without replacement for that country.
///
/// Tickers are derived from country + company abbreviations and are not
/// deduplicated; they are display-oriented and a collision is tolerated.
pub fn generate_roster<R: Rng + ?Sized>(rng: &mut R) -> Vec<Instrument> {
    let mut roster = Vec::new();

    for country in &COUNTRIES {
        let count = rng.random_range(3..=5usize);
        let sector_picks = rand::seq::index::sample(rng, SECTORS.len(), count);

        for sector_idx in sector_picks.iter() {
            let sector = &SECTORS[sector_idx];
            let stem = sector.companies[rng.random_range(0..sector.companies.len())];
            let symbol = make_symbol(country.name, stem);
            // "Valdrian Mines" but "Merchants of Ostmark".
            let name = if country.prefix.starts_with("of ") {
                format!("{} {}", stem, country.prefix)
            } else {
                format!("{} {}", country.prefix, stem)
            };
            let price = rng.random_range(PRICE_RANGE);
            let volume = rng.random_range(VOLUME_RANGE);

            if roster.iter().any(|i: &Instrument| i.symbol == symbol) {
                debug!(symbol = %symbol, "Duplicate ticker generated, keeping both");
            }

            roster.push(Instrument::listed(
                symbol,
                name,
                country.name,
                sector.name,
                price,
                volume,
            ));
        }
    }

    roster
}

/// Ticker: first 3 letters of the country plus first 2 of the company
/// stem, uppercased, spaces stripped.
fn make_symbol(country: &str, stem: &str) -> String {
    let country_code: String = country
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(3)
        .collect();
    let stem_code: String = stem.chars().filter(|c| !c.is_whitespace()).take(2).collect();
    format!("{}{}", country_code, stem_code).to_uppercase()
}

/// Advance every instrument by one bounded random-walk step.
///
/// Each price moves by a uniform percentage in [-8, +8], floored at
/// [`MIN_PRICE`]; high/low water marks extend to cover the new price;
/// volume is perturbed by a uniform multiplicative ±20%, floored at
/// [`VOLUME_FLOOR`]. This is the scheduled, trade-independent update.
pub fn revalue<R: Rng + ?Sized>(rng: &mut R, instruments: &[Instrument]) -> Vec<Instrument> {
    instruments
        .iter()
        .map(|inst| {
            let mut next = inst.clone();

            let pct = rng.random_range(DRIFT_PCT);
            let new_price = ((inst.price as f64) * (1.0 + pct / 100.0)).round() as i64;
            next.apply_price(new_price.max(MIN_PRICE));

            let drift = rng.random_range(VOLUME_DRIFT);
            let new_volume = ((inst.volume as f64) * (1.0 + drift)).floor() as i64;
            next.volume = new_volume.max(VOLUME_FLOOR);

            next
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_roster_counts_per_country() {
        let mut rng = StdRng::seed_from_u64(7);
        let roster = generate_roster(&mut rng);

        for country in COUNTRIES.iter().map(|c| c.name) {
            let n = roster.iter().filter(|i| i.country == country).count();
            assert!((3..=5).contains(&n), "{country} listed {n} instruments");
        }
    }

    #[test]
    fn test_roster_sectors_unique_per_country() {
        let mut rng = StdRng::seed_from_u64(11);
        let roster = generate_roster(&mut rng);

        for country in COUNTRIES.iter().map(|c| c.name) {
            let sectors: Vec<_> = roster
                .iter()
                .filter(|i| i.country == country)
                .map(|i| i.sector.as_str())
                .collect();
            let unique: HashSet<_> = sectors.iter().collect();
            assert_eq!(sectors.len(), unique.len(), "{country} repeated a sector");
        }
    }

    #[test]
    fn test_roster_initial_quote_invariants() {
        let mut rng = StdRng::seed_from_u64(13);
        for inst in generate_roster(&mut rng) {
            assert!((10..=1000).contains(&inst.price), "{}", inst.symbol);
            assert!((100_000..1_000_000).contains(&inst.volume));
            assert_eq!(inst.high, inst.price);
            assert_eq!(inst.low, inst.price);
            assert_eq!(inst.previous_price, inst.price);
            assert_eq!(inst.change, 0);
        }
    }

    #[test]
    fn test_symbol_derivation() {
        assert_eq!(make_symbol("Valdria", "Mines"), "VALMI");
        assert_eq!(make_symbol("House Aldern", "Forges"), "HOUFO");
    }

    #[test]
    fn test_revalue_price_and_watermark_invariants() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut instruments = generate_roster(&mut rng);

        for _ in 0..200 {
            instruments = revalue(&mut rng, &instruments);
            for inst in &instruments {
                assert!(inst.price >= MIN_PRICE);
                assert!(inst.low <= inst.price && inst.price <= inst.high);
                assert!(inst.low <= inst.previous_price && inst.previous_price <= inst.high);
                assert_eq!(inst.price, inst.previous_price + inst.change);
                assert!(inst.volume >= VOLUME_FLOOR);
            }
        }
    }

    #[test]
    fn test_revalue_step_bounded() {
        let mut rng = StdRng::seed_from_u64(19);
        let instruments = generate_roster(&mut rng);
        let next = revalue(&mut rng, &instruments);

        for (before, after) in instruments.iter().zip(&next) {
            let max_step = (before.price as f64 * 0.08).round() + 1.0;
            assert!(
                (after.price - before.price).abs() as f64 <= max_step,
                "{}: {} -> {}",
                before.symbol,
                before.price,
                after.price
            );
        }
    }

    #[test]
    fn test_revalue_preserves_shape() {
        let mut rng = StdRng::seed_from_u64(23);
        let instruments = generate_roster(&mut rng);
        let next = revalue(&mut rng, &instruments);

        assert_eq!(instruments.len(), next.len());
        for (before, after) in instruments.iter().zip(&next) {
            assert_eq!(before.symbol, after.symbol);
            assert_eq!(before.country, after.country);
            assert_eq!(before.sector, after.sector);
        }
    }
}
