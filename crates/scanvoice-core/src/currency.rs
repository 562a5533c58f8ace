//! Currency conversion over an explicit, caller-owned rate cache.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How long cached rates stay valid.
pub const CACHE_LIFETIME_HOURS: i64 = 24;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    SAR,
    BHD,
    AED,
}

const CURRENCIES: [(&str, Currency); 6] = [
    ("USD", Currency::USD),
    ("EUR", Currency::EUR),
    ("GBP", Currency::GBP),
    ("SAR", Currency::SAR),
    ("BHD", Currency::BHD),
    ("AED", Currency::AED),
];

impl Currency {
    /// Look up an ISO code, case-insensitively.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        CURRENCIES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(code))
            .map(|(_, currency)| *currency)
    }

    pub fn code(&self) -> &'static str {
        CURRENCIES
            .iter()
            .find(|(_, currency)| currency == self)
            .map(|(name, _)| *name)
            .unwrap_or("???")
    }

    /// Minor-unit digits; the Bahraini dinar uses fils (1/1000).
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::BHD => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Built-in rates that need no lookup service.
fn fixed_rate(from: Currency, to: Currency) -> Option<Decimal> {
    match (from, to) {
        (Currency::SAR, Currency::BHD) => Some(Decimal::new(99, 3)),
        _ => None,
    }
}

/// Exchange rates with a single expiry time.
///
/// A value object: lookups return a new cache instead of mutating the one
/// passed in, and the caller decides where it lives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateCache {
    pub rates: BTreeMap<(Currency, Currency), Decimal>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cache expiring one lifetime after `now`.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            rates: BTreeMap::new(),
            expires_at: Some(now + Duration::hours(CACHE_LIFETIME_HOURS)),
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| now < expires)
    }

    pub fn get(&self, from: Currency, to: Currency) -> Option<Decimal> {
        self.rates.get(&(from, to)).copied()
    }
}

/// Rate for converting `from` into `to`, and the cache to keep using.
///
/// An expired or never-filled cache is replaced by a fresh one.
pub fn lookup_rate(
    cache: &RateCache,
    from: Currency,
    to: Currency,
    now: DateTime<Utc>,
) -> (Option<Decimal>, RateCache) {
    if from == to {
        return (Some(Decimal::ONE), cache.clone());
    }

    let mut cache = if cache.is_valid(now) {
        cache.clone()
    } else {
        debug!("Rate cache expired, starting a fresh one");
        RateCache::fresh(now)
    };

    if let Some(rate) = cache.get(from, to) {
        return (Some(rate), cache);
    }

    match fixed_rate(from, to) {
        Some(rate) => {
            cache.rates.insert((from, to), rate);
            (Some(rate), cache)
        }
        None => {
            debug!("No exchange rate for {} to {}", from, to);
            (None, cache)
        }
    }
}

/// Convert an amount, rounding to the target currency's minor units.
///
/// Converting a currency into itself returns the amount unchanged.
pub fn convert_amount(
    cache: &RateCache,
    amount: Decimal,
    from: Currency,
    to: Currency,
    now: DateTime<Utc>,
) -> (Option<Decimal>, RateCache) {
    if from == to {
        return (Some(amount), cache.clone());
    }

    let (rate, cache) = lookup_rate(cache, from, to, now);
    let converted = rate.map(|rate| {
        (amount * rate).round_dp_with_strategy(to.decimal_places(), RoundingStrategy::MidpointAwayFromZero)
    });

    if let Some(converted) = converted {
        info!("Converted {} {} to {} {}", amount, from, converted, to);
    }
    (converted, cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_currency_table() {
        assert_eq!(Currency::parse("sar"), Some(Currency::SAR));
        assert_eq!(Currency::parse(" BHD "), Some(Currency::BHD));
        assert_eq!(Currency::parse("XYZ"), None);
        assert_eq!(Currency::AED.to_string(), "AED");
    }

    #[test]
    fn test_sar_to_bhd() {
        let (converted, cache) = convert_amount(
            &RateCache::new(),
            Decimal::new(1000, 0),
            Currency::SAR,
            Currency::BHD,
            noon(),
        );

        assert_eq!(converted, Some(Decimal::new(99000, 3)));
        assert_eq!(converted.unwrap().scale(), 3);
        assert_eq!(cache.get(Currency::SAR, Currency::BHD), Some(Decimal::new(99, 3)));
        assert_eq!(cache.expires_at, Some(noon() + Duration::hours(24)));
    }

    #[test]
    fn test_rounding_to_minor_units() {
        let (converted, _) = convert_amount(
            &RateCache::new(),
            Decimal::new(12345, 2),
            Currency::SAR,
            Currency::BHD,
            noon(),
        );
        // 123.45 * 0.099 = 12.22155
        assert_eq!(converted, Some(Decimal::new(12222, 3)));
    }

    #[test]
    fn test_identity_and_unknown_pairs() {
        let amount = Decimal::new(4210, 2);
        let cache = RateCache::new();

        let (same, returned) = convert_amount(&cache, amount, Currency::USD, Currency::USD, noon());
        assert_eq!(same, Some(amount));
        assert_eq!(returned, cache);

        let (missing, _) = convert_amount(&cache, amount, Currency::USD, Currency::EUR, noon());
        assert_eq!(missing, None);
    }

    #[test]
    fn test_cached_rate_is_used_until_expiry() {
        let mut cache = RateCache::fresh(noon());
        cache.rates.insert((Currency::USD, Currency::EUR), Decimal::new(92, 2));

        let later = noon() + Duration::hours(23);
        let (rate, kept) = lookup_rate(&cache, Currency::USD, Currency::EUR, later);
        assert_eq!(rate, Some(Decimal::new(92, 2)));
        assert_eq!(kept, cache);

        let expired = noon() + Duration::hours(25);
        let (rate, replaced) = lookup_rate(&cache, Currency::USD, Currency::EUR, expired);
        assert_eq!(rate, None);
        assert!(replaced.rates.is_empty());
        assert_eq!(replaced.expires_at, Some(expired + Duration::hours(24)));
        // the caller's cache is untouched
        assert_eq!(cache.get(Currency::USD, Currency::EUR), Some(Decimal::new(92, 2)));
    }
}
