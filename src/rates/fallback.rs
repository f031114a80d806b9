//! Build-time embedded fallback rates.
//!
//! Last-resort tier of the fallback chain, used only when both the network
//! and the cache have nothing to offer. The table is USD-relative and
//! approximate; every result built from it carries a warning.

use crate::rates::table::{CurrencyCode, RateTable};
use std::sync::OnceLock;

/// Approximate USD-relative rates, frozen at build time. Never mutated.
const STATIC_USD_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 149.5),
    ("AUD", 1.52),
    ("CAD", 1.36),
    ("CHF", 0.88),
    ("CNY", 7.24),
    ("HKD", 7.82),
    ("NZD", 1.64),
    ("SEK", 10.45),
    ("KRW", 1330.0),
    ("SGD", 1.34),
    ("NOK", 10.55),
    ("MXN", 17.1),
    ("INR", 83.1),
    ("RUB", 92.5),
    ("ZAR", 18.7),
    ("TRY", 32.3),
    ("BRL", 5.0),
    ("TWD", 31.6),
    ("DKK", 6.87),
    ("PLN", 3.98),
    ("THB", 35.8),
    ("IDR", 15600.0),
    ("HUF", 355.0),
    ("CZK", 23.2),
    ("ILS", 3.7),
    ("CLP", 930.0),
    ("PHP", 56.1),
    ("AED", 3.67),
    ("COP", 3900.0),
    ("SAR", 3.75),
    ("MYR", 4.7),
    ("RON", 4.58),
];

/// The USD-based static table, built once on first use.
pub fn static_fallback_table() -> &'static RateTable {
    static TABLE: OnceLock<RateTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        STATIC_USD_RATES
            .iter()
            .map(|(code, rate)| {
                let code: CurrencyCode = code.parse().expect("embedded codes are valid");
                (code, *rate)
            })
            .collect()
    })
}

/// Rebase the static table for an arbitrary base currency.
///
/// Dividing every USD-relative rate by the base's USD-relative rate yields a
/// table relative to `base`. An unknown base divides by the identity rate,
/// leaving the USD table unchanged — the same degradation rule the converter
/// applies.
pub fn fallback_for_base(base: CurrencyCode) -> RateTable {
    let usd_table = static_fallback_table();
    let (divisor, unknown_base) = usd_table.rate_or_identity(base);
    if unknown_base {
        tracing::warn!(base = %base, "base currency absent from static fallback table");
    }
    usd_table
        .iter()
        .map(|(code, rate)| (code, rate / divisor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_static_table_shape() {
        let table = static_fallback_table();
        assert!(table.len() >= 35);
        assert_eq!(table.get(code("USD")), Some(1.0));
        for (_, rate) in table.iter() {
            assert!(rate > 0.0 && rate.is_finite());
        }
    }

    #[test]
    fn test_rebase_for_eur() {
        let table = fallback_for_base(code("EUR"));
        assert_eq!(table.get(code("EUR")), Some(1.0));

        let usd = static_fallback_table();
        let expected_gbp = usd.get(code("GBP")).unwrap() / usd.get(code("EUR")).unwrap();
        assert!((table.get(code("GBP")).unwrap() - expected_gbp).abs() < 1e-12);
    }

    #[test]
    fn test_rebase_unknown_base_keeps_usd_rates() {
        let table = fallback_for_base(code("XXX"));
        assert_eq!(table.get(code("USD")), Some(1.0));
        assert_eq!(table.get(code("EUR")), static_fallback_table().get(code("EUR")));
    }
}
