//! Pure currency conversion over a resolved rate table.
//!
//! All rates in a table are base-relative, so cross-pair conversion
//! triangulates through the base: `rate(from → to) = rate[to] / rate[from]`.
//! A code missing from the table converts at the identity rate 1.0 — a
//! defined degradation, not an error. The `used_identity_fallback` flag lets
//! callers surface that as a warning metric.

use crate::rates::table::{CurrencyCode, RateTable};

/// The outcome of a single conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    /// Amount expressed in the target currency.
    pub converted: f64,
    /// The effective from→to rate applied.
    pub effective_rate: f64,
    /// True when any lookup defaulted to the identity rate because the code
    /// was absent from the table.
    pub used_identity_fallback: bool,
}

/// Convert `amount` of `from` into `to`, using a table expressed relative to
/// `base`.
///
/// A non-positive amount is a defined no-op and yields `(0, 0)`.
pub fn convert(
    amount: f64,
    from: CurrencyCode,
    to: CurrencyCode,
    base: CurrencyCode,
    rates: &RateTable,
) -> Conversion {
    if !(amount > 0.0) {
        return Conversion {
            converted: 0.0,
            effective_rate: 0.0,
            used_identity_fallback: false,
        };
    }

    if from == to {
        return Conversion {
            converted: amount,
            effective_rate: 1.0,
            used_identity_fallback: false,
        };
    }

    let (effective_rate, defaulted) = if from == base {
        rates.rate_or_identity(to)
    } else if to == base {
        let (rate, defaulted) = rates.rate_or_identity(from);
        (1.0 / rate, defaulted)
    } else {
        let (to_rate, to_defaulted) = rates.rate_or_identity(to);
        let (from_rate, from_defaulted) = rates.rate_or_identity(from);
        (to_rate / from_rate, to_defaulted || from_defaulted)
    };

    Conversion {
        converted: amount * effective_rate,
        effective_rate,
        used_identity_fallback: defaulted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn usd_table() -> RateTable {
        [(code("EUR"), 0.9), (code("GBP"), 0.8)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_identity_pair() {
        let result = convert(42.0, code("EUR"), code("EUR"), code("USD"), &usd_table());
        assert_eq!(result.converted, 42.0);
        assert_eq!(result.effective_rate, 1.0);
        assert!(!result.used_identity_fallback);
    }

    #[test]
    fn test_from_base() {
        let result = convert(100.0, code("USD"), code("EUR"), code("USD"), &usd_table());
        assert_eq!(result.converted, 90.0);
        assert_eq!(result.effective_rate, 0.9);
    }

    #[test]
    fn test_to_base_inverse() {
        let result = convert(90.0, code("EUR"), code("USD"), code("USD"), &usd_table());
        assert!((result.converted - 100.0).abs() < 1e-9);
        assert!((result.effective_rate - 1.0 / 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_triangulation() {
        let result = convert(100.0, code("EUR"), code("GBP"), code("USD"), &usd_table());
        assert!((result.effective_rate - 0.8 / 0.9).abs() < 1e-12);
        assert!((result.converted - 100.0 * 0.8 / 0.9).abs() < 1e-9);
        assert!(!result.used_identity_fallback);
    }

    #[test]
    fn test_non_positive_amount_is_noop() {
        for amount in [0.0, -10.0, f64::NAN] {
            let result = convert(amount, code("USD"), code("EUR"), code("USD"), &usd_table());
            assert_eq!(result.converted, 0.0);
            assert_eq!(result.effective_rate, 0.0);
        }
    }

    #[test]
    fn test_missing_code_defaults_to_identity() {
        let result = convert(50.0, code("USD"), code("XXX"), code("USD"), &usd_table());
        assert_eq!(result.converted, 50.0);
        assert_eq!(result.effective_rate, 1.0);
        assert!(result.used_identity_fallback);

        let result = convert(50.0, code("XXX"), code("EUR"), code("USD"), &usd_table());
        assert!(result.used_identity_fallback);
        assert!((result.effective_rate - 0.9).abs() < 1e-12);
    }
}
