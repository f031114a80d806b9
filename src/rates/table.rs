//! Core rate-table types.
//!
//! A [`RateTable`] maps ISO-4217-style currency codes to positive, finite
//! multipliers relative to a base currency: 1 unit of base = rate units of
//! the target. The base itself may be absent from the table; lookups treat
//! absence as an implicit rate of 1.0.

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors for currency-code parsing.
#[derive(Debug, Error)]
pub enum CurrencyError {
    /// Code is not exactly three uppercase ASCII letters.
    #[error("invalid currency code '{0}': expected 3 uppercase ASCII letters")]
    InvalidCode(String),
}

/// A validated three-letter currency code (e.g. `USD`, `EUR`).
///
/// Construction goes through [`FromStr`], so any value of this type is
/// guaranteed uppercase ASCII. Malformed input is a caller contract
/// violation and surfaces as a typed error at the API boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// View the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Invariant: validated ASCII at construction.
        std::str::from_utf8(&self.0).expect("currency code is ASCII")
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() == 3 && bytes.iter().all(|b| b.is_ascii_uppercase()) {
            Ok(Self([bytes[0], bytes[1], bytes[2]]))
        } else {
            Err(CurrencyError::InvalidCode(s.to_string()))
        }
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyCode({})", self.as_str())
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CodeVisitor;

        impl Visitor<'_> for CodeVisitor {
            type Value = CurrencyCode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 3-letter uppercase currency code")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(CodeVisitor)
    }
}

/// Which tier of the fallback chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Fresh fetch from an upstream provider.
    Network,
    /// Fresh cache entry, no network attempted.
    Cache,
    /// Stale cache entry returned while connectivity was known down.
    OfflineCache,
    /// Embedded static table returned while connectivity was known down.
    StaticFallback,
    /// Cache entry (fresh or stale) returned after all providers failed.
    ErrorCacheFallback,
    /// Embedded static table returned after all providers failed.
    ErrorStaticFallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provenance::Network => "network",
            Provenance::Cache => "cache",
            Provenance::OfflineCache => "offline_cache",
            Provenance::StaticFallback => "static_fallback",
            Provenance::ErrorCacheFallback => "error_cache_fallback",
            Provenance::ErrorStaticFallback => "error_static_fallback",
        };
        f.write_str(s)
    }
}

/// A table of exchange rates relative to a base currency.
///
/// All stored rates are positive and finite; [`RateTable::from_raw`] filters
/// anything else out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable(HashMap<CurrencyCode, f64>);

impl RateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from untrusted provider data.
    ///
    /// Entries with malformed codes or non-positive/non-finite rates are
    /// dropped, not errors: one bad row must not poison an otherwise usable
    /// response.
    pub fn from_raw(raw: HashMap<String, f64>) -> Self {
        let mut table = HashMap::with_capacity(raw.len());
        for (code, rate) in raw {
            let parsed: CurrencyCode = match code.parse() {
                Ok(c) => c,
                Err(_) => {
                    tracing::debug!(code = %code, "dropping entry with malformed currency code");
                    continue;
                }
            };
            if !rate.is_finite() || rate <= 0.0 {
                tracing::debug!(code = %code, rate, "dropping entry with non-positive rate");
                continue;
            }
            table.insert(parsed, rate);
        }
        Self(table)
    }

    /// Insert a single rate. Non-positive and non-finite rates are ignored.
    pub fn insert(&mut self, code: CurrencyCode, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.0.insert(code, rate);
        }
    }

    /// Look up the rate for a code.
    pub fn get(&self, code: CurrencyCode) -> Option<f64> {
        self.0.get(&code).copied()
    }

    /// Look up a rate, defaulting to the identity rate 1.0 when absent.
    ///
    /// Returns `(rate, defaulted)` where `defaulted` is true when the code
    /// was missing from the table. Callers use the flag to record the
    /// identity-fallback warning metric.
    pub fn rate_or_identity(&self, code: CurrencyCode) -> (f64, bool) {
        match self.get(code) {
            Some(rate) => (rate, false),
            None => (1.0, true),
        }
    }

    pub fn contains(&self, code: CurrencyCode) -> bool {
        self.0.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CurrencyCode, f64)> + '_ {
        self.0.iter().map(|(c, r)| (*c, *r))
    }
}

impl FromIterator<(CurrencyCode, f64)> for RateTable {
    fn from_iter<T: IntoIterator<Item = (CurrencyCode, f64)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (code, rate) in iter {
            table.insert(code, rate);
        }
        table
    }
}

/// The outcome of one resolution request.
///
/// Transient: produced per request, never persisted. `warning` is the only
/// failure channel; a result always carries a usable table.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    /// The resolved table.
    pub table: RateTable,
    /// When the table was produced, in unix milliseconds. For cache tiers
    /// this is the original insertion time.
    pub fetched_at: u64,
    /// Which fallback tier produced the table.
    pub provenance: Provenance,
    /// Human-readable degradation notice, set for every non-fresh tier.
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_parsing() {
        assert!("USD".parse::<CurrencyCode>().is_ok());
        assert!("usd".parse::<CurrencyCode>().is_err());
        assert!("USDX".parse::<CurrencyCode>().is_err());
        assert!("US".parse::<CurrencyCode>().is_err());
        assert!("U$D".parse::<CurrencyCode>().is_err());

        let code: CurrencyCode = "EUR".parse().unwrap();
        assert_eq!(code.as_str(), "EUR");
        assert_eq!(code.to_string(), "EUR");
    }

    #[test]
    fn test_from_raw_filters_bad_entries() {
        let mut raw = HashMap::new();
        raw.insert("EUR".to_string(), 0.9);
        raw.insert("GBP".to_string(), 0.8);
        raw.insert("bad".to_string(), 1.2);
        raw.insert("JPY".to_string(), -5.0);
        raw.insert("CHF".to_string(), f64::NAN);
        raw.insert("NOK".to_string(), f64::INFINITY);

        let table = RateTable::from_raw(raw);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("EUR".parse().unwrap()), Some(0.9));
        assert_eq!(table.get("GBP".parse().unwrap()), Some(0.8));
    }

    #[test]
    fn test_rate_or_identity() {
        let table: RateTable = [("EUR".parse().unwrap(), 0.9)].into_iter().collect();
        assert_eq!(table.rate_or_identity("EUR".parse().unwrap()), (0.9, false));
        assert_eq!(table.rate_or_identity("XXX".parse().unwrap()), (1.0, true));
    }

    #[test]
    fn test_table_json_round_trip() {
        let table: RateTable = [
            ("EUR".parse().unwrap(), 0.9),
            ("GBP".parse().unwrap(), 0.8),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&table).unwrap();
        let back: RateTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_provenance_display_matches_serde() {
        let tags = [
            Provenance::Network,
            Provenance::Cache,
            Provenance::OfflineCache,
            Provenance::StaticFallback,
            Provenance::ErrorCacheFallback,
            Provenance::ErrorStaticFallback,
        ];
        for tag in tags {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag));
        }
    }
}
