//! Rate-table domain types and pure conversion logic.

pub mod convert;
pub mod fallback;
pub mod table;

pub use convert::{convert, Conversion};
pub use fallback::fallback_for_base;
pub use table::{CurrencyCode, CurrencyError, Provenance, RateTable, ResolutionResult};
