//! Multi-currency support: country/currency reference data, exchange rates
//! and conversion.
//!
//! All upstream I/O goes through the [`source`] traits; this module owns the
//! caching and the conversion math.

pub mod cache;
pub mod convert;
pub mod error;
pub mod source;
pub mod types;

#[cfg(test)]
mod props;

pub use cache::CurrencyCache;
pub use convert::{Conversion, CurrencyConverter, convert_with_rate};
pub use error::CurrencyError;
pub use source::{CountrySource, RateSource};
pub use types::{
    CountryCurrency, CountryName, CountryRecord, CurrencyDetail, CurrencyListing, RateTable,
};
