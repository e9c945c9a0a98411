//! Upstream feed traits.
//!
//! Implemented over HTTP in the rates crate; tests use in-memory doubles.

use async_trait::async_trait;

use expenso_shared::types::CurrencyCode;

use crate::currency::error::CurrencyError;
use crate::currency::types::{CountryRecord, RateTable};

/// The country/currency reference feed.
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Fetches the full country list with each country's currencies.
    async fn fetch_countries(&self) -> Result<Vec<CountryRecord>, CurrencyError>;
}

/// The exchange-rate feed.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the full rate table for a base currency.
    async fn fetch_rates(&self, base: CurrencyCode) -> Result<RateTable, CurrencyError>;
}
