//! HTTP clients for the external currency feeds.
//!
//! Implements the core crate's `CountrySource` and `RateSource` traits over
//! the REST-countries and exchange-rate APIs. All caching lives in the core;
//! these clients fetch on every call.

pub mod countries;
pub mod exchange;

pub use countries::RestCountriesClient;
pub use exchange::ExchangeRateApiClient;

use std::time::Duration;

use expenso_shared::config::CurrencyConfig;

/// Builds the HTTP client both feed clients share: rustls, gzip, and the
/// configured request timeout.
///
/// # Errors
///
/// Returns the underlying builder error when TLS initialization fails.
pub fn build_http_client(config: &CurrencyConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
}
