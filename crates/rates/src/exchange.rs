//! Client for the exchange-rate feed.

use async_trait::async_trait;
use tracing::{debug, error};

use expenso_core::currency::{CurrencyError, RateSource, RateTable};
use expenso_shared::config::CurrencyConfig;
use expenso_shared::types::CurrencyCode;

/// Fetches per-base rate tables from the exchange-rate API.
pub struct ExchangeRateApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExchangeRateApiClient {
    /// Creates a client with the configured base URL and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::Upstream`] when the HTTP client cannot be
    /// built.
    pub fn new(config: &CurrencyConfig) -> Result<Self, CurrencyError> {
        let client = crate::build_http_client(config)
            .map_err(|e| CurrencyError::Upstream(e.to_string()))?;
        Ok(Self::with_client(client, config.rate_api_url.clone()))
    }

    /// Creates a client over an existing HTTP client, for sharing a
    /// connection pool across feed clients.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn rates_url(&self, base: CurrencyCode) -> String {
        format!("{}/latest/{base}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RateSource for ExchangeRateApiClient {
    async fn fetch_rates(&self, base: CurrencyCode) -> Result<RateTable, CurrencyError> {
        let url = self.rates_url(base);
        debug!(url = %url, base = %base, "Fetching rate table");

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(base = %base, error = %e, "Rate feed request failed");
            CurrencyError::Upstream(format!("rate feed request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(base = %base, status = %status, "Rate feed returned an error status");
            return Err(CurrencyError::Upstream(format!(
                "rate feed returned status {status} for base {base}"
            )));
        }

        let table: RateTable = response.json().await.map_err(|e| {
            error!(base = %base, error = %e, "Rate feed returned an unparseable body");
            CurrencyError::Upstream(format!("rate feed returned invalid JSON: {e}"))
        })?;

        debug!(base = %base, rates = table.rates.len(), "Fetched rate table");
        Ok(table)
    }
}
