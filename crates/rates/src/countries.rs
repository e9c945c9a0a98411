//! Client for the REST-countries reference feed.

use async_trait::async_trait;
use tracing::{debug, error};

use expenso_core::currency::{CountryRecord, CountrySource, CurrencyError};
use expenso_shared::config::CurrencyConfig;

/// Fetches the country list from the REST-countries API.
///
/// The feed is queried with a field filter so only the country name and
/// currency map come back; the full payload is several megabytes.
pub struct RestCountriesClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestCountriesClient {
    /// Creates a client with the configured base URL and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::Upstream`] when the HTTP client cannot be
    /// built.
    pub fn new(config: &CurrencyConfig) -> Result<Self, CurrencyError> {
        let client = crate::build_http_client(config)
            .map_err(|e| CurrencyError::Upstream(e.to_string()))?;
        Ok(Self::with_client(client, config.country_api_url.clone()))
    }

    /// Creates a client over an existing HTTP client, for sharing a
    /// connection pool across feed clients.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn countries_url(&self) -> String {
        format!(
            "{}/all?fields=name,currencies",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CountrySource for RestCountriesClient {
    async fn fetch_countries(&self) -> Result<Vec<CountryRecord>, CurrencyError> {
        let url = self.countries_url();
        debug!(url = %url, "Fetching country list");

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(error = %e, "Country feed request failed");
            CurrencyError::Upstream(format!("country feed request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Country feed returned an error status");
            return Err(CurrencyError::Upstream(format!(
                "country feed returned status {status}"
            )));
        }

        let records: Vec<CountryRecord> = response.json().await.map_err(|e| {
            error!(error = %e, "Country feed returned an unparseable body");
            CurrencyError::Upstream(format!("country feed returned invalid JSON: {e}"))
        })?;

        debug!(count = records.len(), "Fetched country list");
        Ok(records)
    }
}
