//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Currency feed configuration.
    pub currency: CurrencyConfig,
}

/// Configuration for the external country and exchange-rate feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// Base URL of the country/currency reference API.
    #[serde(default = "default_country_api_url")]
    pub country_api_url: String,
    /// Base URL of the exchange-rate API.
    #[serde(default = "default_rate_api_url")]
    pub rate_api_url: String,
    /// Request timeout for feed calls, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Time-to-live for the cached country list, in seconds.
    #[serde(default = "default_country_ttl")]
    pub country_ttl_secs: u64,
    /// Time-to-live for cached exchange rates, in seconds.
    #[serde(default = "default_rate_ttl")]
    pub rate_ttl_secs: u64,
}

fn default_country_api_url() -> String {
    "https://restcountries.com/v3.1".to_string()
}

fn default_rate_api_url() -> String {
    "https://api.exchangerate-api.com/v4".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_country_ttl() -> u64 {
    86_400 // 24 hours
}

fn default_rate_ttl() -> u64 {
    3_600 // 1 hour
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            country_api_url: default_country_api_url(),
            rate_api_url: default_rate_api_url(),
            request_timeout_secs: default_request_timeout(),
            country_ttl_secs: default_country_ttl(),
            rate_ttl_secs: default_rate_ttl(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("EXPENSO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
