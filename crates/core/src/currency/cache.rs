//! TTL caches for currency reference data and rates.
//!
//! One instance is shared process-wide by injection. Entries expire on their
//! TTL; concurrent misses may fetch the same data redundantly, which is
//! benign since the last write wins.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use rust_decimal::Decimal;

use expenso_shared::config::CurrencyConfig;
use expenso_shared::types::CurrencyCode;

use crate::currency::types::{CountryRecord, RateTable};

/// Caches for the country list, per-base rate tables and per-pair rates.
#[derive(Clone)]
pub struct CurrencyCache {
    countries: Cache<(), Arc<Vec<CountryRecord>>>,
    rate_tables: Cache<CurrencyCode, Arc<RateTable>>,
    pair_rates: Cache<(CurrencyCode, CurrencyCode), Decimal>,
}

impl CurrencyCache {
    /// Creates caches with the given TTLs. Country data moves slowly and
    /// gets the long TTL; both rate caches share the short one.
    #[must_use]
    pub fn new(country_ttl: Duration, rate_ttl: Duration) -> Self {
        Self {
            countries: Cache::builder()
                .max_capacity(1)
                .time_to_live(country_ttl)
                .build(),
            rate_tables: Cache::builder()
                .max_capacity(256)
                .time_to_live(rate_ttl)
                .build(),
            pair_rates: Cache::builder()
                .max_capacity(4096)
                .time_to_live(rate_ttl)
                .build(),
        }
    }

    /// Creates caches from the currency configuration section.
    #[must_use]
    pub fn from_config(config: &CurrencyConfig) -> Self {
        Self::new(
            Duration::from_secs(config.country_ttl_secs),
            Duration::from_secs(config.rate_ttl_secs),
        )
    }

    /// The cached country list, if still live.
    #[must_use]
    pub fn countries(&self) -> Option<Arc<Vec<CountryRecord>>> {
        self.countries.get(&())
    }

    /// Stores the country list.
    pub fn set_countries(&self, records: Arc<Vec<CountryRecord>>) {
        self.countries.insert((), records);
    }

    /// The cached rate table for a base currency, if still live.
    #[must_use]
    pub fn rate_table(&self, base: CurrencyCode) -> Option<Arc<RateTable>> {
        self.rate_tables.get(&base)
    }

    /// Stores a base currency's rate table.
    pub fn set_rate_table(&self, base: CurrencyCode, table: Arc<RateTable>) {
        self.rate_tables.insert(base, table);
    }

    /// The cached rate for a currency pair, if still live.
    #[must_use]
    pub fn pair_rate(&self, from: CurrencyCode, to: CurrencyCode) -> Option<Decimal> {
        self.pair_rates.get(&(from, to))
    }

    /// Stores a pair rate.
    pub fn set_pair_rate(&self, from: CurrencyCode, to: CurrencyCode, rate: Decimal) {
        self.pair_rates.insert((from, to), rate);
    }
}

impl Default for CurrencyCache {
    fn default() -> Self {
        Self::from_config(&CurrencyConfig::default())
    }
}
