//! Currency conversion over cached upstream data.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Converted money amounts are rounded to 2 decimal places
//! - Use banker's rounding (round half to even)
//! - Store both original and converted amounts

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use expenso_shared::types::CurrencyCode;

use crate::currency::cache::CurrencyCache;
use crate::currency::error::CurrencyError;
use crate::currency::source::{CountrySource, RateSource};
use crate::currency::types::{CountryCurrency, CountryRecord, CurrencyListing, RateTable};
use crate::expense::types::ExpenseAmount;

/// Applies an exchange rate and rounds to 2 decimal places.
///
/// Uses banker's rounding (round half to even) to minimize cumulative
/// errors across many conversions.
#[must_use]
pub fn convert_with_rate(amount: Decimal, rate: Decimal) -> Decimal {
    (amount * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// A completed conversion.
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    /// Source currency.
    pub from: CurrencyCode,
    /// Target currency.
    pub to: CurrencyCode,
    /// Rate applied (1 source = rate target).
    pub rate: Decimal,
    /// The amount before conversion.
    pub original_amount: Decimal,
    /// The rounded amount after conversion.
    pub converted_amount: Decimal,
    /// When the conversion was performed.
    pub converted_at: DateTime<Utc>,
}

/// Converts amounts between currencies using cached upstream feeds.
pub struct CurrencyConverter {
    countries: Arc<dyn CountrySource>,
    rates: Arc<dyn RateSource>,
    cache: CurrencyCache,
}

impl CurrencyConverter {
    /// Creates a converter over the given sources and cache.
    #[must_use]
    pub fn new(
        countries: Arc<dyn CountrySource>,
        rates: Arc<dyn RateSource>,
        cache: CurrencyCache,
    ) -> Self {
        Self {
            countries,
            rates,
            cache,
        }
    }

    /// Converts `amount` from one currency to another.
    ///
    /// Same-currency conversions short-circuit with rate 1 and touch no
    /// upstream feed. Otherwise the per-pair rate cache is consulted first;
    /// on a miss the base currency's full table is fetched and the pair rate
    /// stored for next time.
    ///
    /// # Errors
    ///
    /// `RateNotFound` when the base's table has no entry for the target;
    /// `ConversionFailed` when the upstream fetch itself fails.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
    ) -> Result<Conversion, CurrencyError> {
        let rate = if from == to {
            Decimal::ONE
        } else if let Some(rate) = self.cache.pair_rate(from, to) {
            rate
        } else {
            let table = self
                .exchange_rates(from)
                .await
                .map_err(|err| match err {
                    CurrencyError::RateNotFound { .. } => err,
                    other => CurrencyError::ConversionFailed {
                        from,
                        to,
                        reason: other.to_string(),
                    },
                })?;
            let rate = table
                .rate_for(to)
                .ok_or(CurrencyError::RateNotFound { from, to })?;
            self.cache.set_pair_rate(from, to, rate);
            rate
        };

        Ok(Conversion {
            from,
            to,
            rate,
            original_amount: amount,
            converted_amount: convert_with_rate(amount, rate),
            converted_at: Utc::now(),
        })
    }

    /// Installs a company-currency conversion on an expense amount.
    ///
    /// A no-op when the expense is already in the company currency. On
    /// success the converted value, rate and timestamp land on the amount;
    /// the caller decides whether a failure is fatal (at submission it is
    /// not; the expense proceeds unconverted).
    ///
    /// # Errors
    ///
    /// Same as [`convert`](Self::convert).
    pub async fn convert_expense(
        &self,
        amount: &mut ExpenseAmount,
        company_currency: CurrencyCode,
    ) -> Result<(), CurrencyError> {
        if amount.original.currency == company_currency {
            return Ok(());
        }
        let conversion = self
            .convert(amount.original.amount, amount.original.currency, company_currency)
            .await?;
        amount.apply_conversion(
            conversion.converted_amount,
            conversion.rate,
            company_currency,
        );
        Ok(())
    }

    /// The full rate table for a base currency, cached.
    ///
    /// # Errors
    ///
    /// `Upstream` when the feed fetch fails.
    pub async fn exchange_rates(
        &self,
        base: CurrencyCode,
    ) -> Result<Arc<RateTable>, CurrencyError> {
        if let Some(table) = self.cache.rate_table(base) {
            return Ok(table);
        }
        let table = Arc::new(self.rates.fetch_rates(base).await?);
        self.cache.set_rate_table(base, Arc::clone(&table));
        Ok(table)
    }

    /// The currency a country uses, matched case-insensitively on the
    /// common name first and the official name second. Returns the first
    /// currency in code order with its display name and symbol; `None` for
    /// unknown or currency-less countries.
    ///
    /// # Errors
    ///
    /// `Upstream` when the country feed fetch fails.
    pub async fn currency_for_country(
        &self,
        country: &str,
    ) -> Result<Option<CountryCurrency>, CurrencyError> {
        let records = self.country_records().await?;
        let wanted = country.to_lowercase();

        let matched = records
            .iter()
            .find(|r| r.name.common.to_lowercase() == wanted)
            .or_else(|| {
                records
                    .iter()
                    .find(|r| r.name.official.to_lowercase() == wanted)
            });
        Ok(matched.and_then(CountryRecord::primary_currency_info))
    }

    /// Every currency known to the country feed, each with the countries
    /// using it, sorted by code.
    ///
    /// # Errors
    ///
    /// `Upstream` when the country feed fetch fails.
    pub async fn all_currencies(&self) -> Result<Vec<CurrencyListing>, CurrencyError> {
        let records = self.country_records().await?;

        let mut by_code: BTreeMap<CurrencyCode, CurrencyListing> = BTreeMap::new();
        for record in records.iter() {
            for (code, detail) in &record.currencies {
                let Ok(code) = CurrencyCode::new(code) else {
                    continue;
                };
                let entry = by_code.entry(code).or_insert_with(|| CurrencyListing {
                    code,
                    name: detail.name.clone(),
                    symbol: detail.symbol.clone(),
                    countries: Vec::new(),
                });
                if entry.symbol.is_none() {
                    entry.symbol = detail.symbol.clone();
                }
                entry.countries.push(record.name.common.clone());
            }
        }

        let mut listings: Vec<CurrencyListing> = by_code.into_values().collect();
        for listing in &mut listings {
            listing.countries.sort();
        }
        Ok(listings)
    }

    async fn country_records(&self) -> Result<Arc<Vec<CountryRecord>>, CurrencyError> {
        if let Some(records) = self.cache.countries() {
            return Ok(records);
        }
        let records = Arc::new(self.countries.fetch_countries().await?);
        self.cache.set_countries(Arc::clone(&records));
        Ok(records)
    }
}
