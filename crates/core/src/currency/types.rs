//! Reference-data shapes for the country and exchange-rate feeds.
//!
//! These deserialize the upstream JSON directly. Maps are `BTreeMap` so
//! iteration order is the code order, which makes "first currency" style
//! lookups deterministic.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use expenso_shared::types::CurrencyCode;

/// A country's names as reported by the reference feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryName {
    /// Common name ("Germany").
    pub common: String,
    /// Official name ("Federal Republic of Germany").
    pub official: String,
}

/// One currency entry on a country record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyDetail {
    /// Currency display name.
    pub name: String,
    /// Currency symbol; some currencies carry none.
    pub symbol: Option<String>,
}

/// One country from the reference feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryRecord {
    /// The country's names.
    pub name: CountryName,
    /// Currencies in use, keyed by code. Empty for currency-less entries.
    #[serde(default)]
    pub currencies: BTreeMap<String, CurrencyDetail>,
}

impl CountryRecord {
    /// The country's primary currency: the first code in code order.
    #[must_use]
    pub fn primary_currency(&self) -> Option<CurrencyCode> {
        self.currencies
            .keys()
            .find_map(|code| CurrencyCode::new(code).ok())
    }

    /// The primary currency with its display details.
    #[must_use]
    pub fn primary_currency_info(&self) -> Option<CountryCurrency> {
        self.currencies.iter().find_map(|(code, detail)| {
            CurrencyCode::new(code).ok().map(|code| CountryCurrency {
                code,
                name: detail.name.clone(),
                symbol: detail.symbol.clone(),
            })
        })
    }
}

/// A country's currency as resolved by country lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCurrency {
    /// Currency code.
    pub code: CurrencyCode,
    /// Currency display name.
    pub name: String,
    /// Currency symbol; some currencies carry none.
    pub symbol: Option<String>,
}

/// A full exchange-rate table for one base currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    /// Base currency code as reported upstream.
    pub base: String,
    /// Upstream publication date.
    pub date: String,
    /// Rates keyed by target currency code.
    pub rates: BTreeMap<String, Decimal>,
}

impl RateTable {
    /// Looks up the rate for a target currency.
    #[must_use]
    pub fn rate_for(&self, target: CurrencyCode) -> Option<Decimal> {
        self.rates.get(target.as_str()).copied()
    }
}

/// A currency aggregated across the countries using it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyListing {
    /// Currency code.
    pub code: CurrencyCode,
    /// Currency display name.
    pub name: String,
    /// Currency symbol, when any country reports one.
    pub symbol: Option<String>,
    /// Common names of the countries using this currency, sorted.
    pub countries: Vec<String>,
}
