//! Currency error types.

use thiserror::Error;

use expenso_shared::error::AppError;
use expenso_shared::types::CurrencyCode;

/// Errors from currency lookup and conversion.
#[derive(Debug, Clone, Error)]
pub enum CurrencyError {
    /// The rate table for the base currency carries no entry for the target.
    #[error("Exchange rate not found for {from} to {to}")]
    RateNotFound {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
    },

    /// A conversion could not be completed because the upstream fetch failed.
    #[error("Currency conversion from {from} to {to} failed: {reason}")]
    ConversionFailed {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
        /// The underlying failure.
        reason: String,
    },

    /// An upstream feed returned an error or unusable response.
    #[error("Upstream currency service error: {0}")]
    Upstream(String),
}

impl CurrencyError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::RateNotFound { .. } => 404,
            Self::ConversionFailed { .. } | Self::Upstream(_) => 502,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::RateNotFound { .. } => "RATE_NOT_FOUND",
            Self::ConversionFailed { .. } => "CONVERSION_FAILED",
            Self::Upstream(_) => "UPSTREAM_ERROR",
        }
    }
}

impl From<CurrencyError> for AppError {
    fn from(err: CurrencyError) -> Self {
        match err {
            CurrencyError::RateNotFound { .. } => Self::NotFound(err.to_string()),
            CurrencyError::ConversionFailed { .. } | CurrencyError::Upstream(_) => {
                Self::ExternalService(err.to_string())
            }
        }
    }
}
