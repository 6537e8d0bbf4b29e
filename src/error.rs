//! Error types for the market list SDK

use thiserror::Error;

/// Errors a market source can report instead of a record list
///
/// The `Display` output is what the container publishes in `ViewState::Error`.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from the source
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Source API error
    #[error("Source API error: {0}")]
    ApiError(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,

    /// Source could not produce records, reason shown as-is
    #[error("{0}")]
    Unavailable(String),
}

impl SourceError {
    /// Creates an Unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Creates an InvalidResponse error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Inputs that violate the formatter's preconditions
///
/// These are integration defects. They are rejected where values are built
/// so the formatter itself never has to guess a fallback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    /// Currency code is not three ASCII letters
    #[error("Invalid currency code: {code:?}")]
    InvalidCurrencyCode { code: String },

    /// Currency symbol is empty
    #[error("Currency {code} has an empty symbol")]
    EmptyCurrencySymbol { code: String },

    /// Decimal and grouping separators are the same character
    #[error("Currency {code} uses {separator:?} as both decimal and grouping separator")]
    AmbiguousSeparators { code: String, separator: char },

    /// A decimal field could not be parsed
    #[error("Invalid decimal for {field}: {value:?}")]
    InvalidDecimal { field: &'static str, value: String },
}

impl PreconditionError {
    /// Creates an InvalidDecimal error
    pub fn invalid_decimal(field: &'static str, value: &str) -> Self {
        Self::InvalidDecimal {
            field,
            value: value.to_string(),
        }
    }
}

/// Error parsing a display field name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown display field: {0}")]
pub struct ParseFieldError(pub String);
