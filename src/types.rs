//! Types for the market list SDK

use crate::error::{ParseFieldError, PreconditionError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Coin identity as supplied by the market source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Source-specific unique id (e.g. "bitcoin")
    pub uid: String,
    /// Full name (e.g. "Bitcoin")
    pub name: String,
    /// Ticker code (e.g. "BTC")
    pub code: String,
    /// Rank by market capitalization, if the source knows it
    pub market_cap_rank: Option<u32>,
    /// Icon URL supplied by the source, if any
    pub image: Option<String>,
}

impl Coin {
    /// Create a coin without rank or image
    pub fn new(uid: impl Into<String>, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            code: code.into(),
            market_cap_rank: None,
            image: None,
        }
    }

    /// Set the market cap rank
    pub fn with_rank(mut self, rank: u32) -> Self {
        self.market_cap_rank = Some(rank);
        self
    }

    /// Set the source icon URL
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Market snapshot for a single coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    /// The coin
    pub coin: Coin,

    /// Current price in the source's quote currency
    pub price: Decimal,

    /// Market capitalization
    pub market_cap: Option<Decimal>,

    /// Total trading volume
    pub total_volume: Option<Decimal>,

    /// Price change percentage
    pub price_change: Option<Decimal>,

    /// Last updated timestamp reported by the source
    pub last_updated: Option<DateTime<Utc>>,
}

impl MarketRecord {
    /// Create a record with only a price
    pub fn new(coin: Coin, price: Decimal) -> Self {
        Self {
            coin,
            price,
            market_cap: None,
            total_volume: None,
            price_change: None,
            last_updated: None,
        }
    }

    /// Build a record from decimal strings
    ///
    /// Returns a precondition error if any present value is not a valid decimal.
    pub fn from_strs(
        coin: Coin,
        price: &str,
        market_cap: Option<&str>,
        total_volume: Option<&str>,
        price_change: Option<&str>,
    ) -> Result<Self, PreconditionError> {
        let parse = |field: &'static str, value: &str| {
            Decimal::from_str(value).map_err(|_| PreconditionError::invalid_decimal(field, value))
        };

        Ok(Self {
            coin,
            price: parse("price", price)?,
            market_cap: market_cap.map(|v| parse("market_cap", v)).transpose()?,
            total_volume: total_volume.map(|v| parse("total_volume", v)).transpose()?,
            price_change: price_change.map(|v| parse("price_change", v)).transpose()?,
            last_updated: None,
        })
    }

    /// Set the market capitalization
    pub fn with_market_cap(mut self, market_cap: Decimal) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    /// Set the total trading volume
    pub fn with_total_volume(mut self, total_volume: Decimal) -> Self {
        self.total_volume = Some(total_volume);
        self
    }

    /// Set the price change percentage
    pub fn with_price_change(mut self, price_change: Decimal) -> Self {
        self.price_change = Some(price_change);
        self
    }
}

/// Secondary metric rendered on each row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayField {
    /// Market capitalization
    #[default]
    MarketCap,
    /// Total trading volume
    Volume,
    /// Price change percentage
    PriceChange,
}

impl DisplayField {
    /// Get the field name as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayField::MarketCap => "market_cap",
            DisplayField::Volume => "volume",
            DisplayField::PriceChange => "price_change",
        }
    }

    /// Get all display fields
    pub fn all() -> &'static [DisplayField] {
        &[
            DisplayField::MarketCap,
            DisplayField::Volume,
            DisplayField::PriceChange,
        ]
    }
}

impl std::fmt::Display for DisplayField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayField {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "market_cap" | "marketcap" => Ok(DisplayField::MarketCap),
            "volume" => Ok(DisplayField::Volume),
            "price_change" | "pricechange" | "price_diff" => Ok(DisplayField::PriceChange),
            _ => Err(ParseFieldError(s.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct CurrencyRepr {
    code: String,
    symbol: String,
    decimal_separator: char,
    grouping_separator: char,
}

/// Fiat currency with its display conventions
///
/// Only constructible through validating constructors, so every `Currency`
/// reaching the formatter is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CurrencyRepr")]
pub struct Currency {
    code: String,
    symbol: String,
    decimal_separator: char,
    grouping_separator: char,
}

impl Currency {
    /// Create a currency using `.` for decimals and `,` for grouping
    pub fn new(code: &str, symbol: &str) -> Result<Self, PreconditionError> {
        Self::with_separators(code, symbol, '.', ',')
    }

    /// Create a currency with explicit separators
    pub fn with_separators(
        code: &str,
        symbol: &str,
        decimal_separator: char,
        grouping_separator: char,
    ) -> Result<Self, PreconditionError> {
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PreconditionError::InvalidCurrencyCode {
                code: code.to_string(),
            });
        }
        let code = code.to_ascii_uppercase();

        if symbol.is_empty() {
            return Err(PreconditionError::EmptyCurrencySymbol { code });
        }

        if decimal_separator == grouping_separator {
            return Err(PreconditionError::AmbiguousSeparators {
                code,
                separator: decimal_separator,
            });
        }

        Ok(Self {
            code,
            symbol: symbol.to_string(),
            decimal_separator,
            grouping_separator,
        })
    }

    /// US Dollar
    pub fn usd() -> Self {
        Self {
            code: "USD".to_string(),
            symbol: "$".to_string(),
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }

    /// Euro
    pub fn eur() -> Self {
        Self {
            code: "EUR".to_string(),
            symbol: "€".to_string(),
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }

    /// ISO 4217 code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Display symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Separator between integer and fractional digits
    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    /// Separator between groups of three integer digits
    pub fn grouping_separator(&self) -> char {
        self.grouping_separator
    }
}

impl TryFrom<CurrencyRepr> for Currency {
    type Error = PreconditionError;

    fn try_from(repr: CurrencyRepr) -> Result<Self, Self::Error> {
        Self::with_separators(
            &repr.code,
            &repr.symbol,
            repr.decimal_separator,
            repr.grouping_separator,
        )
    }
}

/// Secondary metric value carried by a display item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DisplayValue {
    /// Shortened, currency-formatted market cap (e.g. "$900.00 B")
    MarketCap(String),
    /// Shortened, currency-formatted volume
    Volume(String),
    /// Raw price change percentage, absent when the source has none
    PriceChange(Option<Decimal>),
}

impl DisplayValue {
    /// The display field this value was built for
    pub fn field(&self) -> DisplayField {
        match self {
            DisplayValue::MarketCap(_) => DisplayField::MarketCap,
            DisplayValue::Volume(_) => DisplayField::Volume,
            DisplayValue::PriceChange(_) => DisplayField::PriceChange,
        }
    }
}

/// Render-ready row for one coin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub coin_name: String,
    pub coin_code: String,
    /// Currency-formatted price
    pub coin_rate: String,
    pub icon_url: String,
    pub icon_placeholder: String,
    pub value: DisplayValue,
    /// Rank text, empty when the rank is unknown
    pub rank: String,
}

/// State published to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "payload", rename_all = "snake_case")]
pub enum ViewState {
    /// A fetch or formatting pass is pending
    Loading,
    /// The source failed; carries a user-displayable reason
    Error(String),
    /// Formatted rows in source order
    Data(Vec<DisplayItem>),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    /// The rows, if the state is `Data`
    pub fn items(&self) -> Option<&[DisplayItem]> {
        match self {
            ViewState::Data(items) => Some(items),
            _ => None,
        }
    }

    /// The error message, if the state is `Error`
    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }
}
