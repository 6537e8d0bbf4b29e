//! CoinGecko market source implementation

use crate::{
    constants::{
        COINGECKO_API_URL, COINGECKO_MARKETS_ENDPOINT, MARKETS_PAGE_SIZE, REQUEST_TIMEOUT_SECS,
        USER_AGENT,
    },
    error::SourceError,
    source::MarketSource,
    types::{Coin, Currency, MarketRecord},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use rust_decimal::prelude::*;
use serde::Deserialize;
use std::time::Duration;

/// One row of the CoinGecko `/coins/markets` response
#[derive(Debug, Deserialize)]
struct CoinGeckoMarket {
    id: String,
    symbol: String,
    name: String,
    image: Option<String>,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    market_cap_rank: Option<u32>,
    total_volume: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    last_updated: Option<DateTime<Utc>>,
}

impl CoinGeckoMarket {
    /// Converts the row into a record; rows without a usable price are rejected
    fn into_record(self) -> Option<MarketRecord> {
        let price = self.current_price.and_then(Decimal::from_f64)?;

        let mut coin = Coin::new(self.id, self.name, self.symbol.to_uppercase());
        coin.market_cap_rank = self.market_cap_rank;
        coin.image = self.image;

        Some(MarketRecord {
            coin,
            price,
            market_cap: self.market_cap.and_then(Decimal::from_f64),
            total_volume: self.total_volume.and_then(Decimal::from_f64),
            price_change: self.price_change_percentage_24h.and_then(Decimal::from_f64),
            last_updated: self.last_updated,
        })
    }
}

/// Parses a `/coins/markets` body into records, keeping response order
fn parse_markets(body: &str) -> Result<Vec<MarketRecord>, SourceError> {
    let markets: Vec<CoinGeckoMarket> = serde_json::from_str(body).map_err(|e| {
        SourceError::invalid_response(format!("Failed to parse CoinGecko response: {}", e))
    })?;

    let mut records = Vec::with_capacity(markets.len());
    for market in markets {
        let id = market.id.clone();
        match market.into_record() {
            Some(record) => records.push(record),
            None => tracing::warn!(coin = %id, "Dropping CoinGecko row without a price"),
        }
    }

    Ok(records)
}

/// CoinGecko market source
///
/// Quotes each fetch in the currency the caller asks for.
pub struct CoinGeckoSource {
    client: Client,
}

impl CoinGeckoSource {
    /// Creates a new CoinGecko source
    pub fn new() -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(SourceError::NetworkError)?;

        Ok(Self { client })
    }

    /// Builds the markets request for a category quoted in `currency`
    ///
    /// Query values are encoded by reqwest.
    fn build_request(&self, category: &str, currency: &Currency) -> RequestBuilder {
        let url = format!("{}{}", COINGECKO_API_URL, COINGECKO_MARKETS_ENDPOINT);
        self.client.get(url).query(&[
            ("vs_currency", currency.code().to_lowercase()),
            ("category", category.to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", MARKETS_PAGE_SIZE.to_string()),
            ("page", "1".to_string()),
        ])
    }
}

impl Default for CoinGeckoSource {
    fn default() -> Self {
        Self::new().expect("Failed to create CoinGecko source")
    }
}

#[async_trait]
impl MarketSource for CoinGeckoSource {
    async fn fetch_records(
        &self,
        category: &str,
        currency: &Currency,
    ) -> Result<Vec<MarketRecord>, SourceError> {
        let request = self
            .build_request(category, currency)
            .build()
            .map_err(SourceError::NetworkError)?;
        tracing::debug!(url = %request.url(), "Fetching markets from CoinGecko");

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout
            } else {
                SourceError::NetworkError(e)
            }
        })?;

        // Check for rate limiting
        if response.status().as_u16() == 429 {
            return Err(SourceError::RateLimitExceeded);
        }

        // Check for other errors
        if !response.status().is_success() {
            return Err(SourceError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body = response.text().await.map_err(SourceError::NetworkError)?;
        let records = parse_markets(&body)?;

        tracing::debug!(
            category = category,
            currency = currency.code(),
            count = records.len(),
            "Fetched markets from CoinGecko"
        );

        Ok(records)
    }

    fn source_name(&self) -> &'static str {
        "coingecko"
    }
}
