//! # Market List SDK
//!
//! Turns ranked market records (price, market cap, volume, rank, price change)
//! into currency-localized display items for a coin list, and keeps the list
//! behind a small reactive view state (loading / error / data).
//!
//! ## Usage
//!
//! ```no_run
//! use market_list_sdk::{
//!     ContainerConfig, CurrencyManager, DisplayField, Formatter, MarketListContainer,
//!     sources::CoinGeckoSource,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let container = MarketListContainer::new(
//!     Arc::new(CoinGeckoSource::new()?),
//!     Arc::new(CurrencyManager::default()),
//!     Formatter::default(),
//!     ContainerConfig::from_env(),
//! );
//!
//! let mut states = container.subscribe();
//! container.start();
//! container.set_field(DisplayField::Volume).await;
//!
//! while states.changed().await.is_ok() {
//!     if let Some(items) = states.borrow_and_update().items() {
//!         for item in items {
//!             println!("{:>3} {} {} {:?}", item.rank, item.coin_code, item.coin_rate, item.value);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! MarketSource (fetch / update stream)
//!     ↓
//! MarketListContainer (cached records, field, currency)
//!     ↓
//! Formatter (one DisplayItem per record, source order)
//!     ↓
//! watch::Receiver<ViewState> (your rendering code)
//! ```
//!
//! ## Formatting
//!
//! - Price: currency symbol, 0 to 6 fractional digits (`$45,000.123456`)
//! - Market cap / volume: shortened with K/M/B/T, 0 to 2 fractional digits
//!   (`$900.00 B`); a missing value renders as zero
//! - Price change: raw percentage, `None` when the source has none
//! - Rank: the number, or an empty string when unknown

pub mod config;
pub mod constants;
pub mod container;
pub mod currency;
pub mod error;
pub mod formatter;
pub mod icons;
pub mod metrics;
pub mod number;
pub mod source;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use config::ContainerConfig;
pub use container::MarketListContainer;
pub use currency::{CurrencyManager, CurrencyProvider, FixedCurrency};
pub use error::{ParseFieldError, PreconditionError, SourceError};
pub use formatter::{format_item, Formatter};
pub use icons::{CdnIconResolver, IconResolver};
pub use metrics::PipelineMetrics;
pub use source::{MarketSource, SourceUpdate};
pub use types::{
    Coin, Currency, DisplayField, DisplayItem, DisplayValue, MarketRecord, ViewState,
};
