//! Source abstraction for market records

use crate::{
    error::SourceError,
    types::{Currency, MarketRecord},
};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// One delivery from a source: a full record list or a failure
pub type SourceUpdate = Result<Vec<MarketRecord>, SourceError>;

/// Trait for market record sources
///
/// Implementations return records for a coin category in rank order, with
/// amounts quoted in the requested currency. Pagination, caching and retries
/// are the source's own business.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetches the current records for a category
    ///
    /// # Arguments
    /// * `category` - Source-specific category identifier
    /// * `currency` - Currency the amounts are quoted in
    ///
    /// # Returns
    /// Records in the order they should be displayed, or the reason none could be produced
    async fn fetch_records(
        &self,
        category: &str,
        currency: &Currency,
    ) -> Result<Vec<MarketRecord>, SourceError>;

    /// Returns the name of this source
    fn source_name(&self) -> &'static str;

    /// Subscribes to pushed updates for a category quoted in `currency`
    ///
    /// Sources that only answer fetches return `None` and are polled instead.
    fn subscribe(
        &self,
        _category: &str,
        _currency: &Currency,
    ) -> Option<BoxStream<'static, SourceUpdate>> {
        None
    }
}
