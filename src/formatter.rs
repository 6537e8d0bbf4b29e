//! Maps market records to display items
//!
//! Formatting is pure: the same record, currency and field always produce
//! the same item, and nothing here can fail for a validated `Currency`.

use crate::{
    constants::{
        PRICE_MAX_FRACTION_DIGITS, PRICE_MIN_FRACTION_DIGITS, SHORTENED_MAX_FRACTION_DIGITS,
        SHORTENED_MIN_FRACTION_DIGITS,
    },
    icons::{CdnIconResolver, IconResolver},
    number::{format_fiat, shorten_value},
    types::{Currency, DisplayField, DisplayItem, DisplayValue, MarketRecord},
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Shortened currency text for market cap or volume; a missing value renders as zero.
fn shortened_text(value: Option<Decimal>, currency: &Currency) -> String {
    let (scaled, suffix) = shorten_value(value.unwrap_or(Decimal::ZERO));
    let amount = format_fiat(
        scaled,
        currency,
        SHORTENED_MIN_FRACTION_DIGITS,
        SHORTENED_MAX_FRACTION_DIGITS,
    );

    if suffix.is_empty() {
        amount
    } else {
        format!("{} {}", amount, suffix)
    }
}

/// Build the secondary value for the selected field
pub fn display_value(record: &MarketRecord, currency: &Currency, field: DisplayField) -> DisplayValue {
    match field {
        DisplayField::MarketCap => DisplayValue::MarketCap(shortened_text(record.market_cap, currency)),
        DisplayField::Volume => DisplayValue::Volume(shortened_text(record.total_volume, currency)),
        DisplayField::PriceChange => DisplayValue::PriceChange(record.price_change),
    }
}

/// Format one record into a display item
pub fn format_item(
    record: &MarketRecord,
    currency: &Currency,
    field: DisplayField,
    icons: &dyn IconResolver,
) -> DisplayItem {
    let coin = &record.coin;

    DisplayItem {
        coin_name: coin.name.clone(),
        coin_code: coin.code.clone(),
        coin_rate: format_fiat(
            record.price,
            currency,
            PRICE_MIN_FRACTION_DIGITS,
            PRICE_MAX_FRACTION_DIGITS,
        ),
        icon_url: icons.icon_url(coin),
        icon_placeholder: icons.icon_placeholder(coin),
        value: display_value(record, currency, field),
        rank: coin
            .market_cap_rank
            .map(|rank| rank.to_string())
            .unwrap_or_default(),
    }
}

/// Record formatter bound to an icon resolver
#[derive(Clone)]
pub struct Formatter {
    icons: Arc<dyn IconResolver>,
}

impl Formatter {
    /// Creates a formatter with a custom icon resolver
    pub fn new(icons: Arc<dyn IconResolver>) -> Self {
        Self { icons }
    }

    /// Format a single record
    pub fn format(&self, record: &MarketRecord, currency: &Currency, field: DisplayField) -> DisplayItem {
        format_item(record, currency, field, self.icons.as_ref())
    }

    /// Format every record, preserving input order
    pub fn format_all(
        &self,
        records: &[MarketRecord],
        currency: &Currency,
        field: DisplayField,
    ) -> Vec<DisplayItem> {
        records
            .iter()
            .map(|record| self.format(record, currency, field))
            .collect()
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(Arc::new(CdnIconResolver::default()))
    }
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter").finish_non_exhaustive()
    }
}
