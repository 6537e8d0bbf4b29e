//! Icon resolution for coin rows

use crate::constants::{ICON_CDN_URL, ICON_PLACEHOLDER};
use crate::types::Coin;

/// Resolves the icon shown next to a coin
///
/// Both values are opaque to the formatter; the rendering layer decides
/// how to load the URL and what the placeholder identifier maps to.
pub trait IconResolver: Send + Sync {
    /// URL of the coin icon
    fn icon_url(&self, coin: &Coin) -> String;

    /// Placeholder reference shown while the icon loads or if it fails
    fn icon_placeholder(&self, coin: &Coin) -> String;
}

/// Resolver that serves icons from a CDN keyed by coin uid
///
/// A source-supplied image URL wins over the CDN path.
#[derive(Debug, Clone)]
pub struct CdnIconResolver {
    base_url: String,
    placeholder: String,
}

impl CdnIconResolver {
    /// Creates a resolver for the given CDN base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            placeholder: ICON_PLACEHOLDER.to_string(),
        }
    }

    /// Overrides the placeholder identifier
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

impl Default for CdnIconResolver {
    fn default() -> Self {
        Self::new(ICON_CDN_URL)
    }
}

impl IconResolver for CdnIconResolver {
    fn icon_url(&self, coin: &Coin) -> String {
        match &coin.image {
            Some(image) if !image.is_empty() => image.clone(),
            _ => format!("{}/{}@3x.png", self.base_url, coin.uid),
        }
    }

    fn icon_placeholder(&self, _coin: &Coin) -> String {
        self.placeholder.clone()
    }
}
