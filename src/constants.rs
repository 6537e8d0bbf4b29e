//! Constants for the market list SDK
//!
//! Formatting precision and the container defaults are centralized here.
//! Runtime overrides for the container live in `config`.

/// Minimum fractional digits when rendering a coin price
pub const PRICE_MIN_FRACTION_DIGITS: u32 = 0;

/// Maximum fractional digits when rendering a coin price
pub const PRICE_MAX_FRACTION_DIGITS: u32 = 6;

/// Minimum fractional digits when rendering a shortened market cap or volume
pub const SHORTENED_MIN_FRACTION_DIGITS: u32 = 0;

/// Maximum fractional digits when rendering a shortened market cap or volume
pub const SHORTENED_MAX_FRACTION_DIGITS: u32 = 2;

/// Scale a shortened value is rounded to
pub const SHORTENED_SCALE: u32 = 2;

/// Unit scales for magnitude shortening, largest first (power of ten, suffix)
pub const SHORTEN_UNITS: &[(u32, &str)] = &[(12, "T"), (9, "B"), (6, "M"), (3, "K")];

/// Category the container loads when none is configured
pub const DEFAULT_CATEGORY: &str = "layer-1";

/// How often the container re-fetches from a non-streaming source (in seconds)
pub const REFRESH_INTERVAL_SECS: u64 = 60;

/// HTTP request timeout when fetching market records (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Number of rows requested from the markets endpoint
pub const MARKETS_PAGE_SIZE: u32 = 250;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for ranked market listings
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// Base URL for coin icons
pub const ICON_CDN_URL: &str = "https://cdn.blocksdecoded.com/coin-icons/32px";

/// Placeholder identifier rendered while a coin icon loads
pub const ICON_PLACEHOLDER: &str = "coin_placeholder";

/// Environment variable overriding the container category
pub const ENV_CATEGORY: &str = "MARKET_LIST_CATEGORY";

/// Environment variable overriding the container display field
pub const ENV_FIELD: &str = "MARKET_LIST_FIELD";

/// Environment variable overriding the poll interval in seconds (0 disables polling)
pub const ENV_POLL_SECS: &str = "MARKET_LIST_POLL_SECS";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "market-list-sdk/0.1.0";
