//! Container configuration

use crate::constants::{DEFAULT_CATEGORY, ENV_CATEGORY, ENV_FIELD, ENV_POLL_SECS, REFRESH_INTERVAL_SECS};
use crate::types::DisplayField;
use std::time::Duration;

/// Settings a container is constructed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Category identifier passed to the source
    pub category: String,
    /// Field rendered until the caller selects another
    pub field: DisplayField,
    /// Re-fetch interval for sources without an update stream; `None` disables polling
    pub poll_interval: Option<Duration>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            field: DisplayField::default(),
            poll_interval: Some(Duration::from_secs(REFRESH_INTERVAL_SECS)),
        }
    }
}

impl ContainerConfig {
    /// Defaults overridden by `MARKET_LIST_CATEGORY`, `MARKET_LIST_FIELD` and
    /// `MARKET_LIST_POLL_SECS`. Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(category) = lookup(ENV_CATEGORY).filter(|c| !c.trim().is_empty()) {
            config.category = category.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_FIELD) {
            match raw.parse::<DisplayField>() {
                Ok(field) => config.field = field,
                Err(e) => tracing::warn!(error = %e, "Ignoring {}", ENV_FIELD),
            }
        }

        if let Some(raw) = lookup(ENV_POLL_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.poll_interval = None,
                Ok(secs) => config.poll_interval = Some(Duration::from_secs(secs)),
                Err(e) => tracing::warn!(error = %e, value = %raw, "Ignoring {}", ENV_POLL_SECS),
            }
        }

        config
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_field(mut self, field: DisplayField) -> Self {
        self.field = field;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Option<Duration>) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
