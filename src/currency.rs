//! Base currency providers

use crate::types::Currency;
use tokio::sync::watch;

/// Supplies the currency rows are formatted in
pub trait CurrencyProvider: Send + Sync {
    /// The current base currency
    fn base_currency(&self) -> Currency;

    /// A receiver notified when the base currency changes
    ///
    /// Providers that never change return `None`.
    fn watch(&self) -> Option<watch::Receiver<Currency>> {
        None
    }
}

/// Provider with a currency that never changes
#[derive(Debug, Clone)]
pub struct FixedCurrency(pub Currency);

impl CurrencyProvider for FixedCurrency {
    fn base_currency(&self) -> Currency {
        self.0.clone()
    }
}

/// Observable base currency setting
pub struct CurrencyManager {
    tx: watch::Sender<Currency>,
}

impl CurrencyManager {
    /// Creates a manager starting at `currency`
    pub fn new(currency: Currency) -> Self {
        let (tx, _rx) = watch::channel(currency);
        Self { tx }
    }

    /// Switches the base currency, notifying watchers if it changed
    pub fn set_base_currency(&self, currency: Currency) {
        self.tx.send_if_modified(|current| {
            if *current == currency {
                false
            } else {
                tracing::debug!(from = current.code(), to = currency.code(), "Base currency changed");
                *current = currency;
                true
            }
        });
    }
}

impl Default for CurrencyManager {
    fn default() -> Self {
        Self::new(Currency::usd())
    }
}

impl CurrencyProvider for CurrencyManager {
    fn base_currency(&self) -> Currency {
        self.tx.borrow().clone()
    }

    fn watch(&self) -> Option<watch::Receiver<Currency>> {
        Some(self.tx.subscribe())
    }
}
