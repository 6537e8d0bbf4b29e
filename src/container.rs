//! View state container for a ranked coin list
//!
//! Holds the current `ViewState`, re-derives it when the source delivers
//! records or when the display field or currency changes, and publishes
//! every new state to observers over a watch channel.

use crate::{
    config::ContainerConfig,
    currency::CurrencyProvider,
    formatter::Formatter,
    metrics::{MetricsCollector, PassOrigin, PipelineMetrics},
    source::{MarketSource, SourceUpdate},
    types::{Currency, DisplayField, MarketRecord, ViewState},
};
use futures::stream::{BoxStream, StreamExt};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Interval, MissedTickBehavior};

/// Field and currency the rows are currently rendered with
#[derive(Debug, Clone)]
struct Selection {
    field: DisplayField,
    currency: Currency,
}

/// Records of the last successful delivery and the currency code they are quoted in
#[derive(Clone)]
struct CachedRecords {
    quoted_in: String,
    records: Arc<Vec<MarketRecord>>,
}

/// State shared between the container handle and its background task
struct Shared {
    category: String,
    poll_interval: Option<Duration>,
    source: Arc<dyn MarketSource>,
    currency_provider: Arc<dyn CurrencyProvider>,
    formatter: Formatter,
    selection: RwLock<Selection>,
    records: RwLock<Option<CachedRecords>>,
    /// Held from the cache and selection read through publish
    pass: tokio::sync::Mutex<()>,
    /// Wakes the background task to resubscribe in the new currency
    currency_switched: Notify,
    state_tx: watch::Sender<ViewState>,
    metrics: MetricsCollector,
}

impl Shared {
    fn publish(&self, state: ViewState) {
        self.state_tx.send_replace(state);
    }

    /// Fetches in the selected currency and publishes the outcome
    async fn load(&self) {
        self.publish(ViewState::Loading);

        let currency = self.selection.read().await.currency.clone();
        let start = Instant::now();
        let result = self.source.fetch_records(&self.category, &currency).await;
        self.metrics
            .record_fetch(start.elapsed(), result.is_ok())
            .await;

        self.deliver(result, currency.code(), PassOrigin::Fetched).await;
    }

    /// Re-runs the formatter over cached records
    ///
    /// Fetches instead when nothing is cached or the cache is quoted in
    /// another currency.
    async fn reformat(&self) {
        {
            let _pass = self.pass.lock().await;
            let selection = self.selection.read().await.clone();
            let cached = self.records.read().await.clone();

            if let Some(cached) = cached.filter(|c| c.quoted_in == selection.currency.code()) {
                self.publish(ViewState::Loading);
                self.render(&cached.records, &selection, PassOrigin::Cached).await;
                return;
            }
        }
        self.load().await;
    }

    /// Publishes a source outcome quoted in `quoted_in`
    ///
    /// Outcomes for a currency that is no longer selected are dropped; the
    /// switch has already requested its own.
    async fn deliver(&self, update: SourceUpdate, quoted_in: &str, origin: PassOrigin) {
        let _pass = self.pass.lock().await;
        let selection = self.selection.read().await.clone();

        if selection.currency.code() != quoted_in {
            tracing::debug!(
                category = %self.category,
                quoted_in = quoted_in,
                currency = selection.currency.code(),
                "Dropping records quoted in a previous currency"
            );
            return;
        }

        match update {
            Ok(records) => {
                let records = Arc::new(records);
                *self.records.write().await = Some(CachedRecords {
                    quoted_in: quoted_in.to_string(),
                    records: records.clone(),
                });
                self.render(&records, &selection, origin).await;
            }
            Err(e) => {
                tracing::warn!(
                    source = self.source.source_name(),
                    category = %self.category,
                    error = %e,
                    "Failed to load market records"
                );
                *self.records.write().await = None;
                self.publish(ViewState::Error(e.to_string()));
            }
        }
    }

    /// Formats `records` with `selection` and publishes `Data`
    async fn render(&self, records: &[MarketRecord], selection: &Selection, origin: PassOrigin) {
        let items = self
            .formatter
            .format_all(records, &selection.currency, selection.field);

        tracing::debug!(
            items = items.len(),
            field = %selection.field,
            currency = selection.currency.code(),
            origin = ?origin,
            "Formatted market list"
        );

        self.metrics.record_pass(origin, items.len()).await;
        self.publish(ViewState::Data(items));
    }

    async fn set_field(&self, field: DisplayField) {
        {
            let mut selection = self.selection.write().await;
            if selection.field == field {
                return;
            }
            selection.field = field;
        }
        self.reformat().await;
    }

    async fn set_currency(&self, currency: Currency) {
        {
            let mut selection = self.selection.write().await;
            if selection.currency == currency {
                return;
            }
            selection.currency = currency;
        }
        self.currency_switched.notify_one();
        self.reformat().await;
    }
}

async fn next_update(updates: &mut Option<BoxStream<'static, SourceUpdate>>) -> Option<SourceUpdate> {
    match updates {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn next_currency(rx: &mut Option<watch::Receiver<Currency>>) -> Option<Currency> {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(rx.borrow_and_update().clone()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Ticker whose first tick is one period away
fn poll_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Background task: initial load, then source updates, currency changes and polling
///
/// Polls only while the source has no open update stream.
async fn run(shared: Arc<Shared>) {
    let mut quoted = shared.selection.read().await.currency.clone();
    let mut updates = shared.source.subscribe(&shared.category, &quoted);
    let mut currency_rx = shared.currency_provider.watch();

    let mut ticker = match updates {
        Some(_) => None,
        None => shared.poll_interval.map(poll_ticker),
    };

    tracing::info!(
        source = shared.source.source_name(),
        category = %shared.category,
        streaming = updates.is_some(),
        poll_interval_secs = ticker.as_ref().map(|t| t.period().as_secs()),
        "Starting market list container"
    );

    shared.load().await;

    loop {
        tokio::select! {
            update = next_update(&mut updates) => match update {
                Some(update) => shared.deliver(update, quoted.code(), PassOrigin::Pushed).await,
                None => {
                    updates = None;
                    ticker = shared.poll_interval.map(poll_ticker);
                    tracing::info!(
                        category = %shared.category,
                        polling = ticker.is_some(),
                        "Source update stream ended"
                    );
                }
            },
            currency = next_currency(&mut currency_rx) => match currency {
                Some(currency) => shared.set_currency(currency).await,
                None => currency_rx = None,
            },
            _ = shared.currency_switched.notified() => {
                let currency = shared.selection.read().await.currency.clone();
                if updates.is_some() && currency.code() != quoted.code() {
                    tracing::debug!(
                        category = %shared.category,
                        currency = currency.code(),
                        "Resubscribing to source updates"
                    );
                    updates = shared.source.subscribe(&shared.category, &currency);
                    if updates.is_none() {
                        ticker = shared.poll_interval.map(poll_ticker);
                    }
                }
                quoted = currency;
            },
            _ = next_tick(&mut ticker) => shared.load().await,
        }
    }
}

/// View state container for one coin category
///
/// Starts in `Loading`. Each pass replaces the whole state; rows keep the
/// order the source delivered them in.
///
/// # Example
/// ```no_run
/// use market_list_sdk::{
///     ContainerConfig, Currency, DisplayField, FixedCurrency, Formatter, MarketListContainer,
///     sources::CoinGeckoSource,
/// };
/// use std::sync::Arc;
///
/// # async fn example() {
/// let container = MarketListContainer::new(
///     Arc::new(CoinGeckoSource::default()),
///     Arc::new(FixedCurrency(Currency::usd())),
///     Formatter::default(),
///     ContainerConfig::default(),
/// );
///
/// container.refresh().await;
/// container.set_field(DisplayField::Volume).await;
/// println!("{:?}", container.state());
/// # }
/// ```
pub struct MarketListContainer {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MarketListContainer {
    /// Creates a container wired to its collaborators
    ///
    /// Nothing is fetched until `refresh` or `start` is called.
    pub fn new(
        source: Arc<dyn MarketSource>,
        currency_provider: Arc<dyn CurrencyProvider>,
        formatter: Formatter,
        config: ContainerConfig,
    ) -> Self {
        let selection = Selection {
            field: config.field,
            currency: currency_provider.base_currency(),
        };
        let (state_tx, _rx) = watch::channel(ViewState::Loading);
        let metrics = MetricsCollector::new(source.source_name());

        let shared = Arc::new(Shared {
            category: config.category,
            poll_interval: config.poll_interval,
            source,
            currency_provider,
            formatter,
            selection: RwLock::new(selection),
            records: RwLock::new(None),
            pass: tokio::sync::Mutex::new(()),
            currency_switched: Notify::new(),
            state_tx,
            metrics,
        });

        Self {
            shared,
            task: Mutex::new(None),
        }
    }

    /// Current view state
    pub fn state(&self) -> ViewState {
        self.shared.state_tx.borrow().clone()
    }

    /// Receiver notified on every published state
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.shared.state_tx.subscribe()
    }

    /// Category this container loads
    pub fn category(&self) -> &str {
        &self.shared.category
    }

    /// Field rows are rendered with
    pub async fn field(&self) -> DisplayField {
        self.shared.selection.read().await.field
    }

    /// Currency rows are rendered in
    pub async fn currency(&self) -> Currency {
        self.shared.selection.read().await.currency.clone()
    }

    /// Re-fetches from the source and re-renders
    pub async fn refresh(&self) {
        self.shared.load().await;
    }

    /// Selects the field rows render; re-renders cached records without re-fetching
    pub async fn set_field(&self, field: DisplayField) {
        self.shared.set_field(field).await;
    }

    /// Switches the currency rows render in
    ///
    /// Records are re-fetched in the new currency; a currency with the same
    /// code re-renders the cached records.
    pub async fn set_currency(&self, currency: Currency) {
        self.shared.set_currency(currency).await;
    }

    /// Number of fetches issued to the source so far
    pub async fn fetch_count(&self) -> u64 {
        self.shared.metrics.fetch_count().await
    }

    /// Pipeline metrics snapshot
    pub async fn metrics(&self) -> PipelineMetrics {
        self.shared.metrics.get_metrics().await
    }

    /// Starts the background task
    ///
    /// Performs the initial load, then follows the source's update stream (or
    /// polls it once the stream is absent or ended), and the currency provider. Calling `start` while the task is
    /// running does nothing.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        *task = Some(tokio::spawn(run(self.shared.clone())));
    }

    /// Whether the background task is running
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the background task and drops the source subscription
    pub fn shutdown(&self) {
        if let Some(handle) = self.task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
            tracing::info!(category = %self.shared.category, "Stopped market list container");
        }
    }
}

impl Drop for MarketListContainer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        currency::{CurrencyManager, FixedCurrency},
        icons::{CdnIconResolver, IconResolver},
        source::mock::MockSource,
        types::{Coin, DisplayValue},
    };
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc as std_mpsc;
    use tokio::time::{sleep, timeout};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn records() -> Vec<MarketRecord> {
        vec![
            MarketRecord::new(Coin::new("bitcoin", "Bitcoin", "BTC").with_rank(1), dec("45000.123456"))
                .with_market_cap(dec("900000000000")),
            MarketRecord::new(Coin::new("ethereum", "Ethereum", "ETH").with_rank(2), dec("3000"))
                .with_market_cap(dec("360000000000"))
                .with_total_volume(dec("15000000000")),
            MarketRecord::new(Coin::new("newcoin", "New Coin", "NEW"), dec("0.0042")),
        ]
    }

    fn container_with(source: Arc<MockSource>, config: ContainerConfig) -> MarketListContainer {
        MarketListContainer::new(
            source,
            Arc::new(FixedCurrency(Currency::usd())),
            Formatter::default(),
            config,
        )
    }

    fn container(source: Arc<MockSource>) -> MarketListContainer {
        container_with(source, ContainerConfig::default().with_poll_interval(None))
    }

    async fn wait_for(
        rx: &mut watch::Receiver<ViewState>,
        predicate: impl FnMut(&ViewState) -> bool,
    ) -> ViewState {
        timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for state")
            .expect("state channel closed")
            .clone()
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let container = container(Arc::new(MockSource::new()));
        assert_eq!(container.state(), ViewState::Loading);
        assert_eq!(container.fetch_count().await, 0);
    }

    #[tokio::test]
    async fn test_refresh_publishes_data_in_source_order() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = container(source.clone());

        container.refresh().await;

        let state = container.state();
        let items = state.items().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(
            items.iter().map(|i| i.coin_code.as_str()).collect::<Vec<_>>(),
            vec!["BTC", "ETH", "NEW"]
        );
        assert_eq!(items[0].coin_rate, "$45,000.123456");
        assert_eq!(items[0].value, DisplayValue::MarketCap("$900.00 B".to_string()));
        assert_eq!(items[0].rank, "1");
        assert_eq!(items[2].rank, "");
        assert_eq!(source.categories(), vec![crate::constants::DEFAULT_CATEGORY]);
    }

    #[tokio::test]
    async fn test_empty_source_is_data_not_error() {
        let source = Arc::new(MockSource::new());
        let container = container(source);

        container.refresh().await;

        assert_eq!(container.state(), ViewState::Data(Vec::new()));
    }

    #[tokio::test]
    async fn test_source_failure_becomes_error_state() {
        let source = Arc::new(MockSource::new());
        source.set_failure("network unreachable");
        let container = container(source);

        container.refresh().await;

        assert_eq!(
            container.state(),
            ViewState::Error("network unreachable".to_string())
        );
    }

    #[tokio::test]
    async fn test_field_change_reuses_cached_records() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = container(source.clone());

        container.refresh().await;
        assert_eq!(container.fetch_count().await, 1);

        container.set_field(DisplayField::Volume).await;

        let state = container.state();
        let items = state.items().unwrap();
        assert!(items.iter().all(|i| i.value.field() == DisplayField::Volume));
        assert_eq!(items[0].value, DisplayValue::Volume("$0.00".to_string()));
        assert_eq!(items[1].value, DisplayValue::Volume("$15.00 B".to_string()));
        assert_eq!(container.field().await, DisplayField::Volume);
        assert_eq!(container.fetch_count().await, 1);
        assert_eq!(source.call_count(), 1);
        assert_eq!(container.metrics().await.reformat_count, 1);
    }

    #[tokio::test]
    async fn test_price_change_field_passes_raw_values() {
        let source = Arc::new(MockSource::new());
        let mut data = records();
        data[0].price_change = Some(dec("-1.5"));
        source.set_records(data);
        let container = container_with(
            source,
            ContainerConfig::default()
                .with_field(DisplayField::PriceChange)
                .with_poll_interval(None),
        );

        container.refresh().await;

        let state = container.state();
        let items = state.items().unwrap();
        assert_eq!(items[0].value, DisplayValue::PriceChange(Some(dec("-1.5"))));
        assert_eq!(items[1].value, DisplayValue::PriceChange(None));
    }

    #[tokio::test]
    async fn test_same_field_is_a_no_op() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = container(source);

        container.refresh().await;
        container.set_field(DisplayField::MarketCap).await;

        assert_eq!(container.metrics().await.reformat_count, 0);
    }

    #[tokio::test]
    async fn test_field_change_without_cache_fetches() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = container(source.clone());

        container.set_field(DisplayField::Volume).await;

        assert_eq!(source.call_count(), 1);
        assert_eq!(container.state().items().map(|i| i.len()), Some(3));
    }

    #[tokio::test]
    async fn test_failure_clears_cache() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = container(source.clone());

        container.refresh().await;
        source.set_failure("rate limited");
        container.refresh().await;
        assert_eq!(container.state().error(), Some("rate limited"));

        source.set_records(records());
        container.set_field(DisplayField::Volume).await;

        assert_eq!(source.call_count(), 3);
        assert!(container.state().items().is_some());
    }

    #[tokio::test]
    async fn test_currency_change_refetches_in_new_currency() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = container(source.clone());

        container.refresh().await;
        container.set_currency(Currency::eur()).await;

        let state = container.state();
        let items = state.items().unwrap();
        assert_eq!(items[0].coin_rate, "€45,000.123456");
        assert_eq!(items[0].value, DisplayValue::MarketCap("€900.00 B".to_string()));
        assert_eq!(container.currency().await.code(), "EUR");
        assert_eq!(source.currencies(), vec!["USD", "EUR"]);
        assert_eq!(container.metrics().await.reformat_count, 0);

        container.set_field(DisplayField::Volume).await;
        assert_eq!(source.call_count(), 2);
        assert_eq!(
            container.state().items().unwrap()[1].value,
            DisplayValue::Volume("€15.00 B".to_string())
        );
    }

    #[tokio::test]
    async fn test_same_currency_code_rerenders_cached_records() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = container(source.clone());

        container.refresh().await;
        let continental = Currency::with_separators("USD", "US$", ',', '.').unwrap();
        container.set_currency(continental).await;

        assert_eq!(container.state().items().unwrap()[0].coin_rate, "US$45.000,123456");
        assert_eq!(source.call_count(), 1);
        assert_eq!(container.metrics().await.reformat_count, 1);
    }

    #[tokio::test]
    async fn test_refresh_from_data_goes_through_loading() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = Arc::new(container(source.clone()));
        container.refresh().await;
        assert!(container.state().items().is_some());

        let mut rx = container.subscribe();
        source.hold();
        let refresh = tokio::spawn({
            let container = container.clone();
            async move { container.refresh().await }
        });

        wait_for(&mut rx, |s| s.is_loading()).await;
        assert_eq!(container.state(), ViewState::Loading);

        source.release();
        refresh.await.unwrap();
        assert_eq!(container.state().items().map(|i| i.len()), Some(3));
    }

    #[tokio::test]
    async fn test_refresh_from_error_goes_through_loading() {
        let source = Arc::new(MockSource::new());
        source.set_failure("timeout");
        let container = Arc::new(container(source.clone()));
        container.refresh().await;
        assert_eq!(container.state().error(), Some("timeout"));

        let mut rx = container.subscribe();
        source.set_records(records());
        source.hold();
        let refresh = tokio::spawn({
            let container = container.clone();
            async move { container.refresh().await }
        });

        wait_for(&mut rx, |s| s.is_loading()).await;
        assert_eq!(container.state(), ViewState::Loading);

        source.release();
        refresh.await.unwrap();
        assert_eq!(container.state().items().map(|i| i.len()), Some(3));
    }

    #[tokio::test]
    async fn test_currency_change_goes_through_loading() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = Arc::new(container(source.clone()));
        container.refresh().await;

        let mut rx = container.subscribe();
        source.hold();
        let switch = tokio::spawn({
            let container = container.clone();
            async move { container.set_currency(Currency::eur()).await }
        });

        wait_for(&mut rx, |s| s.is_loading()).await;
        assert_eq!(container.state(), ViewState::Loading);

        source.release();
        switch.await.unwrap();
        assert!(container.state().items().unwrap()[0].coin_rate.starts_with('€'));
    }

    /// Icon resolver that blocks the first lookup after `arm` until resumed
    struct GatedIcons {
        armed: AtomicBool,
        entered: Mutex<std_mpsc::Sender<()>>,
        resume: Mutex<std_mpsc::Receiver<()>>,
    }

    impl IconResolver for GatedIcons {
        fn icon_url(&self, coin: &Coin) -> String {
            if self.armed.swap(false, Ordering::SeqCst) {
                let _ = self.entered.lock().unwrap().send(());
                let _ = self
                    .resume
                    .lock()
                    .unwrap()
                    .recv_timeout(Duration::from_secs(2));
            }
            CdnIconResolver::default().icon_url(coin)
        }

        fn icon_placeholder(&self, coin: &Coin) -> String {
            CdnIconResolver::default().icon_placeholder(coin)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_field_change_on_cached_records_goes_through_loading() {
        let (entered_tx, entered_rx) = std_mpsc::channel();
        let (resume_tx, resume_rx) = std_mpsc::channel();
        let icons = Arc::new(GatedIcons {
            armed: AtomicBool::new(false),
            entered: Mutex::new(entered_tx),
            resume: Mutex::new(resume_rx),
        });

        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = Arc::new(MarketListContainer::new(
            source.clone(),
            Arc::new(FixedCurrency(Currency::usd())),
            Formatter::new(icons.clone()),
            ContainerConfig::default().with_poll_interval(None),
        ));
        container.refresh().await;

        icons.armed.store(true, Ordering::SeqCst);
        let change = tokio::spawn({
            let container = container.clone();
            async move { container.set_field(DisplayField::Volume).await }
        });

        entered_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("formatter never ran");
        assert_eq!(container.state(), ViewState::Loading);

        resume_tx.send(()).unwrap();
        change.await.unwrap();

        let state = container.state();
        assert!(state
            .items()
            .unwrap()
            .iter()
            .all(|i| i.value.field() == DisplayField::Volume));
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_passes_settle_on_latest_records_and_field() {
        for _ in 0..50 {
            let source = Arc::new(MockSource::streaming());
            source.set_records(records());
            let container = Arc::new(container(source.clone()));
            let mut rx = container.subscribe();

            container.start();
            wait_for(&mut rx, |s| s.items().is_some()).await;

            let change = tokio::spawn({
                let container = container.clone();
                async move { container.set_field(DisplayField::Volume).await }
            });
            source.push(Ok(records()[..1].to_vec()));
            source.push(Ok(records()[..2].to_vec()));
            source.push(Ok(records()[1..2].to_vec()));
            change.await.unwrap();

            let state = wait_for(&mut rx, |s| {
                s.items().is_some_and(|i| {
                    i.len() == 1
                        && i[0].coin_code == "ETH"
                        && i[0].value == DisplayValue::Volume("$15.00 B".to_string())
                })
            })
            .await;
            sleep(Duration::from_millis(5)).await;
            assert_eq!(container.state(), state);

            container.shutdown();
        }
    }

    #[tokio::test]
    async fn test_observers_receive_latest_state() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = container(source);
        let mut rx = container.subscribe();

        container.refresh().await;
        container.set_field(DisplayField::Volume).await;

        let state = wait_for(&mut rx, |s| !s.is_loading()).await;
        assert!(state
            .items()
            .unwrap()
            .iter()
            .all(|i| i.value.field() == DisplayField::Volume));
    }

    #[tokio::test]
    async fn test_background_task_follows_source_stream() {
        let source = Arc::new(MockSource::streaming());
        source.set_records(records());
        let container = container(source.clone());
        let mut rx = container.subscribe();

        container.start();
        assert!(container.is_running());

        let state = wait_for(&mut rx, |s| s.items().is_some()).await;
        assert_eq!(state.items().unwrap().len(), 3);

        source.push(Ok(records()[..1].to_vec()));
        let state = wait_for(&mut rx, |s| s.items().is_some_and(|i| i.len() == 1)).await;
        assert_eq!(state.items().unwrap()[0].coin_code, "BTC");

        source.push(Err(crate::error::SourceError::unavailable("feed closed")));
        let state = wait_for(&mut rx, |s| s.error().is_some()).await;
        assert_eq!(state, ViewState::Error("feed closed".to_string()));

        assert_eq!(container.fetch_count().await, 1);
        assert_eq!(container.metrics().await.pushed_updates, 1);

        container.shutdown();
        assert!(!container.is_running());
    }

    #[tokio::test]
    async fn test_background_task_follows_currency_provider() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let currencies = Arc::new(CurrencyManager::default());
        let container = MarketListContainer::new(
            source.clone(),
            currencies.clone(),
            Formatter::default(),
            ContainerConfig::default().with_poll_interval(None),
        );
        let mut rx = container.subscribe();

        container.start();
        wait_for(&mut rx, |s| s.items().is_some()).await;

        currencies.set_base_currency(Currency::eur());
        let state = wait_for(&mut rx, |s| {
            s.items()
                .is_some_and(|i| i[0].coin_rate.starts_with('€'))
        })
        .await;

        assert_eq!(state.items().unwrap().len(), 3);
        assert_eq!(source.currencies(), vec!["USD", "EUR"]);
    }

    #[tokio::test]
    async fn test_background_task_polls_fetch_only_sources() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = container_with(
            source.clone(),
            ContainerConfig::default().with_poll_interval(Some(Duration::from_millis(20))),
        );

        container.start();

        let deadline = Instant::now() + Duration::from_secs(2);
        while source.call_count() < 3 && Instant::now() < deadline {
            sleep(Duration::from_millis(10)).await;
        }

        assert!(source.call_count() >= 3);
        container.shutdown();
    }

    #[tokio::test]
    async fn test_currency_change_resubscribes_source_stream() {
        let source = Arc::new(MockSource::streaming());
        source.set_records(records());
        let container = container(source.clone());
        let mut rx = container.subscribe();

        container.start();
        wait_for(&mut rx, |s| s.items().is_some()).await;

        container.set_currency(Currency::eur()).await;

        let deadline = Instant::now() + Duration::from_secs(2);
        while source.subscriptions().len() < 2 && Instant::now() < deadline {
            sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(source.subscriptions(), vec!["USD", "EUR"]);

        source.push(Ok(records()[..1].to_vec()));
        let state = wait_for(&mut rx, |s| s.items().is_some_and(|i| i.len() == 1)).await;
        assert_eq!(state.items().unwrap()[0].coin_rate, "€45,000.123456");
        assert_eq!(source.currencies(), vec!["USD", "EUR"]);
    }

    #[tokio::test]
    async fn test_stale_currency_updates_are_dropped() {
        let source = Arc::new(MockSource::new());
        source.set_records(records());
        let container = container(source.clone());

        container.set_currency(Currency::eur()).await;
        container
            .shared
            .deliver(Ok(records()[..1].to_vec()), "USD", PassOrigin::Pushed)
            .await;

        assert_eq!(container.state().items().map(|i| i.len()), Some(3));
        assert_eq!(container.metrics().await.pushed_updates, 0);
    }

    #[tokio::test]
    async fn test_polling_resumes_when_source_stream_ends() {
        let source = Arc::new(MockSource::streaming());
        source.set_records(records());
        let container = container_with(
            source.clone(),
            ContainerConfig::default().with_poll_interval(Some(Duration::from_millis(20))),
        );
        let mut rx = container.subscribe();

        container.start();
        wait_for(&mut rx, |s| s.items().is_some()).await;
        sleep(Duration::from_millis(60)).await;
        assert_eq!(source.call_count(), 1);

        source.close_streams();

        let deadline = Instant::now() + Duration::from_secs(2);
        while source.call_count() < 3 && Instant::now() < deadline {
            sleep(Duration::from_millis(10)).await;
        }
        assert!(source.call_count() >= 3);
        container.shutdown();
    }
}
