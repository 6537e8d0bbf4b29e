//! Pipeline metrics collection and reporting
//!
//! Tracks how often the container fetched from its source versus re-running
//! the formatter over cached records, plus fetch latency and success rate.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of fetch samples to keep for latency calculation
const MAX_SAMPLES: usize = 100;

/// Snapshot of the container's pipeline metrics
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineMetrics {
    /// Name of the source
    pub source_name: String,
    /// Number of fetches issued to the source
    pub fetch_count: u64,
    /// Number of fetches that failed
    pub failed_fetches: u64,
    /// Number of passes that reused cached records
    pub reformat_count: u64,
    /// Number of updates pushed by the source
    pub pushed_updates: u64,
    /// 50th percentile fetch latency in milliseconds
    pub fetch_latency_p50_ms: f64,
    /// 99th percentile fetch latency in milliseconds
    pub fetch_latency_p99_ms: f64,
    /// Fetch success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Rows produced by the last formatting pass
    pub last_item_count: usize,
    /// When the last formatting pass completed
    pub last_pass_at: Option<DateTime<Utc>>,
}

impl PipelineMetrics {
    /// Creates metrics with no data
    pub fn empty(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            fetch_count: 0,
            failed_fetches: 0,
            reformat_count: 0,
            pushed_updates: 0,
            fetch_latency_p50_ms: 0.0,
            fetch_latency_p99_ms: 0.0,
            success_rate: 1.0,
            last_item_count: 0,
            last_pass_at: None,
        }
    }
}

/// How the records of a formatting pass were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOrigin {
    /// Records were fetched from the source
    Fetched,
    /// Cached records were reused
    Cached,
    /// Records were pushed by the source
    Pushed,
}

#[derive(Debug)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct Counters {
    samples: VecDeque<LatencySample>,
    fetch_count: u64,
    failed_fetches: u64,
    reformat_count: u64,
    pushed_updates: u64,
    last_item_count: usize,
    last_pass_at: Option<DateTime<Utc>>,
}

/// Collects and computes pipeline metrics
pub struct MetricsCollector {
    source_name: String,
    counters: Arc<RwLock<Counters>>,
}

impl MetricsCollector {
    /// Creates a new metrics collector for a source
    pub fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            counters: Arc::new(RwLock::new(Counters {
                samples: VecDeque::with_capacity(MAX_SAMPLES),
                ..Counters::default()
            })),
        }
    }

    /// Records a fetch with its duration and success status
    pub async fn record_fetch(&self, duration: Duration, success: bool) {
        let mut counters = self.counters.write().await;
        counters.fetch_count += 1;
        if !success {
            counters.failed_fetches += 1;
        }

        if counters.samples.len() >= MAX_SAMPLES {
            counters.samples.pop_front();
        }
        counters.samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    /// Records a completed formatting pass
    pub async fn record_pass(&self, origin: PassOrigin, items: usize) {
        let mut counters = self.counters.write().await;
        match origin {
            PassOrigin::Cached => counters.reformat_count += 1,
            PassOrigin::Pushed => counters.pushed_updates += 1,
            PassOrigin::Fetched => {}
        }
        counters.last_item_count = items;
        counters.last_pass_at = Some(Utc::now());
    }

    /// Number of fetches issued so far
    pub async fn fetch_count(&self) -> u64 {
        self.counters.read().await.fetch_count
    }

    /// Computes current metrics
    pub async fn get_metrics(&self) -> PipelineMetrics {
        let counters = self.counters.read().await;
        if counters.fetch_count == 0 && counters.last_pass_at.is_none() {
            return PipelineMetrics::empty(&self.source_name);
        }

        let mut latencies: Vec<f64> = counters
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let success_rate = if counters.fetch_count > 0 {
            (counters.fetch_count - counters.failed_fetches) as f64 / counters.fetch_count as f64
        } else {
            1.0
        };

        PipelineMetrics {
            source_name: self.source_name.clone(),
            fetch_count: counters.fetch_count,
            failed_fetches: counters.failed_fetches,
            reformat_count: counters.reformat_count,
            pushed_updates: counters.pushed_updates,
            fetch_latency_p50_ms: percentile(&latencies, 50.0),
            fetch_latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            last_item_count: counters.last_item_count,
            last_pass_at: counters.last_pass_at,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}
