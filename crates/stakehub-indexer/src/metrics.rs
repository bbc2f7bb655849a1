// crates/stakehub-indexer/src/metrics.rs

use {
    std::{
        collections::BTreeMap,
        sync::{Arc, Mutex},
        time::{Duration, Instant},
    },
    tokio::{task::JoinHandle, time::interval},
    tracing::info,
};

/// Counters for the event indexer.
#[derive(Debug)]
pub struct IndexingMetrics {
    start_time: Instant,
    pub events_processed: usize,
    pub events_failed: usize,
    pub events_skipped: usize,
    pub events_by_kind: BTreeMap<&'static str, usize>,
    pub last_processed_block: u64,
    pub events_per_second: f64,
}

impl Default for IndexingMetrics {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            events_processed: 0,
            events_failed: 0,
            events_skipped: 0,
            events_by_kind: BTreeMap::new(),
            last_processed_block: 0,
            events_per_second: 0.0,
        }
    }
}

impl IndexingMetrics {
    pub fn record_processed(&mut self, kind: &'static str, block: u64) {
        self.events_processed += 1;
        *self.events_by_kind.entry(kind).or_default() += 1;
        self.last_processed_block = self.last_processed_block.max(block);
    }

    pub fn record_failure(&mut self) {
        self.events_failed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.events_skipped += 1;
    }

    pub fn update_rates(&mut self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.events_per_second = self.events_processed as f64 / elapsed;
        }
    }

    pub fn log_metrics(&self) {
        info!(
            "📊 Indexing metrics: {} events ({:.2}/s), {} failed, {} skipped, last block: {}",
            self.events_processed,
            self.events_per_second,
            self.events_failed,
            self.events_skipped,
            self.last_processed_block,
        );
        for (kind, count) in &self.events_by_kind {
            info!("   {}: {}", kind, count);
        }
    }
}

/// Logs the metrics every `period` until the returned task is aborted.
pub fn spawn_reporter(metrics: Arc<Mutex<IndexingMetrics>>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Ok(mut m) = metrics.lock() {
                m.update_rates();
                m.log_metrics();
            }
        }
    })
}
