use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for one scraper instance. Observability only.
#[derive(Debug, Default)]
pub struct ScraperStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    items_scraped: AtomicU64,
    items_filtered: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub items_scraped: u64,
    pub items_filtered: u64,
}

impl ScraperStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_attempt(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self) {
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Called by extraction collaborators for each item they produce.
    pub fn record_item_scraped(&self) {
        self.items_scraped.fetch_add(1, Ordering::Relaxed);
    }

    /// Called by extraction collaborators for each item they discard.
    pub fn record_item_filtered(&self) {
        self.items_filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            items_scraped: self.items_scraped.load(Ordering::Relaxed),
            items_filtered: self.items_filtered.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.total_requests,
            &self.successful_requests,
            &self.failed_requests,
            &self.items_scraped,
            &self.items_filtered,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
