use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use sift_core::ExtractionSource;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    rejected_total: AtomicU64,
    rules_total: AtomicU64,
    delegate_success_total: AtomicU64,
    fallback_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub rejected_total: u64,
    pub rules_total: u64,
    pub delegate_success_total: u64,
    pub fallback_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_source(&self, source: ExtractionSource) {
        let counter = match source {
            ExtractionSource::Rules => &self.rules_total,
            ExtractionSource::Delegate => &self.delegate_success_total,
            ExtractionSource::Fallback => &self.fallback_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let rules = self.rules_total.load(Ordering::Relaxed);
        let delegate_success = self.delegate_success_total.load(Ordering::Relaxed);
        let fallback = self.fallback_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);
        // Latency is only observed for classified requests, never rejections.
        let classified = rules + delegate_success + fallback;

        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            rules_total: rules,
            delegate_success_total: delegate_success,
            fallback_total: fallback,
            avg_latency_millis: if classified == 0 {
                0.0
            } else {
                latency as f64 / 1_000.0 / classified as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,sift_api=info,sift_strategy=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
