use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Process-wide counters for the chat assistant. Every increment is also
/// forwarded to the `metrics` facade so an installed exporter sees it.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    messages_total: AtomicU64,
    structured_search_total: AtomicU64,
    partial_search_total: AtomicU64,
    rule_command_total: AtomicU64,
    fallback_total: AtomicU64,
    backend_failures_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub messages_total: u64,
    pub structured_search_total: u64,
    pub partial_search_total: u64,
    pub rule_command_total: u64,
    pub fallback_total: u64,
    pub backend_failures_total: u64,
    pub avg_latency_millis: f64,
}

impl DispatchMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Counts one handled message under its decision kind label.
    pub fn record_decision(&self, kind: &'static str) {
        self.messages_total.fetch_add(1, Ordering::Relaxed);

        let counter = match kind {
            "structured_search" => &self.structured_search_total,
            "partial_search" => &self.partial_search_total,
            "rule_command" => &self.rule_command_total,
            _ => &self.fallback_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        metrics::counter!("skybook_dispatch_total", "decision" => kind).increment(1);
    }

    pub fn inc_backend_failure(&self) {
        self.backend_failures_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("skybook_backend_failures_total").increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        metrics::histogram!("skybook_message_latency_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let messages = self.messages_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            messages_total: messages,
            structured_search_total: self.structured_search_total.load(Ordering::Relaxed),
            partial_search_total: self.partial_search_total.load(Ordering::Relaxed),
            rule_command_total: self.rule_command_total.load(Ordering::Relaxed),
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            backend_failures_total: self.backend_failures_total.load(Ordering::Relaxed),
            avg_latency_millis: if messages == 0 {
                0.0
            } else {
                latency as f64 / messages as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,skybook_dispatch=info,skybook_client=info",
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
