use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing client activity.
#[derive(Default)]
pub struct ClientMetrics {
    documents_uploaded: AtomicU64,
    questions_answered: AtomicU64,
    requests_failed: AtomicU64,
}

impl ClientMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully processed upload.
    pub fn record_upload(&self) {
        self.documents_uploaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an answered question.
    pub fn record_answer(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed request.
    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_uploaded: self.documents_uploaded.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of activity counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents uploaded since startup.
    pub documents_uploaded: u64,
    /// Number of questions answered since startup.
    pub questions_answered: u64,
    /// Number of requests that failed since startup.
    pub requests_failed: u64,
}
