use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters for job client activity
#[derive(Debug, Default)]
pub struct ClientMetrics {
    jobs_submitted: AtomicU64,
    jobs_resolved: AtomicU64,
    jobs_expired: AtomicU64,
    submission_failures: AtomicU64,
    messages_routed: AtomicU64,
    messages_dropped: AtomicU64,
    poll_cycles: AtomicU64,
    poll_failures: AtomicU64,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_jobs_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_resolved(&self) {
        self.jobs_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_expired(&self) {
        self.jobs_expired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_submission_failures(&self) {
        self.submission_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_routed(&self) {
        self.messages_routed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_poll_cycles(&self) {
        self.poll_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_poll_failures(&self) {
        self.poll_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy every counter at once
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_resolved: self.jobs_resolved.load(Ordering::Relaxed),
            jobs_expired: self.jobs_expired.load(Ordering::Relaxed),
            submission_failures: self.submission_failures.load(Ordering::Relaxed),
            messages_routed: self.messages_routed.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            poll_cycles: self.poll_cycles.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ClientMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub jobs_submitted: u64,
    pub jobs_resolved: u64,
    pub jobs_expired: u64,
    pub submission_failures: u64,
    pub messages_routed: u64,
    pub messages_dropped: u64,
    pub poll_cycles: u64,
    pub poll_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_increments() {
        let metrics = ClientMetrics::new();
        metrics.increment_jobs_submitted();
        metrics.increment_jobs_submitted();
        metrics.increment_poll_failures();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.jobs_submitted, 2);
        assert_eq!(snapshot.poll_failures, 1);
        assert_eq!(snapshot.jobs_resolved, 0);
    }
}
