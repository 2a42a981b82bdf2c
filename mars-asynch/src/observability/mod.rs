//! Event stream and counters for the job client.
//!
//! Every state change is published as a [`JobEvent`] on a broadcast
//! channel and counted in [`ClientMetrics`]. Nobody listening is fine.

pub mod metrics;

pub use metrics::{ClientMetrics, MetricsSnapshot};

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::{JobEvent, PollRate, ProcessKey};

const EVENT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub(crate) struct Observability {
    events: broadcast::Sender<JobEvent>,
    metrics: Arc<ClientMetrics>,
}

impl Observability {
    pub(crate) fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            events,
            metrics: Arc::new(ClientMetrics::new()),
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    pub(crate) fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    fn publish(&self, event: JobEvent) {
        debug!(event = event.event_name(), "job event");
        let _ = self.events.send(event);
    }

    pub(crate) fn record_submitted(&self, job_name: &str, process_key: Option<&ProcessKey>) {
        self.metrics.increment_jobs_submitted();
        self.publish(JobEvent::Submitted {
            job_name: job_name.to_string(),
            process_key: process_key.cloned(),
            at: Utc::now(),
        });
    }

    pub(crate) fn record_submission_failed(&self, job_name: &str, error: &str) {
        self.metrics.increment_submission_failures();
        self.publish(JobEvent::SubmissionFailed {
            job_name: job_name.to_string(),
            error: error.to_string(),
            at: Utc::now(),
        });
    }

    pub(crate) fn record_resolved(&self, process_key: &ProcessKey, job_name: &str) {
        self.metrics.increment_jobs_resolved();
        self.publish(JobEvent::Resolved {
            process_key: process_key.clone(),
            job_name: job_name.to_string(),
            at: Utc::now(),
        });
    }

    pub(crate) fn record_expired(&self, process_key: &ProcessKey, job_name: &str) {
        self.metrics.increment_jobs_expired();
        self.publish(JobEvent::Expired {
            process_key: process_key.clone(),
            job_name: job_name.to_string(),
            at: Utc::now(),
        });
    }

    pub(crate) fn record_routed(&self, job_name: Option<&str>, process_key: Option<&str>) {
        self.metrics.increment_messages_routed();
        self.publish(JobEvent::Routed {
            job_name: job_name.map(str::to_string),
            process_key: process_key.map(str::to_string),
            at: Utc::now(),
        });
    }

    pub(crate) fn record_dropped(&self, job_name: Option<&str>, process_key: Option<&str>) {
        self.metrics.increment_messages_dropped();
        self.publish(JobEvent::Dropped {
            job_name: job_name.map(str::to_string),
            process_key: process_key.map(str::to_string),
            at: Utc::now(),
        });
    }

    pub(crate) fn record_poll_cycle(&self) {
        self.metrics.increment_poll_cycles();
    }

    pub(crate) fn record_poll_failed(&self, error: &str) {
        self.metrics.increment_poll_failures();
        self.publish(JobEvent::PollFailed {
            error: error.to_string(),
            at: Utc::now(),
        });
    }

    pub(crate) fn record_rate_changed(&self, from: PollRate, to: PollRate) {
        self.publish(JobEvent::RateChanged {
            from,
            to,
            at: Utc::now(),
        });
    }
}
