use std::collections::HashMap;

use mars_core::StatusMessage;
use tokio::time::Instant;

use crate::handle::{JobReply, ReplySender};
use crate::{AsynchError, ProcessKey};

/// A submitted job waiting for its status message
pub(crate) struct PendingJob {
    pub(crate) process_key: ProcessKey,
    pub(crate) job_name: String,
    pub(crate) submitted_at: Instant,
    pub(crate) expires_at: Instant,
    reply: ReplySender,
}

impl PendingJob {
    pub(crate) fn new(
        process_key: ProcessKey,
        job_name: String,
        submitted_at: Instant,
        expires_at: Instant,
        reply: ReplySender,
    ) -> Self {
        Self {
            process_key,
            job_name,
            submitted_at,
            expires_at,
            reply,
        }
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    /// Returns false if the caller already dropped its handle.
    pub(crate) fn resolve(self, message: StatusMessage) -> bool {
        self.reply.send(Ok(JobReply::Message(message))).is_ok()
    }

    pub(crate) fn reject(self, error: AsynchError) -> bool {
        self.reply.send(Err(error)).is_ok()
    }

    pub(crate) fn expired_error(&self) -> AsynchError {
        AsynchError::ExpiredJob {
            process_key: self.process_key.to_string(),
            job_name: self.job_name.clone(),
        }
    }
}

/// Pending jobs keyed by process key
#[derive(Default)]
pub(crate) struct PendingJobs {
    jobs: HashMap<ProcessKey, PendingJob>,
}

impl PendingJobs {
    /// Insert `job`, handing back any job already holding its key.
    pub(crate) fn insert(&mut self, job: PendingJob) -> Option<PendingJob> {
        self.jobs.insert(job.process_key.clone(), job)
    }

    pub(crate) fn take(&mut self, process_key: &str) -> Option<PendingJob> {
        self.jobs.remove(process_key)
    }

    /// Remove and return every job whose deadline is at or before `now`,
    /// oldest deadline first.
    pub(crate) fn sweep_expired(&mut self, now: Instant) -> Vec<PendingJob> {
        let expired_keys: Vec<ProcessKey> = self
            .jobs
            .values()
            .filter(|job| job.is_expired(now))
            .map(|job| job.process_key.clone())
            .collect();

        let mut expired: Vec<PendingJob> = expired_keys
            .iter()
            .filter_map(|key| self.jobs.remove(key))
            .collect();
        expired.sort_by_key(|job| job.expires_at);
        expired
    }

    pub(crate) fn len(&self) -> usize {
        self.jobs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub(crate) fn keys(&self) -> Vec<ProcessKey> {
        let mut keys: Vec<ProcessKey> = self.jobs.keys().cloned().collect();
        keys.sort();
        keys
    }
}
