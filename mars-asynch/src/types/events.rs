use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PollRate, ProcessKey};

/// Lifecycle events published by the job client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobEvent {
    /// Submission was accepted by the server
    Submitted {
        job_name: String,
        /// `None` for no-wait jobs
        process_key: Option<ProcessKey>,
        at: DateTime<Utc>,
    },

    /// Submission never produced a pending job
    SubmissionFailed {
        job_name: String,
        error: String,
        at: DateTime<Utc>,
    },

    /// A status message answered a pending job
    Resolved {
        process_key: ProcessKey,
        job_name: String,
        at: DateTime<Utc>,
    },

    /// A pending job outlived its time-to-live
    Expired {
        process_key: ProcessKey,
        job_name: String,
        at: DateTime<Utc>,
    },

    /// An unsolicited message was handed to the broker
    Routed {
        job_name: Option<String>,
        process_key: Option<String>,
        at: DateTime<Utc>,
    },

    /// An unsolicited message arrived with no broker installed
    Dropped {
        job_name: Option<String>,
        process_key: Option<String>,
        at: DateTime<Utc>,
    },

    /// The status endpoint could not be reached
    PollFailed { error: String, at: DateTime<Utc> },

    /// The poll cadence switched
    RateChanged {
        from: PollRate,
        to: PollRate,
        at: DateTime<Utc>,
    },
}

impl JobEvent {
    /// Get event type name as string
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::SubmissionFailed { .. } => "submission_failed",
            Self::Resolved { .. } => "resolved",
            Self::Expired { .. } => "expired",
            Self::Routed { .. } => "routed",
            Self::Dropped { .. } => "dropped",
            Self::PollFailed { .. } => "poll_failed",
            Self::RateChanged { .. } => "rate_changed",
        }
    }

    /// Get the timestamp from any event
    pub fn timestamp(&self) -> &DateTime<Utc> {
        match self {
            Self::Submitted { at, .. }
            | Self::SubmissionFailed { at, .. }
            | Self::Resolved { at, .. }
            | Self::Expired { at, .. }
            | Self::Routed { at, .. }
            | Self::Dropped { at, .. }
            | Self::PollFailed { at, .. }
            | Self::RateChanged { at, .. } => at,
        }
    }
}
