use serde_json::{json, Value};
use thiserror::Error;

/// Result type for job client operations
pub type AsynchResult<T> = Result<T, AsynchError>;

/// Failures of a single HTTP exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl TransportError {
    pub fn connect(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connect {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }
}

/// Ways a submitted job can fail to produce a reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsynchError {
    #[error("expired job: {process_key} ({job_name})")]
    ExpiredJob {
        process_key: String,
        job_name: String,
    },

    #[error("submission of job '{job_name}' failed: {source}")]
    Submission {
        job_name: String,
        #[source]
        source: TransportError,
    },

    #[error("server returned no process key for job '{job_name}'")]
    MissingProcessKey { job_name: String },

    #[error("process key {process_key} was issued again by the server")]
    DuplicateProcessKey { process_key: String },

    #[error("payload for job '{job_name}' is not an object: {message}")]
    InvalidPayload { job_name: String, message: String },

    #[error("job client stopped before the job settled")]
    ClientStopped,
}

impl AsynchError {
    /// Short machine-readable label, e.g. `"expired job"`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExpiredJob { .. } => "expired job",
            Self::Submission { .. } => "submission failed",
            Self::MissingProcessKey { .. } => "missing process key",
            Self::DuplicateProcessKey { .. } => "duplicate process key",
            Self::InvalidPayload { .. } => "invalid payload",
            Self::ClientStopped => "client stopped",
        }
    }

    /// Structured rejection reason handed to UI code.
    pub fn reason(&self) -> Value {
        let mut reason = json!({ "error": self.label() });
        match self {
            Self::ExpiredJob {
                process_key,
                job_name,
            } => {
                reason["processkey"] = json!(process_key);
                reason["jobName"] = json!(job_name);
            }
            Self::DuplicateProcessKey { process_key } => {
                reason["processkey"] = json!(process_key);
            }
            Self::Submission { job_name, source } => {
                reason["jobName"] = json!(job_name);
                reason["message"] = json!(source.to_string());
            }
            Self::MissingProcessKey { job_name } => {
                reason["jobName"] = json!(job_name);
            }
            Self::InvalidPayload { job_name, message } => {
                reason["jobName"] = json!(job_name);
                reason["message"] = json!(message);
            }
            Self::ClientStopped => {}
        }
        reason
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Self::ExpiredJob { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_reason_shape() {
        let error = AsynchError::ExpiredJob {
            process_key: "pk-1".to_string(),
            job_name: "upload".to_string(),
        };

        assert!(error.is_expired());
        assert_eq!(error.reason()["error"], "expired job");
        assert_eq!(error.reason()["processkey"], "pk-1");
    }

    #[test]
    fn test_submission_keeps_transport_source() {
        let error = AsynchError::Submission {
            job_name: "export".to_string(),
            source: TransportError::status("process/initiateJob", 502),
        };

        let source = std::error::Error::source(&error).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("process/initiateJob answered with status 502")
        );
        assert_eq!(error.reason()["error"], "submission failed");
    }
}
