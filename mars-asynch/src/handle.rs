use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use mars_core::StatusMessage;
use pin_project::pin_project;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::{AsynchError, AsynchResult};

pub(crate) type ReplySender = oneshot::Sender<AsynchResult<JobReply>>;

/// What a settled job handle yields
#[derive(Debug, Clone, PartialEq)]
pub enum JobReply {
    /// Status message that answered the job's process key
    Message(StatusMessage),
    /// Raw submission response body of a no-wait job
    Immediate(Value),
}

impl JobReply {
    pub fn into_message(self) -> Option<StatusMessage> {
        match self {
            Self::Message(message) => Some(message),
            Self::Immediate(_) => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Message(message) => serde_json::to_value(message).unwrap_or(Value::Null),
            Self::Immediate(value) => value,
        }
    }
}

/// Caller-side handle of a submitted job.
///
/// Resolves exactly once: with the matching status message, with the
/// submission body for no-wait jobs, or with an [`AsynchError`]. Dropping
/// the handle does not cancel the job; its pending entry is cleaned up by a
/// later message or by the expiry sweep.
#[pin_project]
#[derive(Debug)]
pub struct JobHandle {
    #[pin]
    receiver: oneshot::Receiver<AsynchResult<JobReply>>,
}

impl JobHandle {
    pub(crate) fn channel() -> (ReplySender, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }

    pub(crate) fn rejected(error: AsynchError) -> Self {
        let (sender, handle) = Self::channel();
        let _ = sender.send(Err(error));
        handle
    }
}

impl Future for JobHandle {
    type Output = AsynchResult<JobReply>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project()
            .receiver
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(AsynchError::ClientStopped)))
    }
}
