//! # mars-asynch
//!
//! Client for the asynchronous job protocol spoken by the Explorer map
//! server.
//!
//! A job is POSTed to the job endpoint and answered with a `processkey`
//! header. The client then polls the status endpoint, fast while anything
//! is pending and slow otherwise, and resolves each [`JobHandle`] with the
//! status message carrying its key. Jobs that outlive their time-to-live are
//! rejected with [`AsynchError::ExpiredJob`]. Messages nobody is waiting on
//! are handed to a [`mars_core::MessageRouter`], usually a
//! [`mars_core::MessageBroker`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mars_asynch::prelude::*;
//! use mars_core::MessageBroker;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), AsynchError> {
//! let transport = HttpTransport::new().with_base_url("http://localhost:8080");
//! let client = JobClient::new(Arc::new(transport))
//!     .with_broker(Arc::new(MessageBroker::new()));
//! let poller = client.start();
//!
//! let reply = client
//!     .submit("exportLayer", json!({ "layer": "roads" }), SubmitOptions::new())
//!     .await?;
//! println!("{:?}", reply.into_message());
//!
//! poller.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handle;
pub mod observability;
pub mod poller;
pub mod scheduler;
pub mod transport;
pub mod types;

mod pending;

pub use client::JobClient;
pub use config::{AsynchConfig, MAX_TIME_TO_LIVE};
pub use error::{AsynchError, AsynchResult, TransportError};
pub use handle::{JobHandle, JobReply};
pub use observability::{ClientMetrics, MetricsSnapshot};
pub use poller::PollerHandle;
pub use scheduler::{Scheduler, TokioScheduler};
pub use types::*;

/// Convenient imports for job submitters
pub mod prelude {
    pub use crate::{
        AsynchConfig, AsynchError, AsynchResult, JobClient, JobEvent, JobHandle, JobReply,
        PollRate, PollState, PollerHandle, ProcessKey, SubmitOptions,
    };

    #[cfg(feature = "http")]
    pub use crate::transport::HttpTransport;
    pub use crate::transport::{MemoryTransport, Transport};
}
