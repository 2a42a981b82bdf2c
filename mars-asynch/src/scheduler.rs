use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::Instant;

/// Clock and timer used by the poll loop and the expiry sweep
pub trait Scheduler: Send + Sync {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Scheduler backed by the tokio timer.
///
/// Follows tokio's clock, so `tokio::time::pause` and `advance` drive it in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}
