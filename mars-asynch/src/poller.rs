use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::JobClient;

/// Handle to a running poll loop.
///
/// Dropping the handle stops the loop as well.
pub struct PollerHandle {
    shutdown_tx: oneshot::Sender<()>,
    join_handle: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling and wait for the loop to exit.
    ///
    /// A cycle already in flight finishes first. Pending jobs stay pending.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.join_handle.await {
            warn!(error = %e, "poll loop did not exit cleanly");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

pub(crate) fn spawn(client: JobClient) -> PollerHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let join_handle = tokio::spawn(async move {
        let mut delay = client.current_interval();
        info!(first_poll_ms = delay.as_millis() as u64, "poll loop started");

        loop {
            let sleep = client.scheduler().sleep(delay);
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = client.wake().notified() => {
                    delay = client.fast_interval();
                    debug!(
                        next_poll_ms = delay.as_millis() as u64,
                        "poll rescheduled at fast rate"
                    );
                }
                _ = sleep => {
                    delay = client.check_status().await;
                }
            }
        }

        info!("poll loop stopped");
    });

    PollerHandle {
        shutdown_tx,
        join_handle,
    }
}
