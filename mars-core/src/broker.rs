use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::StatusMessage;

/// A listener registered on a broker channel.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn process(&self, message: &StatusMessage);
}

/// Anything that can take an unsolicited message off the job client's hands.
#[async_trait]
pub trait MessageRouter: Send + Sync {
    async fn route(&self, message: StatusMessage);
}

/// Wraps a synchronous closure as a [`MessageHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> MessageHandler for FnHandler<F>
where
    F: Fn(&StatusMessage) + Send + Sync,
{
    async fn process(&self, message: &StatusMessage) {
        (self.0)(message)
    }
}

/// Sugar: `broker.register("export", handler_fn(|m| ...))`.
pub fn handler_fn<F>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(&StatusMessage) + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

// Handlers are identified by allocation, not by value.
fn same_handler(a: &Arc<dyn MessageHandler>, b: &Arc<dyn MessageHandler>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

/// Named-channel registry for messages that match no pending job.
///
/// Routing never holds the channel lock across an `.await`:
/// 1) snapshot the channel's handlers (read lock, no await)
/// 2) await each handler (no lock held)
///
/// so a handler may register or deregister on the broker while it runs.
#[derive(Default)]
pub struct MessageBroker {
    channels: RwLock<HashMap<String, Vec<Arc<dyn MessageHandler>>>>,
}

impl MessageBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `handler` with `channel`.
    ///
    /// Returns false if this exact handler was already registered there.
    pub fn register(&self, channel: impl Into<String>, handler: Arc<dyn MessageHandler>) -> bool {
        let channel = channel.into();
        let mut channels = self.channels.write();
        let handlers = channels.entry(channel.clone()).or_default();

        if handlers.iter().any(|h| same_handler(h, &handler)) {
            debug!(channel = %channel, "handler already registered");
            return false;
        }

        handlers.push(handler);
        debug!(channel = %channel, handlers = handlers.len(), "registered handler");
        true
    }

    /// Remove `handler` from `channel`. Unknown pairs are a no-op.
    ///
    /// A channel left without handlers is dropped from the registry.
    pub fn deregister(&self, channel: &str, handler: &Arc<dyn MessageHandler>) -> bool {
        let mut channels = self.channels.write();
        let Some(handlers) = channels.get_mut(channel) else {
            return false;
        };

        let before = handlers.len();
        handlers.retain(|h| !same_handler(h, handler));
        let removed = before != handlers.len();

        if handlers.is_empty() {
            channels.remove(channel);
        }

        if removed {
            debug!(channel = %channel, "deregistered handler");
        }
        removed
    }

    /// Number of handlers currently listening on `channel`.
    pub fn handler_count(&self, channel: &str) -> usize {
        self.channels.read().get(channel).map_or(0, Vec::len)
    }

    /// Names of channels with at least one handler.
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn snapshot(&self, channel: &str) -> Vec<Arc<dyn MessageHandler>> {
        self.channels.read().get(channel).cloned().unwrap_or_default()
    }

    /// Deliver `message` to every handler on its `jobName` channel.
    ///
    /// Returns how many handlers received it. Zero is not an error: the
    /// server is free to push status the client never asked for.
    pub async fn dispatch(&self, message: &StatusMessage) -> usize {
        let Some(channel) = message.job_name.as_deref() else {
            info!(process_key = ?message.process_key, "message has no jobName; dropping");
            return 0;
        };

        let handlers = self.snapshot(channel);
        if handlers.is_empty() {
            info!(
                channel = %channel,
                process_key = ?message.process_key,
                "no handler registered for channel; dropping message"
            );
            return 0;
        }

        for handler in &handlers {
            handler.process(message).await;
        }

        debug!(channel = %channel, handlers = handlers.len(), "routed message");
        handlers.len()
    }
}

#[async_trait]
impl MessageRouter for MessageBroker {
    async fn route(&self, message: StatusMessage) {
        self.dispatch(&message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    fn counting_handler() -> (Arc<dyn MessageHandler>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let handler = handler_fn(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (handler, count)
    }

    #[tokio::test]
    async fn test_register_is_idempotent_per_handler() {
        let broker = MessageBroker::new();
        let (handler, count) = counting_handler();

        assert!(broker.register("broadcast", handler.clone()));
        assert!(!broker.register("broadcast", handler.clone()));
        assert_eq!(broker.handler_count("broadcast"), 1);

        let delivered = broker
            .dispatch(&StatusMessage::new().with_job_name("broadcast"))
            .await;
        assert_eq!(delivered, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_every_distinct_handler_receives_message() {
        let broker = MessageBroker::new();
        let (first, first_count) = counting_handler();
        let (second, second_count) = counting_handler();

        broker.register("export", first);
        broker.register("export", second);

        broker.route(StatusMessage::new().with_job_name("export")).await;

        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handlers_run_in_registration_order() {
        let broker = MessageBroker::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let order = order.clone();
            broker.register("ordered", handler_fn(move |_| order.lock().push(tag)));
        }

        broker.route(StatusMessage::new().with_job_name("ordered")).await;
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_deregister_twice_is_harmless() {
        let broker = MessageBroker::new();
        let (kept, _) = counting_handler();
        let (removed, _) = counting_handler();

        broker.register("layers", kept.clone());
        broker.register("layers", removed.clone());

        assert!(broker.deregister("layers", &removed));
        assert!(!broker.deregister("layers", &removed));
        assert_eq!(broker.handler_count("layers"), 1);

        // Unknown channel and unknown handler.
        assert!(!broker.deregister("missing", &kept));
        let (stranger, _) = counting_handler();
        assert!(!broker.deregister("layers", &stranger));
        assert_eq!(broker.handler_count("layers"), 1);
    }

    #[test]
    fn test_empty_channel_is_pruned() {
        let broker = MessageBroker::new();
        let (handler, _) = counting_handler();

        broker.register("upload", handler.clone());
        assert_eq!(broker.channels(), vec!["upload".to_string()]);

        broker.deregister("upload", &handler);
        assert!(broker.channels().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unregistered_channel_only_logs() {
        let broker = MessageBroker::new();
        let (handler, count) = counting_handler();
        broker.register("other", handler);

        let delivered = broker
            .dispatch(&StatusMessage::new().with_job_name("broadcast"))
            .await;

        assert_eq!(delivered, 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(logs_contain("no handler registered for channel"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_message_without_job_name_is_dropped() {
        let broker = MessageBroker::new();
        let delivered = broker.dispatch(&StatusMessage::new().with_process_key("pk")).await;

        assert_eq!(delivered, 0);
        assert!(logs_contain("message has no jobName"));
    }

    struct SelfRemoving {
        broker: Arc<MessageBroker>,
        me: parking_lot::Mutex<Option<Arc<dyn MessageHandler>>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MessageHandler for SelfRemoving {
        async fn process(&self, _message: &StatusMessage) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(me) = self.me.lock().take() {
                self.broker.deregister("once", &me);
            }
        }
    }

    #[tokio::test]
    async fn test_handler_may_deregister_during_dispatch() {
        let broker = Arc::new(MessageBroker::new());
        let handler = Arc::new(SelfRemoving {
            broker: broker.clone(),
            me: parking_lot::Mutex::new(None),
            calls: AtomicUsize::new(0),
        });
        let as_dyn: Arc<dyn MessageHandler> = handler.clone();
        *handler.me.lock() = Some(as_dyn.clone());

        let (other, other_count) = counting_handler();
        broker.register("once", as_dyn);
        broker.register("once", other);

        let message = StatusMessage::new().with_job_name("once");
        assert_eq!(broker.dispatch(&message).await, 2);
        assert_eq!(other_count.load(Ordering::SeqCst), 1);

        // Second round only reaches the handler that stayed.
        assert_eq!(broker.dispatch(&message).await, 1);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(other_count.load(Ordering::SeqCst), 2);
    }
}
