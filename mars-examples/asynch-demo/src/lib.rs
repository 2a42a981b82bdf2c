use std::sync::Arc;
use std::time::Duration;

use mars_asynch::transport::HttpTransport;
use mars_asynch::{AsynchConfig, JobClient, SubmitOptions};
use mars_core::{handler_fn, MarsConfig, MessageBroker};
use tracing::info;

/// Client and broker wired from `MARS__*` environment variables.
pub struct Demo {
    pub client: JobClient,
    pub broker: Arc<MessageBroker>,
    /// Options for the submitted job (`asynch.url_encoded`, `asynch.no_wait`)
    pub options: SubmitOptions,
}

pub fn build() -> anyhow::Result<Demo> {
    let mut store = MarsConfig::new();
    store.load_env("MARS__");
    let snapshot = store.snapshot();

    let config = AsynchConfig::from_snapshot(&snapshot)?;
    let base_url = snapshot
        .get_string("http.base_url")
        .unwrap_or_else(|| "http://127.0.0.1:8080".to_string());

    let broker = Arc::new(MessageBroker::new());
    broker.register(
        "broadcast",
        handler_fn(|message| {
            info!(text = ?message.get("text"), "server broadcast");
        }),
    );

    let mut transport = HttpTransport::new().with_base_url(base_url.clone());
    if let Some(secs) = snapshot.get_u64("http.timeout_secs") {
        transport = transport.with_timeout(Duration::from_secs(secs));
    }
    let client = JobClient::new(Arc::new(transport))
        .with_config(config)
        .with_broker(broker.clone());

    if let Some(session) = snapshot.get_string("asynch.session") {
        client.add_parameter("session", session);
    }

    let options = SubmitOptions::new()
        .url_encoded(snapshot.get_bool("asynch.url_encoded").unwrap_or(false))
        .no_wait(snapshot.get_bool("asynch.no_wait").unwrap_or(false));

    info!(base_url = %base_url, "job client ready");
    Ok(Demo {
        client,
        broker,
        options,
    })
}
