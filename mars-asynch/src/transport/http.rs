use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::trace;

use super::{RequestBody, Transport, TransportRequest, TransportResponse};
use crate::TransportError;

/// `reqwest`-backed transport.
///
/// Relative endpoints (the defaults are `process/initiateJob` and
/// `process/checkStatus`) are joined onto the base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Reuse an existing client (cookie store, proxies, TLS roots, ...).
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: None,
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            None => url.to_string(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.resolve(&request.url);
        trace!(url = %url, "POST");

        let mut builder = self.client.post(&url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match request.body {
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Form(body) => builder.body(body),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::connect(url.clone(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::status(url, status.as_u16()));
        }

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let text = response.text().await.map_err(|e| TransportError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        Ok(TransportResponse {
            status: status.as_u16(),
            headers,
            body: decode_body(&text),
        })
    }
}

// Submission bodies of no-wait jobs are not always JSON.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
