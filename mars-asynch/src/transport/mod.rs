pub mod form;
#[cfg(feature = "http")]
pub mod http;
pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::TransportError;

#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use memory::MemoryTransport;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
/// Request header carrying the job name on submission
pub const JOB_HEADER: &str = "job";
/// Response header carrying the server-issued process key
pub const PROCESS_KEY_HEADER: &str = "processkey";

/// Body of an outgoing request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// Already form-encoded `key=value&...`
    Form(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl TransportRequest {
    /// First header named `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names are stored lower-cased
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl TransportResponse {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }
}

/// POST-only HTTP abstraction the job client talks through
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Pulls the process key out of a submission response
pub type KeyExtractor = Arc<dyn Fn(&TransportResponse) -> Option<String> + Send + Sync>;

/// Reads the `processkey` response header.
pub fn header_key_extractor() -> KeyExtractor {
    Arc::new(|response: &TransportResponse| {
        response
            .header(PROCESS_KEY_HEADER)
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_ignores_case() {
        let response = TransportResponse::json(json!({})).with_header("ProcessKey", "pk-7");

        assert_eq!(response.header("processkey"), Some("pk-7"));
        assert_eq!(response.header("PROCESSKEY"), Some("pk-7"));
        assert_eq!(header_key_extractor()(&response), Some("pk-7".to_string()));
    }

    #[test]
    fn test_response_builders() {
        let response = TransportResponse::json(json!({ "queued": true }))
            .with_status(202)
            .with_header("X-Trace", "abc");

        assert_eq!(response.status, 202);
        assert_eq!(response.header("x-trace"), Some("abc"));
        assert_eq!(response.body, json!({ "queued": true }));
    }

    #[test]
    fn test_blank_process_key_is_absent() {
        let response = TransportResponse::json(json!({})).with_header("processkey", "  ");
        assert_eq!(header_key_extractor()(&response), None);
    }
}
