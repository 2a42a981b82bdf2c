use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use super::{Transport, TransportRequest, TransportResponse};
use crate::TransportError;

type Reply = Result<TransportResponse, TransportError>;
type Responder = Arc<dyn Fn(&TransportRequest) -> Reply + Send + Sync>;

/// In-process transport for tests and offline development.
///
/// Answers each POST, in order of preference, with:
/// 1) the next reply queued for the URL
/// 2) the responder installed for the URL
/// 3) `200 {}`
///
/// Every request is recorded.
#[derive(Default)]
pub struct MemoryTransport {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    responders: Mutex<HashMap<String, Responder>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot reply for `url`.
    pub fn reply(&self, url: impl Into<String>, response: TransportResponse) {
        self.queued
            .lock()
            .entry(url.into())
            .or_default()
            .push_back(Ok(response));
    }

    /// Queue a one-shot failure for `url`.
    pub fn fail(&self, url: impl Into<String>, error: TransportError) {
        self.queued
            .lock()
            .entry(url.into())
            .or_default()
            .push_back(Err(error));
    }

    /// Answer every unscripted request to `url` with `responder`.
    pub fn respond_with<F>(&self, url: impl Into<String>, responder: F)
    where
        F: Fn(&TransportRequest) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        self.responders.lock().insert(url.into(), Arc::new(responder));
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Requests seen so far for `url`.
    pub fn requests_to(&self, url: &str) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(request.clone());

        if let Some(reply) = self
            .queued
            .lock()
            .get_mut(&request.url)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }

        let responder = self.responders.lock().get(&request.url).cloned();
        match responder {
            Some(responder) => responder(&request),
            None => Ok(TransportResponse::json(json!({}))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RequestBody;

    fn request(url: &str) -> TransportRequest {
        TransportRequest {
            url: url.to_string(),
            headers: vec![("job".to_string(), "ping".to_string())],
            body: RequestBody::Json(json!({})),
        }
    }

    #[tokio::test]
    async fn test_queued_then_responder_then_default() {
        let transport = MemoryTransport::new();
        transport.reply("a", TransportResponse::json(json!({ "n": 1 })));
        transport.respond_with("a", |req| {
            Ok(TransportResponse::json(json!({ "job": req.header("job") })))
        });

        let first = transport.post(request("a")).await.unwrap();
        let second = transport.post(request("a")).await.unwrap();
        let other = transport.post(request("b")).await.unwrap();

        assert_eq!(first.body, json!({ "n": 1 }));
        assert_eq!(second.body, json!({ "job": "ping" }));
        assert_eq!(other.body, json!({}));
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(transport.requests_to("a").len(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_one_shot() {
        let transport = MemoryTransport::new();
        transport.fail("a", TransportError::connect("a", "refused"));

        assert!(transport.post(request("a")).await.is_err());
        assert!(transport.post(request("a")).await.is_ok());
    }
}
