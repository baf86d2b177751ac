//! In-process transport for exercising the client without a network.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::transport::{HttpRequest, HttpResponse, Transport};
use super::ApiError;

type Handler = dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync;

/// Answers each request through a handler and records what was sent.
/// Yields once per call so concurrent requests interleave like real I/O.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_path(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        Ok((self.handler)(&request))
    }
}

pub fn json(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string(),
    }
}
