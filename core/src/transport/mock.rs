//! Scripted transport for tests.
//!
//! Replies are looked up by `(method, url)`, then by url alone, then the
//! default. Every request is recorded, including those that found no reply.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::Transport;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    Error(TransportError),
}

#[derive(Debug, Default)]
struct Script {
    by_route: HashMap<(Option<HttpMethod>, String), Reply>,
    default: Option<Reply>,
    requests: Vec<HttpRequest>,
}

/// Cloning shares the script and the request log.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reply to `method url` with `response`.
    pub fn respond(&self, method: HttpMethod, url: &str, response: HttpResponse) {
        self.script()
            .by_route
            .insert((Some(method), url.to_string()), Reply::Response(response));
    }

    /// Reply to any method on `url` with `response`.
    pub fn respond_any(&self, url: &str, response: HttpResponse) {
        self.script()
            .by_route
            .insert((None, url.to_string()), Reply::Response(response));
    }

    pub fn respond_default(&self, response: HttpResponse) {
        self.script().default = Some(Reply::Response(response));
    }

    pub fn fail(&self, url: &str, error: TransportError) {
        self.script()
            .by_route
            .insert((None, url.to_string()), Reply::Error(error));
    }

    pub fn fail_default(&self, error: TransportError) {
        self.script().default = Some(Reply::Error(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script().requests.clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.script().requests.last().cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut script = self.script();
        let reply = script
            .by_route
            .get(&(Some(request.method), request.url.clone()))
            .or_else(|| script.by_route.get(&(None, request.url.clone())))
            .or(script.default.as_ref())
            .cloned();
        let url = request.url.clone();
        script.requests.push(request);

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(error)) => Err(error),
            None => Err(TransportError::Other(format!("no mock reply for {url}"))),
        }
    }
}
