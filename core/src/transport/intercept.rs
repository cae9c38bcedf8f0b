//! Intercepted HTTP client adapter.
//!
//! # Design
//! Wraps an inner transport with a chain of [`Interceptor`]s, in the manner of
//! an axios instance. Request hooks run in registration order; response and
//! error hooks run in reverse, so the first interceptor registered is the
//! outermost layer. Token injection and 401 handling are not interceptors:
//! they live in the request builder and session invalidator so that every
//! transport gets them.

use std::sync::Arc;

use async_trait::async_trait;

use super::Transport;
use crate::error::TransportError;
use crate::http::{find_header, HttpRequest, HttpResponse};

#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Returning `Err` aborts the call before it reaches the network.
    async fn on_request(&self, request: HttpRequest) -> Result<HttpRequest, TransportError> {
        Ok(request)
    }

    async fn on_response(&self, response: HttpResponse) -> HttpResponse {
        response
    }

    async fn on_error(&self, error: TransportError) -> TransportError {
        error
    }
}

pub struct InterceptedTransport<T> {
    inner: T,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl<T: Transport> InterceptedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            interceptors: Vec::new(),
        }
    }

    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for InterceptedTransport<T> {
    async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, TransportError> {
        for interceptor in &self.interceptors {
            request = match interceptor.on_request(request).await {
                Ok(request) => request,
                Err(mut err) => {
                    for interceptor in self.interceptors.iter().rev() {
                        err = interceptor.on_error(err).await;
                    }
                    return Err(err);
                }
            };
        }

        match self.inner.send(request).await {
            Ok(mut response) => {
                for interceptor in self.interceptors.iter().rev() {
                    response = interceptor.on_response(response).await;
                }
                Ok(response)
            }
            Err(mut err) => {
                for interceptor in self.interceptors.iter().rev() {
                    err = interceptor.on_error(err).await;
                }
                Err(err)
            }
        }
    }
}

/// Adds headers the request does not already carry.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: Vec<(String, String)>,
}

impl DefaultHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[async_trait]
impl Interceptor for DefaultHeaders {
    async fn on_request(&self, mut request: HttpRequest) -> Result<HttpRequest, TransportError> {
        for (name, value) in &self.headers {
            if find_header(&request.headers, name).is_none() {
                request.headers.push((name.clone(), value.clone()));
            }
        }
        Ok(request)
    }
}

/// Logs each exchange at debug level. Header values are not logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceInterceptor;

#[async_trait]
impl Interceptor for TraceInterceptor {
    async fn on_request(&self, request: HttpRequest) -> Result<HttpRequest, TransportError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        Ok(request)
    }

    async fn on_response(&self, response: HttpResponse) -> HttpResponse {
        tracing::debug!(status = response.status, "received response");
        response
    }

    async fn on_error(&self, error: TransportError) -> TransportError {
        tracing::debug!(%error, "request failed without response");
        error
    }
}
