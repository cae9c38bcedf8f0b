//! Transports execute a built `HttpRequest` and return whatever the server
//! answered.
//!
//! A transport never classifies status codes: a 500 is a successful
//! transport call. `Err` is reserved for the case where no response was
//! received.
//!
//! Two adapters are provided. [`FetchTransport`] issues one reqwest call per
//! request. [`InterceptedTransport`] wraps any transport with ordered
//! request/response hooks. [`MockTransport`] replays scripted responses for
//! tests.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

mod fetch;
mod intercept;
pub mod mock;

pub use fetch::FetchTransport;
pub use intercept::{DefaultHeaders, InterceptedTransport, Interceptor, TraceInterceptor};
pub use mock::MockTransport;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
