//! Access layer for a REST records backend.
//!
//! # Overview
//! Turns logical resource calls (`list("tasks")`, `create("tasks", ..)`)
//! into authenticated HTTP requests, classifies the responses, and manages
//! the lifecycle of the session token.
//!
//! # Design
//! - [`TokenStore`] holds at most one bearer token; memory and file backends.
//! - [`RequestBuilder`] resolves the base URL, normalizes resource paths to
//!   the backend's trailing-slash convention and attaches the token.
//! - [`interpret`] classifies a response into a [`Payload`] or [`ApiError`].
//! - [`SessionInvalidator`] clears the store whenever a 401 is observed.
//! - [`ApiClient`] composes the above over any [`Transport`].
//!
//! Requests may run concurrently. A request that captured the token before
//! another request's 401 cleared it still completes with the old token.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod session;
pub mod token;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, TokenStoreError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::{resource_url, RequestBuilder, RequestDescriptor};
pub use response::{interpret, interpret_outcome, Payload};
pub use session::SessionInvalidator;
pub use token::{FileTokenStore, MemoryTokenStore, SessionToken, TokenStore};
pub use transport::{FetchTransport, InterceptedTransport, Interceptor, MockTransport, Transport};
pub use types::{
    AuthResponse, AuthTokens, Credentials, Direction, NewTask, Registration, System, Task,
    TaskStatus,
};
