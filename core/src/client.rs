//! The API façade used by application code.
//!
//! # Design
//! `ApiClient` composes the request builder, a transport, the response
//! interpreter and the session invalidator. Every call follows the same
//! path: build (capturing the current token), send, interpret, then let the
//! invalidator see the result before it is returned. The only state is the
//! shared token store.

use std::sync::Arc;

use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::request::{RequestBuilder, RequestDescriptor};
use crate::response::{interpret_outcome, Payload};
use crate::session::SessionInvalidator;
use crate::token::{SessionToken, TokenStore};
use crate::transport::{FetchTransport, Transport};
use crate::types::{AuthResponse, Credentials, Registration};

const LOGIN_RESOURCE: &str = "auth/login";
const REGISTER_RESOURCE: &str = "auth/register";

#[derive(Clone)]
pub struct ApiClient {
    builder: RequestBuilder,
    transport: Arc<dyn Transport>,
    invalidator: SessionInvalidator,
    store: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        transport: impl Transport + 'static,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            builder: RequestBuilder::new(config, store.clone()),
            transport: Arc::new(transport),
            invalidator: SessionInvalidator::new(store.clone()),
            store,
        }
    }

    /// Client backed by [`FetchTransport`].
    pub fn fetch(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Self {
        Self::new(config, FetchTransport::new(), store)
    }

    pub fn base_url(&self) -> &str {
        self.builder.base_url()
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub async fn is_authenticated(&self) -> Result<bool, ApiError> {
        Ok(self.store.get().await?.is_some())
    }

    /// Sends one request through the full pipeline.
    pub async fn request(&self, descriptor: &RequestDescriptor) -> Result<Payload, ApiError> {
        let request = self.builder.build(descriptor).await?;
        let outcome = self.transport.send(request).await;
        self.invalidator.observe(interpret_outcome(outcome)).await
    }

    /// `GET resource/`. Envelopes are returned as-is.
    pub async fn list(&self, resource: &str) -> Result<Payload, ApiError> {
        self.request(&RequestDescriptor::get(resource)).await
    }

    /// `GET resource/id/`, or the collection when `id` is `None`.
    pub async fn get(&self, resource: &str, id: Option<&str>) -> Result<Payload, ApiError> {
        let mut descriptor = RequestDescriptor::get(resource);
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            descriptor = descriptor.with_id(id);
        }
        self.request(&descriptor).await
    }

    /// `POST resource/` with `payload` as the JSON body.
    pub async fn create<T: Serialize + ?Sized>(
        &self,
        resource: &str,
        payload: &T,
    ) -> Result<Payload, ApiError> {
        let descriptor = RequestDescriptor::post(resource).with_json(payload)?;
        self.request(&descriptor).await
    }

    /// Authenticates and stores the returned access token.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.authenticate(LOGIN_RESOURCE, &credentials).await
    }

    /// Creates an account and stores the returned access token.
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        self.authenticate(REGISTER_RESOURCE, registration).await
    }

    /// Drops the stored session. No request is sent.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.store.clear().await?;
        tracing::debug!("session cleared by logout");
        Ok(())
    }

    async fn authenticate<T: Serialize + ?Sized>(
        &self,
        resource: &str,
        body: &T,
    ) -> Result<AuthResponse, ApiError> {
        let auth: AuthResponse = self.create(resource, body).await?.into_json()?;
        self.store
            .set(SessionToken::new(auth.tokens.access.clone()))
            .await?;
        tracing::debug!(resource, "session established");
        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::token::MemoryTokenStore;
    use crate::transport::MockTransport;
    use crate::TransportError;
    use serde_json::json;

    const BASE: &str = "http://api.test/api";

    fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
        HttpResponse::new(status, body.to_string()).with_header("content-type", "application/json")
    }

    fn client(store: Arc<MemoryTokenStore>) -> (ApiClient, MockTransport) {
        let mock = MockTransport::new();
        let client = ApiClient::new(&ClientConfig::new(BASE), mock.clone(), store);
        (client, mock)
    }

    fn logged_in() -> Arc<MemoryTokenStore> {
        Arc::new(MemoryTokenStore::with_token(SessionToken::new("tok")))
    }

    #[tokio::test]
    async fn list_returns_array_unchanged() {
        let (client, mock) = client(logged_in());
        let tasks = json!([{"id": 1, "name": "sync"}, {"id": 2, "name": "export"}]);
        mock.respond(HttpMethod::Get, &format!("{BASE}/tasks/"), json_response(200, tasks.clone()));

        let payload = client.list("tasks").await.unwrap();

        assert_eq!(payload, Payload::Json(tasks));
        let sent = mock.last_request().unwrap();
        assert_eq!(sent.header("authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn get_with_and_without_id() {
        let (client, mock) = client(logged_in());
        mock.respond_default(json_response(200, json!({})));

        client.get("courses", Some("5")).await.unwrap();
        client.get("courses", None).await.unwrap();
        client.get("courses", Some("")).await.unwrap();

        let urls: Vec<_> = mock.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                format!("{BASE}/courses/5/"),
                format!("{BASE}/courses/"),
                format!("{BASE}/courses/"),
            ]
        );
    }

    #[tokio::test]
    async fn create_returns_created_object_and_keeps_token() {
        let store = logged_in();
        let (client, mock) = client(store.clone());
        let created = json!({"id": 9, "name": "x"});
        mock.respond(HttpMethod::Post, &format!("{BASE}/tasks/"), json_response(201, created.clone()));

        let payload = client.create("tasks", &json!({"name": "x"})).await.unwrap();

        assert_eq!(payload, Payload::Json(created));
        assert_eq!(store.get().await.unwrap(), Some(SessionToken::new("tok")));
        let sent = mock.last_request().unwrap();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.body.as_deref(), Some(r#"{"name":"x"}"#));
    }

    #[tokio::test]
    async fn unauthorized_clears_session_for_next_request() {
        let store = logged_in();
        let (client, mock) = client(store.clone());
        mock.respond_default(HttpResponse::new(401, "token expired"));

        let err = client.list("tasks").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!client.is_authenticated().await.unwrap());

        let _ = client.list("tasks").await;
        assert!(mock.last_request().unwrap().header("authorization").is_none());
    }

    #[tokio::test]
    async fn forbidden_keeps_session() {
        let store = logged_in();
        let (client, mock) = client(store.clone());
        mock.respond_default(HttpResponse::new(403, "forbidden"));

        let err = client.list("tasks").await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(client.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn transport_failure_surfaces_without_status() {
        let (client, mock) = client(logged_in());
        mock.fail_default(TransportError::Connect("refused".to_string()));

        let err = client.list("tasks").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
        assert_eq!(err.status(), None);
        assert!(client.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn login_stores_access_token() {
        let store = Arc::new(MemoryTokenStore::new());
        let (client, mock) = client(store.clone());
        mock.respond(
            HttpMethod::Post,
            &format!("{BASE}/auth/login/"),
            json_response(
                200,
                json!({"tokens": {"access": "new-access", "refresh": "r"}, "user": {"username": "ola"}}),
            ),
        );

        let auth = client.login("ola", "secret").await.unwrap();

        assert_eq!(auth.user["username"], "ola");
        assert_eq!(store.get().await.unwrap(), Some(SessionToken::new("new-access")));
        let sent = mock.last_request().unwrap();
        let body: serde_json::Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"username": "ola", "password": "secret"}));
        assert!(sent.header("authorization").is_none());
    }

    #[tokio::test]
    async fn failed_login_leaves_store_empty() {
        let store = Arc::new(MemoryTokenStore::new());
        let (client, mock) = client(store.clone());
        mock.respond_default(json_response(401, json!({"error": "bad credentials"})));

        let err = client.login("ola", "wrong").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_response_without_tokens_is_a_decode_failure() {
        let store = Arc::new(MemoryTokenStore::new());
        let (client, mock) = client(store.clone());
        mock.respond_default(json_response(200, json!({"user": {}})));

        let err = client.login("ola", "pw").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_without_network() {
        let store = logged_in();
        let (client, mock) = client(store.clone());

        client.logout().await.unwrap();

        assert!(store.get().await.unwrap().is_none());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn token_store_is_the_injected_store() {
        let store = logged_in();
        let (client, _) = client(store.clone());

        assert_eq!(client.base_url(), BASE);
        client.token_store().clear().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
        assert!(!client.is_authenticated().await.unwrap());
    }
}
