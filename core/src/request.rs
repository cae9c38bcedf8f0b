//! Turns a logical resource request into a fully specified `HttpRequest`.
//!
//! # Design
//! The backend expects every collection and entity path to end in exactly
//! one `/`. Resource identifiers arrive in whatever shape the caller had at
//! hand (`tasks`, `/tasks/`, `auth//login`), so paths are rebuilt from their
//! non-empty segments rather than patched with string trimming.
//!
//! The session token is read from the store once per `build` call. A request
//! built before a concurrent `clear` keeps the token it captured. A store that
//! cannot be read counts as holding no token, so the request still goes out
//! unauthenticated and `login` can overwrite a damaged store.
//!
//! Resource and id segments are inserted as given. Callers pass path-safe
//! ids (numbers, UUIDs, slugs); `?`, `#` and spaces are not escaped.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{find_header, HttpMethod, HttpRequest};
use crate::token::{SessionToken, TokenStore};

const JSON_CONTENT_TYPE: &str = "application/json";

/// A single logical call against the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub resource: String,
    pub id: Option<String>,
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            id: None,
            method,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(resource: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, resource)
    }

    pub fn post(resource: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, resource)
    }

    pub fn with_id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `payload` into the body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, payload: &T) -> Result<Self, ApiError> {
        let body =
            serde_json::to_value(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Builds requests against a fixed base URL, attaching the stored token.
#[derive(Clone)]
pub struct RequestBuilder {
    base_url: String,
    store: Arc<dyn TokenStore>,
}

impl RequestBuilder {
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn current_token(&self) -> Option<SessionToken> {
        match self.store.get().await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = %err, "token store unreadable, sending without a session");
                None
            }
        }
    }

    pub async fn build(&self, descriptor: &RequestDescriptor) -> Result<HttpRequest, ApiError> {
        let url = resource_url(&self.base_url, &descriptor.resource, descriptor.id.as_deref())?;

        let mut headers = descriptor.headers.clone();
        if find_header(&headers, "content-type").is_none() {
            headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
        }
        if let Some(token) = self.current_token().await {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
            headers.push(("Authorization".to_string(), token.bearer()));
        }

        let body = match (&descriptor.body, descriptor.method.allows_body()) {
            (Some(value), true) => Some(
                serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))?,
            ),
            _ => None,
        };

        tracing::debug!(method = %descriptor.method, %url, "built request");
        Ok(HttpRequest {
            method: descriptor.method,
            url,
            headers,
            body,
        })
    }
}

/// Joins `base_url`, the resource and an optional entity id into a URL that
/// ends in exactly one `/`.
pub fn resource_url(base_url: &str, resource: &str, id: Option<&str>) -> Result<String, ApiError> {
    let mut segments: Vec<&str> = resource.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(ApiError::InvalidResource(resource.to_string()));
    }
    if let Some(id) = id {
        segments.extend(id.split('/').filter(|s| !s.is_empty()));
    }

    let mut url = base_url.trim_end_matches('/').to_string();
    for segment in segments {
        url.push('/');
        url.push_str(segment);
    }
    url.push('/');
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenStoreError;
    use crate::token::MemoryTokenStore;
    use async_trait::async_trait;
    use serde_json::json;

    const BASE: &str = "http://localhost:8000/api";

    fn builder_with(store: MemoryTokenStore) -> RequestBuilder {
        RequestBuilder::new(&ClientConfig::new(BASE), Arc::new(store))
    }

    fn path_of(url: &str) -> &str {
        url.split_once("://").map(|(_, rest)| rest).unwrap_or(url)
    }

    #[test]
    fn collection_path_gets_trailing_slash() {
        assert_eq!(resource_url(BASE, "tasks", None).unwrap(), format!("{BASE}/tasks/"));
    }

    #[test]
    fn entity_id_is_its_own_segment() {
        assert_eq!(resource_url(BASE, "tasks", Some("5")).unwrap(), format!("{BASE}/tasks/5/"));
    }

    #[test]
    fn every_slash_shape_normalizes_to_one_path() {
        let shapes = [
            "tasks", "/tasks", "tasks/", "/tasks/", "//tasks//", "///tasks", "tasks///",
        ];
        for shape in shapes {
            let url = resource_url(&format!("{BASE}/"), shape, None).unwrap();
            assert_eq!(url, format!("{BASE}/tasks/"), "shape {shape:?}");
        }
    }

    #[test]
    fn nested_resources_never_double_slash() {
        let resources = ["auth/login", "/auth//login/", "analytics///dashboard", "a/b/c/"];
        let ids = [None, Some("7"), Some("/7/"), Some("x//y")];
        for resource in resources {
            for id in ids {
                let url = resource_url(BASE, resource, id).unwrap();
                let path = path_of(&url);
                assert!(!path.contains("//"), "{url}");
                assert!(url.ends_with('/') && !url.ends_with("//"), "{url}");
            }
        }
    }

    #[test]
    fn empty_resource_is_rejected() {
        for resource in ["", "/", "///"] {
            let err = resource_url(BASE, resource, None).unwrap_err();
            assert!(matches!(err, ApiError::InvalidResource(_)));
        }
    }

    #[tokio::test]
    async fn anonymous_request_has_no_authorization() {
        let req = builder_with(MemoryTokenStore::new())
            .build(&RequestDescriptor::get("tasks"))
            .await
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, format!("{BASE}/tasks/"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.header("authorization").is_none());
        assert!(req.body.is_none());
    }

    #[tokio::test]
    async fn stored_token_becomes_bearer_header() {
        let store = MemoryTokenStore::with_token(SessionToken::new("abc.def"));
        let req = builder_with(store)
            .build(&RequestDescriptor::get("courses"))
            .await
            .unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer abc.def"));
    }

    #[tokio::test]
    async fn caller_content_type_is_kept() {
        let descriptor = RequestDescriptor::post("uploads").with_header("content-type", "text/csv");
        let req = builder_with(MemoryTokenStore::new()).build(&descriptor).await.unwrap();
        let content_types: Vec<_> = req
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(req.header("Content-Type"), Some("text/csv"));
    }

    #[tokio::test]
    async fn post_body_is_serialized() {
        let descriptor = RequestDescriptor::post("tasks").with_body(json!({"name": "x"}));
        let req = builder_with(MemoryTokenStore::new()).build(&descriptor).await.unwrap();
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "x"}));
    }

    #[tokio::test]
    async fn get_never_carries_a_body() {
        let descriptor = RequestDescriptor::get("tasks").with_body(json!({"ignored": true}));
        let req = builder_with(MemoryTokenStore::new()).build(&descriptor).await.unwrap();
        assert!(req.body.is_none());
    }

    #[tokio::test]
    async fn token_is_read_at_build_time() {
        let store = Arc::new(MemoryTokenStore::with_token(SessionToken::new("old")));
        let builder = RequestBuilder::new(&ClientConfig::new(BASE), store.clone());

        let captured = builder.build(&RequestDescriptor::get("tasks")).await.unwrap();
        store.clear().await.unwrap();
        let after = builder.build(&RequestDescriptor::get("tasks")).await.unwrap();

        assert_eq!(captured.header("authorization"), Some("Bearer old"));
        assert!(after.header("authorization").is_none());
    }

    struct BrokenStore;

    #[async_trait]
    impl TokenStore for BrokenStore {
        async fn get(&self) -> Result<Option<SessionToken>, TokenStoreError> {
            Err(TokenStoreError::Corrupt("EOF while parsing".to_string()))
        }

        async fn set(&self, _: SessionToken) -> Result<(), TokenStoreError> {
            Ok(())
        }

        async fn clear(&self) -> Result<(), TokenStoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn unreadable_store_builds_an_anonymous_request() {
        let builder = RequestBuilder::new(&ClientConfig::new(BASE), Arc::new(BrokenStore));
        let req = builder.build(&RequestDescriptor::get("tasks")).await.unwrap();
        assert_eq!(req.url, format!("{BASE}/tasks/"));
        assert!(req.header("authorization").is_none());
    }
}
