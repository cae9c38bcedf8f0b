//! Clears the stored session when the backend rejects it.
//!
//! The invalidator sees every result before the caller does. It never
//! retries; re-authentication is an explicit `login` by the caller.

use std::sync::Arc;

use crate::error::ApiError;
use crate::response::Payload;
use crate::token::TokenStore;

#[derive(Clone)]
pub struct SessionInvalidator {
    store: Arc<dyn TokenStore>,
}

impl SessionInvalidator {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Passes `result` through, clearing the store first if it is a 401.
    pub async fn observe(&self, result: Result<Payload, ApiError>) -> Result<Payload, ApiError> {
        if let Err(err) = &result {
            if err.is_unauthorized() {
                self.invalidate().await;
            }
        }
        result
    }

    /// A store that cannot be cleared is logged; the caller still gets the
    /// original failure.
    pub(crate) async fn invalidate(&self) {
        tracing::warn!("backend rejected session token, clearing stored session");
        if let Err(e) = self.store.clear().await {
            tracing::error!(error = %e, "failed to clear session token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{MemoryTokenStore, SessionToken};

    fn authenticated() -> (Arc<MemoryTokenStore>, SessionInvalidator) {
        let store = Arc::new(MemoryTokenStore::with_token(SessionToken::new("t")));
        let invalidator = SessionInvalidator::new(store.clone());
        (store, invalidator)
    }

    #[tokio::test]
    async fn unauthorized_clears_token() {
        let (store, invalidator) = authenticated();
        let result = invalidator
            .observe(Err(ApiError::Unauthorized {
                message: "401 Unauthorized: expired".to_string(),
                body: "expired".to_string(),
            }))
            .await;

        assert!(result.unwrap_err().is_unauthorized());
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn other_failures_keep_token() {
        let (store, invalidator) = authenticated();
        let result = invalidator
            .observe(Err(ApiError::Http {
                status: 403,
                message: "403 Forbidden: no".to_string(),
                body: "no".to_string(),
            }))
            .await;

        assert_eq!(result.unwrap_err().status(), Some(403));
        assert!(store.get().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn success_passes_through() {
        let (store, invalidator) = authenticated();
        let result = invalidator.observe(Ok(Payload::Text("ok".to_string()))).await;
        assert_eq!(result.unwrap(), Payload::Text("ok".to_string()));
        assert!(store.get().await.unwrap().is_some());
    }
}
