//! Client configuration.
//!
//! The only knob is the API base URL. It is looked up in the runtime
//! environment first, then in the environment captured at build time, and
//! finally falls back to [`DEFAULT_BASE_URL`].

/// Environment variable that overrides the API base URL.
pub const BASE_URL_ENV: &str = "API_BASE_URL";

/// Base URL used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    /// Trailing slashes are stripped from `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        let runtime = std::env::var(BASE_URL_ENV).ok();
        Self::new(&resolve_base_url(runtime.as_deref(), option_env!("API_BASE_URL")))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn resolve_base_url(runtime: Option<&str>, build_time: Option<&str>) -> String {
    runtime
        .filter(|v| !v.trim().is_empty())
        .or(build_time.filter(|v| !v.trim().is_empty()))
        .unwrap_or(DEFAULT_BASE_URL)
        .trim()
        .to_string()
}
