use crate::api::{ApiError, ApiResult};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Where the RAG backend lives and how long to wait for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::Config("backend URL is empty".to_string()));
        }
        Ok(Self {
            base_url,
            timeout: None,
        })
    }

    /// Reads `RAG_API_URL` and `RAG_API_TIMEOUT_SECS`.
    pub fn from_env() -> ApiResult<Self> {
        let base_url = env::var("RAG_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(base_url)?;
        config.timeout = env::var("RAG_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn set_env(key: &str, value: Option<&str>) {
        // SAFETY: env mutation is serialized by ENV_MUTEX
        unsafe {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }

    #[test]
    fn trims_trailing_slash() {
        let config = ClientConfig::new("http://api.local:9000/").unwrap();
        assert_eq!(config.base_url, "http://api.local:9000");
        assert_eq!(config.url("/history"), "http://api.local:9000/history");
        assert_eq!(config.url("models"), "http://api.local:9000/models");
    }

    #[test]
    fn rejects_empty_url() {
        assert!(matches!(ClientConfig::new("  "), Err(ApiError::Config(_))));
    }

    #[test]
    fn reads_environment() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        set_env("RAG_API_URL", Some("http://rag:8000"));
        set_env("RAG_API_TIMEOUT_SECS", Some("30"));

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://rag:8000");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));

        set_env("RAG_API_URL", None);
        set_env("RAG_API_TIMEOUT_SECS", Some("soon"));
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, None);

        set_env("RAG_API_TIMEOUT_SECS", None);
    }
}
