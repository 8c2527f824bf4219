//! JSON fetching with a session-lifetime per-URL cache
//!
//! Bases may be an `http(s)://` URL (fetched with reqwest) or a local
//! directory (read from disk), so the same data layout works hosted or
//! checked out. Results are memoized per resolved URL: concurrent
//! callers of the same file share one request, and nothing is ever
//! invalidated for the lifetime of the fetcher.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch {url}: {status}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid JSON response at {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Join a base path/URL and a relative path, normalizing the separator.
pub fn join_path(base: &str, relative: &str) -> String {
    let base = base.trim_end_matches('/');
    let relative = relative.trim_start_matches('/');
    format!("{base}/{relative}")
}

type CachedJson = Arc<OnceCell<Arc<Value>>>;

pub struct JsonFetcher {
    client: reqwest::Client,
    cache: Mutex<HashMap<String, CachedJson>>,
}

impl Default for JsonFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch and parse JSON from a URL or local path, memoized per URL.
    pub async fn fetch_json(&self, url: &str) -> Result<Arc<Value>, FetchError> {
        let cell = {
            let mut cache = self.cache.lock().await;
            cache.entry(url.to_string()).or_default().clone()
        };
        let value = cell.get_or_try_init(|| self.fetch_uncached(url)).await?;
        Ok(Arc::clone(value))
    }

    async fn fetch_uncached(&self, url: &str) -> Result<Arc<Value>, FetchError> {
        tracing::debug!("fetching {}", url);
        let text = if url.starts_with("http://") || url.starts_with("https://") {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|source| FetchError::Transport {
                    url: url.to_string(),
                    source,
                })?;
            if !response.status().is_success() {
                return Err(FetchError::Http {
                    url: url.to_string(),
                    status: response.status(),
                });
            }
            response
                .text()
                .await
                .map_err(|source| FetchError::Transport {
                    url: url.to_string(),
                    source,
                })?
        } else {
            tokio::fs::read_to_string(url)
                .await
                .map_err(|source| FetchError::Io {
                    url: url.to_string(),
                    source,
                })?
        };

        let value: Value = serde_json::from_str(&text).map_err(|source| FetchError::InvalidJson {
            url: url.to_string(),
            source,
        })?;
        tracing::debug!("fetched {} ({} bytes)", url, text.len());
        Ok(Arc::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_path_normalizes_separators() {
        assert_eq!(join_path("data/", "/json/a.json"), "data/json/a.json");
        assert_eq!(join_path("data", "json/a.json"), "data/json/a.json");
        assert_eq!(
            join_path("https://example.org/base/", "a.json"),
            "https://example.org/base/a.json"
        );
    }

    #[tokio::test]
    async fn local_fetch_is_cached_per_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.json");
        std::fs::write(&path, r#"{"n": 1}"#).unwrap();

        let fetcher = JsonFetcher::new();
        let url = path.to_string_lossy().to_string();
        let first = fetcher.fetch_json(&url).await.unwrap();
        assert_eq!(first["n"], 1);

        // A rewrite is not observed: the first result is cached.
        std::fs::write(&path, r#"{"n": 2}"#).unwrap();
        let second = fetcher.fetch_json(&url).await.unwrap();
        assert_eq!(second["n"], 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let fetcher = JsonFetcher::new();
        let err = fetcher.fetch_json("/nonexistent/file.json").await;
        assert!(matches!(err, Err(FetchError::Io { .. })));
    }

    #[tokio::test]
    async fn invalid_json_names_the_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();

        let fetcher = JsonFetcher::new();
        let url = path.to_string_lossy().to_string();
        match fetcher.fetch_json(&url).await {
            Err(FetchError::InvalidJson { url: at, .. }) => assert_eq!(at, url),
            other => panic!("expected InvalidJson, got {other:?}"),
        }
    }
}
