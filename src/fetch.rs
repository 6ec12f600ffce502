//! Memoized API fetching.
//!
//! A `FetchCache` deduplicates identical logical requests within one session:
//! the first fetch for a key goes over the wire, later fetches resolve from
//! memory, and concurrent fetches for the same uncached key share a single
//! in-flight request. Entries never expire; `clear()` is the only eviction.
//! Failed requests are never cached.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;

pub const REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone)]
pub enum FetchError {
    /// Transport-level failure (DNS, connection refused, timeout).
    Network(String),
    /// Non-success HTTP status.
    Http {
        status: u16,
        status_text: String,
        body: Option<String>,
    },
    /// Response body could not be parsed as JSON.
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Http {
                status,
                status_text,
                ..
            } => write!(f, "API error: {} {}", status, status_text),
            FetchError::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Raw response handed back by a transport before JSON decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP capability the cache needs. Injected at construction so tests can
/// count requests without a network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError>;
    async fn post_json(&self, url: &str, body: &Value) -> Result<RawResponse, FetchError>;
}

/// Production transport backed by `reqwest` with a fixed request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    async fn read_response(response: reqwest::Response) -> Result<RawResponse, FetchError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Self::read_response(response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<RawResponse, FetchError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Self::read_response(response).await
    }
}

// ============================================================================
// Fetch Cache
// ============================================================================

type CacheCell = Arc<OnceCell<Arc<Value>>>;

/// Memoizing fetch layer. Cache keys are full request URLs with normalized
/// query strings; values are decoded JSON payloads shared behind `Arc`.
pub struct FetchCache<T: Transport> {
    transport: T,
    entries: Mutex<HashMap<String, CacheCell>>,
}

impl<T: Transport> FetchCache<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a URL, serving from memory when possible.
    ///
    /// With `use_cache`, the first call for a key issues the request and
    /// stores the decoded payload; concurrent callers for the same key wait
    /// on that single request instead of issuing their own. Without
    /// `use_cache`, the request always goes out and the cache is untouched.
    pub async fn fetch(&self, url: &str, use_cache: bool) -> Result<Arc<Value>, FetchError> {
        if !use_cache {
            return self.fetch_direct(url).await;
        }

        let cell = {
            let mut entries = self.entries.lock().expect("fetch cache lock poisoned");
            entries.entry(url.to_string()).or_default().clone()
        };

        if let Some(value) = cell.get() {
            tracing::debug!(url, "cache hit");
            return Ok(value.clone());
        }

        // A failed initializer leaves the cell empty, so errors propagate to
        // every waiting caller without poisoning the cache.
        cell.get_or_try_init(|| async {
            tracing::debug!(url, "cache miss, fetching");
            self.fetch_direct(url).await
        })
        .await
        .cloned()
    }

    /// Uncached POST passthrough for endpoints whose responses must never be
    /// memoized.
    pub async fn post(&self, url: &str, body: &Value) -> Result<Arc<Value>, FetchError> {
        let response = self.transport.post_json(url, body).await?;
        Self::decode(response)
    }

    /// Remove every entry. There is no partial invalidation.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("fetch cache lock poisoned")
            .clear();
        tracing::debug!("fetch cache cleared");
    }

    /// Number of resolved entries currently held.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("fetch cache lock poisoned")
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn fetch_direct(&self, url: &str) -> Result<Arc<Value>, FetchError> {
        let response = self.transport.get(url).await?;
        Self::decode(response)
    }

    fn decode(response: RawResponse) -> Result<Arc<Value>, FetchError> {
        if !response.is_success() {
            return Err(FetchError::Http {
                status: response.status,
                status_text: response.status_text,
                body: if response.body.is_empty() {
                    None
                } else {
                    Some(response.body)
                },
            });
        }
        let value: Value =
            serde_json::from_str(&response.body).map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(Arc::new(value))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport that serves canned responses and counts requests.
    struct MockTransport {
        requests: AtomicUsize,
        response: fn(&str) -> Result<RawResponse, FetchError>,
    }

    impl MockTransport {
        fn ok_json() -> Self {
            Self {
                requests: AtomicUsize::new(0),
                response: |url| {
                    Ok(RawResponse {
                        status: 200,
                        status_text: "OK".to_string(),
                        body: format!(r#"{{"url": "{}"}}"#, url),
                    })
                },
            }
        }

        fn with_response(response: fn(&str) -> Result<RawResponse, FetchError>) -> Self {
            Self {
                requests: AtomicUsize::new(0),
                response,
            }
        }

        fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(&self, url: &str) -> Result<RawResponse, FetchError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            (self.response)(url)
        }

        async fn post_json(&self, url: &str, _body: &Value) -> Result<RawResponse, FetchError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            (self.response)(url)
        }
    }

    #[tokio::test]
    async fn cached_fetch_issues_one_request() {
        let cache = FetchCache::new(MockTransport::ok_json());

        let first = cache.fetch("/api/standards", true).await.unwrap();
        let second = cache.fetch("/api/standards", true).await.unwrap();

        assert_eq!(cache.transport.request_count(), 1);
        // Both callers share the same payload instance.
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn bypass_always_fetches_and_leaves_cache_alone() {
        let cache = FetchCache::new(MockTransport::ok_json());

        cache.fetch("/api/standards", true).await.unwrap();
        cache.fetch("/api/standards", false).await.unwrap();
        cache.fetch("/api/standards", false).await.unwrap();

        assert_eq!(cache.transport.request_count(), 3);
        assert_eq!(cache.len(), 1);

        // Bypass on an uncached key must not populate the cache either.
        cache.fetch("/api/lessons", false).await.unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn clear_forces_refetch() {
        let cache = FetchCache::new(MockTransport::ok_json());

        cache.fetch("/api/structure", true).await.unwrap();
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());

        cache.fetch("/api/structure", true).await.unwrap();
        assert_eq!(cache.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_fetches_coalesce_into_one_request() {
        let cache = Arc::new(FetchCache::new(MockTransport::ok_json()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.fetch("/api/structure", true).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cache.transport.request_count(), 1);
    }

    #[tokio::test]
    async fn http_error_propagates_and_is_not_cached() {
        let cache = FetchCache::new(MockTransport::with_response(|_| {
            Ok(RawResponse {
                status: 500,
                status_text: "Internal Server Error".to_string(),
                body: "boom".to_string(),
            })
        }));

        let err = cache.fetch("/api/structure", true).await.unwrap_err();
        match err {
            FetchError::Http { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body.as_deref(), Some("boom"));
            }
            other => panic!("expected Http error, got {:?}", other),
        }

        // The failure left nothing behind; the next call retries.
        assert!(cache.is_empty());
        cache.fetch("/api/structure", true).await.unwrap_err();
        assert_eq!(cache.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn invalid_json_is_a_decode_error() {
        let cache = FetchCache::new(MockTransport::with_response(|_| {
            Ok(RawResponse {
                status: 200,
                status_text: "OK".to_string(),
                body: "<html>not json</html>".to_string(),
            })
        }));

        let err = cache.fetch("/api/structure", true).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(cache.is_empty());
    }
}
