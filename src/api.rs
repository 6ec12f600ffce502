//! Typed client for the curriculum API.
//!
//! One method per consumed endpoint, each decoding the JSON payload into the
//! shapes in `models`. GET requests run through the shared `FetchCache`;
//! `/api/random-question` and the `verify-question` POST bypass it, since
//! memoizing either would change their meaning.

use crate::fetch::{FetchCache, FetchError, HttpTransport, Transport};
use crate::models::{
    Lesson, Question, QuestionFilters, QuestionQuery, Standard, StructurePayload,
    VerificationResult,
};
use serde::de::DeserializeOwned;
use url::Url;

pub const STRUCTURE_PATH: &str = "api/structure";
pub const STANDARDS_PATH: &str = "api/standards";
pub const LESSONS_PATH: &str = "api/lessons";
pub const QUESTION_FILTERS_PATH: &str = "api/available-question-filters";
pub const RANDOM_QUESTION_PATH: &str = "api/random-question";
pub const VERIFY_QUESTION_PATH: &str = "api/verify-question";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Underlying network, HTTP, or decode failure.
    Fetch(FetchError),
    /// The base URL or a derived endpoint URL is malformed.
    InvalidUrl(String),
    /// A valid but empty result where a non-empty one is required.
    EmptyResult(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Fetch(e) => write!(f, "{}", e),
            ApiError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            ApiError::EmptyResult(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        ApiError::Fetch(e)
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct CurriculumApi<T: Transport = HttpTransport> {
    base_url: Url,
    cache: FetchCache<T>,
}

impl CurriculumApi<HttpTransport> {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_transport(base_url, HttpTransport::new()?)
    }
}

impl<T: Transport> CurriculumApi<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Result<Self, ApiError> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            base_url,
            cache: FetchCache::new(transport),
        })
    }

    pub fn cache(&self) -> &FetchCache<T> {
        &self.cache
    }

    /// Drop every memoized response so the next fetches hit the network.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    // ------------------------------------------------------------------
    // Endpoints
    // ------------------------------------------------------------------

    /// `GET /api/structure`: the node/link dataset for the graph views.
    pub async fn structure(&self, use_cache: bool) -> Result<StructurePayload, ApiError> {
        self.get_json(STRUCTURE_PATH, &[], use_cache).await
    }

    /// `GET /api/standards`
    pub async fn standards(&self, use_cache: bool) -> Result<Vec<Standard>, ApiError> {
        self.get_json(STANDARDS_PATH, &[], use_cache).await
    }

    /// `GET /api/lessons`
    pub async fn lessons(&self, use_cache: bool) -> Result<Vec<Lesson>, ApiError> {
        self.get_json(LESSONS_PATH, &[], use_cache).await
    }

    /// `GET /api/standards/{code}/lessons`
    pub async fn standard_lessons(
        &self,
        code: &str,
        use_cache: bool,
    ) -> Result<Vec<Lesson>, ApiError> {
        let path = format!("{}/{}/lessons", STANDARDS_PATH, code);
        self.get_json(&path, &[], use_cache).await
    }

    /// `GET /api/available-question-filters`
    pub async fn question_filters(&self, use_cache: bool) -> Result<QuestionFilters, ApiError> {
        self.get_json(QUESTION_FILTERS_PATH, &[], use_cache).await
    }

    /// `GET /api/random-question?standard=&lesson=&difficulty=`
    ///
    /// Never cached: each call is expected to draw a fresh question. A 404
    /// means no question matches the filters and maps to `EmptyResult`.
    pub async fn random_question(&self, query: &QuestionQuery) -> Result<Question, ApiError> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(ref s) = query.standard {
            params.push(("standard", s.as_str()));
        }
        if let Some(ref l) = query.lesson {
            params.push(("lesson", l.as_str()));
        }
        if let Some(ref d) = query.difficulty {
            params.push(("difficulty", d.as_str()));
        }

        match self.get_json(RANDOM_QUESTION_PATH, &params, false).await {
            Err(ApiError::Fetch(ref e)) if e.status() == Some(404) => Err(ApiError::EmptyResult(
                "No questions found matching the filter criteria".to_string(),
            )),
            other => other,
        }
    }

    /// `POST /api/verify-question`
    pub async fn verify_question(
        &self,
        question: &Question,
    ) -> Result<VerificationResult, ApiError> {
        let url = self.endpoint(VERIFY_QUESTION_PATH, &[])?;
        let body = serde_json::to_value(question)
            .map_err(|e| ApiError::Fetch(FetchError::Decode(e.to_string())))?;
        let value = self.cache.post(url.as_str(), &body).await?;
        decode_value(&value)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn get_json<D: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        use_cache: bool,
    ) -> Result<D, ApiError> {
        let url = self.endpoint(path, params)?;
        let value = self.cache.fetch(url.as_str(), use_cache).await?;
        decode_value(&value)
    }

    /// Build the request URL, which doubles as the cache key. Query
    /// parameters are sorted so logically identical requests always share
    /// one key.
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if !params.is_empty() {
            let mut sorted = params.to_vec();
            sorted.sort();
            let mut pairs = url.query_pairs_mut();
            for (key, value) in sorted {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

fn decode_value<D: DeserializeOwned>(value: &serde_json::Value) -> Result<D, ApiError> {
    serde_json::from_value(value.clone())
        .map_err(|e| ApiError::Fetch(FetchError::Decode(e.to_string())))
}

// ============================================================================
// Tests
// ============================================================================
