//! Posting API clients.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::OAuthSigner;
use crate::config::Credentials;

/// Longest API error body kept in an error message.
const MAX_ERROR_BODY: usize = 300;

/// Errors that can occur while publishing a post.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Rate limited by the API (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Credentials rejected by the API: {0}")]
    Unauthorized(String),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected API response: {0}")]
    InvalidResponse(String),

    #[error("Failed to sign request: {0}")]
    Signing(String),
}

impl PublishError {
    /// Whether the same post may succeed if sent again later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Unauthorized(_) | Self::InvalidResponse(_) | Self::Signing(_) => false,
        }
    }

    /// Server-requested wait before retrying, if any.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Confirmation of a published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReceipt {
    /// Identifier assigned by the platform.
    pub id: String,

    /// Text as stored by the platform.
    pub text: String,
}

/// Something that can publish a line of text.
pub trait Publisher: Send + Sync {
    /// Publishes `text` and returns the platform's receipt.
    fn post(&self, text: &str) -> impl Future<Output = Result<PostReceipt, PublishError>> + Send;
}

#[derive(Serialize)]
struct CreatePost<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct CreatePostResponse {
    data: PostReceipt,
}

/// Client for the `POST /2/tweets` endpoint, authenticated with OAuth 1.0a
/// user context.
pub struct TwitterClient {
    http: reqwest::Client,
    signer: OAuthSigner,
    base_url: String,
}

impl TwitterClient {
    /// Creates a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(credentials: &Credentials, base_url: impl Into<String>) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("dish_bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            signer: OAuthSigner::from_credentials(credentials),
            base_url: base_url.into(),
        })
    }

    fn posts_url(&self) -> String {
        format!("{}/2/tweets", self.base_url.trim_end_matches('/'))
    }
}

impl Publisher for TwitterClient {
    async fn post(&self, text: &str) -> Result<PostReceipt, PublishError> {
        let url = self.posts_url();
        let authorization = self.signer.authorization_header("POST", &url, &[])?;

        debug!("Posting {} chars to {}", text.chars().count(), url);

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .json(&CreatePost { text })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: CreatePostResponse = response
                .json()
                .await
                .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;
            info!("Posted dish (id: {})", body.data.id);
            return Ok(body.data);
        }

        let retry_after = retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => PublishError::RateLimited { retry_after },
            StatusCode::UNAUTHORIZED => PublishError::Unauthorized(truncate(&body, MAX_ERROR_BODY)),
            _ => PublishError::Api {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            },
        })
    }
}

impl std::fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterClient")
            .field("base_url", &self.base_url)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

/// Reads the wait time from `retry-after` (seconds) or
/// `x-rate-limit-reset` (unix timestamp).
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
    };

    if let Some(seconds) = header("retry-after") {
        return u64::try_from(seconds).ok().map(Duration::from_secs);
    }

    let reset = header("x-rate-limit-reset")?;
    let wait = reset - Utc::now().timestamp();
    u64::try_from(wait).ok().map(Duration::from_secs)
}

/// Publisher that only logs what it would post.
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    posted: AtomicU64,
}

impl DryRunPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of posts "published" so far.
    #[must_use]
    pub fn posted(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }
}

impl Publisher for DryRunPublisher {
    async fn post(&self, text: &str) -> Result<PostReceipt, PublishError> {
        let count = self.posted.fetch_add(1, Ordering::Relaxed) + 1;
        info!("[dry run] {}", text);
        Ok(PostReceipt {
            id: format!("dry-run-{count}"),
            text: text.to_owned(),
        })
    }
}

/// Truncates a string for error messages and logs.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
