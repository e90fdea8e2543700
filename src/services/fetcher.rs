//! Outbound HTTP fetch for validated targets.
//!
//! # Design Decisions
//! - The client is pinned to the addresses the network guard resolved
//!   (`resolve_to_addrs`), so no second DNS lookup happens between the
//!   check and the connection
//! - Redirects are disabled; a 3xx is reported, never followed
//! - Proxies from the environment are ignored
//! - The body is streamed and cut off at `max_bytes`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use serde::Serialize;
use thiserror::Error;

use crate::guard::ResolvedTarget;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch exceeded {0:?}")]
    Timeout(Duration),
    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("upstream answered {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl FetchError {
    /// Metric label.
    pub fn outcome(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::TooLarge { .. } => "too_large",
            FetchError::Status(_) => "bad_status",
            FetchError::Transport(_) => "transport",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedResource {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: usize,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &ResolvedTarget) -> Result<FetchedResource, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    timeout: Duration,
    max_bytes: usize,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> Self {
        Self { timeout, max_bytes }
    }

    fn client_for(&self, target: &ResolvedTarget) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .redirect(Policy::none())
            .no_proxy()
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .resolve_to_addrs(target.host(), target.addrs())
            .build()
            .map_err(FetchError::Transport)
    }

    async fn fetch_inner(&self, target: &ResolvedTarget) -> Result<FetchedResource, FetchError> {
        let client = self.client_for(target)?;
        let mut response = client
            .get(target.url().clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut bytes = 0usize;
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            bytes += chunk.len();
            if bytes > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        Ok(FetchedResource {
            url: target.url().to_string(),
            status: status.as_u16(),
            content_type,
            bytes,
        })
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err)
        }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, target: &ResolvedTarget) -> Result<FetchedResource, FetchError> {
        tokio::time::timeout(self.timeout, self.fetch_inner(target))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}
