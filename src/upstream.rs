// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upstream resource fetcher.
//!
//! Authenticated callers can read two collections from an upstream JSON API
//! (JSONPlaceholder by default). Bodies are passed through untouched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::ApiError;

/// Longest upstream body excerpt kept in logs.
const LOG_BODY_LIMIT: usize = 512;

/// Collections exposed through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamResource {
    Photos,
    Posts,
}

impl UpstreamResource {
    /// Path relative to the upstream base URL.
    pub fn path(&self) -> &'static str {
        match self {
            UpstreamResource::Photos => "photos",
            UpstreamResource::Posts => "posts",
        }
    }

    /// Detail returned when the upstream answered with an error.
    pub fn failure_detail(&self) -> &'static str {
        match self {
            UpstreamResource::Photos => "Failed to fetch photos from external API",
            UpstreamResource::Posts => "Failed to fetch posts from external API",
        }
    }

    /// Detail returned when no response could be obtained.
    pub fn unavailable_detail(&self) -> &'static str {
        match self {
            UpstreamResource::Photos => "Could not connect to external photo API",
            UpstreamResource::Posts => "Could not connect to external post API",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Upstream answered 2xx with a body that is not JSON.
    #[error("upstream response was not valid JSON: {0}")]
    InvalidBody(String),

    /// No response was obtained (connect, DNS, timeout).
    #[error("could not reach upstream: {0}")]
    Unavailable(String),
}

impl UpstreamError {
    /// Map to the fixed response for `resource`.
    pub fn into_api_error(self, resource: UpstreamResource) -> ApiError {
        match self {
            UpstreamError::Status { .. } | UpstreamError::InvalidBody(_) => {
                ApiError::internal(resource.failure_detail())
            }
            UpstreamError::Unavailable(_) => {
                ApiError::service_unavailable(resource.unavailable_detail())
            }
        }
    }
}

#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    async fn fetch(&self, resource: UpstreamResource) -> Result<Value, UpstreamError>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    base_url: Url,
    http: Client,
}

impl HttpUpstream {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        // 3xx is an upstream failure, not something to chase.
        let http = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            base_url: with_trailing_slash(base_url),
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, resource: UpstreamResource) -> Result<Url, UpstreamError> {
        self.base_url
            .join(resource.path())
            .map_err(|e| UpstreamError::Unavailable(format!("invalid upstream URL: {e}")))
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(LOG_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[async_trait]
impl UpstreamFetcher for HttpUpstream {
    async fn fetch(&self, resource: UpstreamResource) -> Result<Value, UpstreamError> {
        let url = self.url_for(resource)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                UpstreamError::InvalidBody(e.to_string())
            } else {
                UpstreamError::Unavailable(e.to_string())
            }
        })
    }
}
