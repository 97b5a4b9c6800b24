// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Async HTTP client wrapping reqwest.
//!
//! Not a browser, just HTTP requests. Retries transient failures
//! (502/503/504/500, connection errors) with capped exponential backoff and
//! honours `Retry-After` on 429, so the pipeline itself never retries. Retries
//! stop once the next wait would run past the request timeout.

use crate::models::error::{FetchError, FetchErrorKind};
use crate::services::fetcher::ProbeResponse;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::debug;

/// Statuses worth a second attempt
const RETRY_STATUSES: &[u16] = &[500, 502, 503, 504];

/// Base delay for exponential backoff
const BACKOFF_BASE_MS: u64 = 500;

/// Longest single wait between attempts
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_retries: u32,
    /// Total time retries may add to one request
    retry_budget: Duration,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout_ms: u64, max_retries: u32) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                FetchError::new(
                    FetchErrorKind::Network,
                    "",
                    format!("failed to build HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            max_retries,
            retry_budget: Duration::from_millis(timeout_ms),
        })
    }

    /// GET with retry on 5xx and backoff on 429. The last response is returned
    /// as-is once retries or the retry budget run out, whatever its status.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let started = Instant::now();
        let mut retries = 0u32;

        loop {
            let resp = match self.client.get(url).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    let message = e.to_string();
                    let kind = FetchErrorKind::from(e);
                    let delay = backoff(retries.saturating_add(1));
                    if kind == FetchErrorKind::Network && self.may_retry(retries, started, delay) {
                        retries += 1;
                        debug!("Retrying {} after network error (attempt {})", url, retries);
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(FetchError::new(kind, url, message));
                }
            };

            let status = resp.status();
            let delay = if RETRY_STATUSES.contains(&status.as_u16()) {
                Some(backoff(retries.saturating_add(1)))
            } else if status == StatusCode::TOO_MANY_REQUESTS {
                Some(retry_after(&resp))
            } else {
                None
            };
            if let Some(delay) = delay.filter(|d| self.may_retry(retries, started, *d)) {
                retries += 1;
                debug!("Retrying {} after status {} (attempt {})", url, status, retries);
                tokio::time::sleep(delay).await;
                continue;
            }

            let content_type = header_value(&resp, CONTENT_TYPE);
            let body = resp
                .text()
                .await
                .map_err(|e| fetch_error(e, url))?;

            return Ok(HttpResponse {
                status: status.as_u16(),
                content_type,
                body,
            });
        }
    }

    fn may_retry(&self, retries: u32, started: Instant, delay: Duration) -> bool {
        retries < self.max_retries && started.elapsed() + delay <= self.retry_budget
    }

    /// HEAD request, falling back to GET when the server rejects HEAD.
    pub async fn head_or_get(&self, url: &str) -> Result<ProbeResponse, FetchError> {
        let resp = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| fetch_error(e, url))?;

        let status = resp.status();
        if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
            let fallback = self.get(url).await?;
            return Ok(ProbeResponse {
                url: url.to_string(),
                status: fallback.status,
                content_type: fallback.content_type,
            });
        }

        Ok(ProbeResponse {
            url: url.to_string(),
            status: status.as_u16(),
            content_type: header_value(&resp, CONTENT_TYPE),
        })
    }
}

fn fetch_error(e: reqwest::Error, url: &str) -> FetchError {
    let message = e.to_string();
    FetchError::new(FetchErrorKind::from(e), url, message)
}

fn backoff(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor)).min(MAX_BACKOFF)
}

/// `Retry-After` seconds from a 429, 2 s when absent, capped like backoff
fn retry_after(resp: &reqwest::Response) -> Duration {
    let seconds = resp
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(2);
    Duration::from_secs(seconds).min(MAX_BACKOFF)
}

fn header_value(resp: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
