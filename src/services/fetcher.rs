// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Page fetching capability used by the analysis pipeline.
//!
//! The pipeline only sees the [`PageFetcher`] trait; [`LivePageFetcher`] backs it
//! with a reqwest client and a scripted Chromium session.

use crate::models::config::{AnalysisConfig, WaitPolicy};
use crate::models::error::{FetchError, FetchErrorKind};
use crate::services::browser::BrowserSession;
use crate::services::http_client::HttpClient;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Result of a lightweight existence check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
}

impl ProbeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
    }
}

/// Fetches HTML for a URL, either as served or after running the page's scripts
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Plain HTTP GET; any non-2xx status is an error
    async fn fetch_static(&self, url: &str) -> Result<String, FetchError>;

    /// Load the page in a scripted browser, wait per `wait_policy` and return the serialized DOM
    async fn fetch_rendered(&self, url: &str, wait_policy: &WaitPolicy)
        -> Result<String, FetchError>;

    /// HEAD (or small GET) returning status and content type
    async fn probe(&self, url: &str) -> Result<ProbeResponse, FetchError>;
}

/// Fetcher that talks to the network and launches Chromium on demand
pub struct LivePageFetcher {
    http: HttpClient,
    timeout: Duration,
    browser_enabled: bool,
}

impl LivePageFetcher {
    pub fn new(config: &AnalysisConfig) -> Result<Self, FetchError> {
        let http = HttpClient::new(&config.user_agent, config.timeout_ms, config.max_retries)?;
        Ok(Self {
            http,
            timeout: Duration::from_millis(config.timeout_ms),
            browser_enabled: config.browser_enabled,
        })
    }
}

#[async_trait]
impl PageFetcher for LivePageFetcher {
    async fn fetch_static(&self, url: &str) -> Result<String, FetchError> {
        let response = self.http.get(url).await?;
        if !(200..300).contains(&response.status) {
            return Err(FetchError::http_status(url, response.status));
        }
        debug!("Fetched {} ({} bytes)", url, response.body.len());
        Ok(response.body)
    }

    async fn fetch_rendered(
        &self,
        url: &str,
        wait_policy: &WaitPolicy,
    ) -> Result<String, FetchError> {
        if !self.browser_enabled {
            return Err(FetchError::new(
                FetchErrorKind::BrowserLaunch,
                url,
                "browser rendering is disabled",
            ));
        }

        info!("Rendering {} in a headless browser", url);
        let session = BrowserSession::launch(url, self.timeout).await?;
        let result = session.render(url, wait_policy).await;
        // The session is closed whether rendering succeeded or not
        session.close().await;
        result
    }

    async fn probe(&self, url: &str) -> Result<ProbeResponse, FetchError> {
        self.http.head_or_get(url).await
    }
}

/// Builds a fetcher for a given configuration.
///
/// The HTTP server uses this so a request carrying its own config (user agent,
/// timeout, browser switch) gets a fetcher built for it.
pub trait FetcherFactory: Send + Sync {
    fn build(&self, config: &AnalysisConfig) -> Result<Arc<dyn PageFetcher>, FetchError>;
}

/// Factory producing [`LivePageFetcher`]s
pub struct LiveFetcherFactory;

impl FetcherFactory for LiveFetcherFactory {
    fn build(&self, config: &AnalysisConfig) -> Result<Arc<dyn PageFetcher>, FetchError> {
        Ok(Arc::new(LivePageFetcher::new(config)?))
    }
}
