// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Scripted Chromium session using chromiumoxide.
//!
//! A session is launched for a single render and must be closed by the caller
//! on every exit path, so no browser process outlives its analysis run.

use crate::models::config::WaitPolicy;
use crate::models::error::{FetchError, FetchErrorKind};
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How often the selector wait re-checks the DOM
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MENU_SCOUT_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    ["google-chrome", "chromium", "chromium-browser"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// A headless browser owned by one analysis run
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    timeout: Duration,
}

impl BrowserSession {
    /// Launch a headless Chromium instance
    pub async fn launch(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let chrome_path = find_chromium().ok_or_else(|| {
            FetchError::new(
                FetchErrorKind::BrowserLaunch,
                url,
                "Chromium not found, set MENU_SCOUT_CHROMIUM_PATH",
            )
        })?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(timeout)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(|e| {
                FetchError::new(
                    FetchErrorKind::BrowserLaunch,
                    url,
                    format!("failed to build browser config: {e}"),
                )
            })?;

        let (browser, mut handler) = bounded(timeout, url, Browser::launch(config))
            .await?
            .map_err(|e| {
                FetchError::new(
                    FetchErrorKind::BrowserLaunch,
                    url,
                    format!("failed to launch Chromium: {e}"),
                )
            })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            timeout,
        })
    }

    /// Navigate to `url`, wait per `wait_policy` and return the serialized DOM
    pub async fn render(&self, url: &str, wait_policy: &WaitPolicy) -> Result<String, FetchError> {
        let page = bounded(self.timeout, url, self.browser.new_page(url))
            .await?
            .map_err(|e| navigation_error(url, e))?;

        // Some pages redirect client-side right after load
        let _ = bounded(self.timeout, url, page.wait_for_navigation()).await;

        match wait_policy {
            WaitPolicy::FixedDelay { millis } => {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            WaitPolicy::SelectorPresent {
                selector,
                timeout_ms,
            } => {
                let wait = async {
                    while page.find_element(selector.as_str()).await.is_err() {
                        tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
                    }
                };
                bounded(Duration::from_millis(*timeout_ms), url, wait).await?;
                debug!("Selector {:?} present on {}", selector, url);
            }
        }

        let html = bounded(self.timeout, url, page.content())
            .await?
            .map_err(|e| navigation_error(url, e))?;
        let _ = page.close().await;
        Ok(html)
    }

    /// Shut the browser down and reap its process
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}

/// Run `fut` under `timeout`, mapping expiry to a `Timeout` fetch error
async fn bounded<F: Future>(
    timeout: Duration,
    url: &str,
    fut: F,
) -> Result<F::Output, FetchError> {
    tokio::time::timeout(timeout, fut).await.map_err(|_| {
        FetchError::new(
            FetchErrorKind::Timeout,
            url,
            format!("browser step timed out after {}ms", timeout.as_millis()),
        )
    })
}

fn navigation_error(url: &str, e: impl std::fmt::Display) -> FetchError {
    FetchError::new(FetchErrorKind::Navigation, url, e.to_string())
}
