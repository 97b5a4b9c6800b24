// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Reason a fetch (plain HTTP or scripted browser) failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection, DNS or body read failure
    Network,
    /// The bounded timeout elapsed
    Timeout,
    /// The server answered with a non-2xx status
    HttpStatus(u16),
    /// The browser could not be found or started
    BrowserLaunch,
    /// The browser started but could not load the page
    Navigation,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchErrorKind::Network => write!(f, "network"),
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::HttpStatus(status) => write!(f, "http_status {}", status),
            FetchErrorKind::BrowserLaunch => write!(f, "browser_launch"),
            FetchErrorKind::Navigation => write!(f, "navigation"),
        }
    }
}

/// Failure of a single fetch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error fetching {url}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, url: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn http_status(url: &str, status: u16) -> Self {
        Self::new(
            FetchErrorKind::HttpStatus(status),
            url,
            format!("server returned status {}", status),
        )
    }
}

impl From<reqwest::Error> for FetchErrorKind {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchErrorKind::Timeout
        } else if let Some(status) = e.status() {
            FetchErrorKind::HttpStatus(status.as_u16())
        } else {
            FetchErrorKind::Network
        }
    }
}

/// States of a single analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    RobotsChecked,
    FetchedStatic,
    RenderDecided,
    FetchedDynamic,
    FeedsDiscovered,
    ItemsExtracted,
    Done,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Init => write!(f, "init"),
            PipelineStage::RobotsChecked => write!(f, "robots_checked"),
            PipelineStage::FetchedStatic => write!(f, "fetched_static"),
            PipelineStage::RenderDecided => write!(f, "render_decided"),
            PipelineStage::FetchedDynamic => write!(f, "fetched_dynamic"),
            PipelineStage::FeedsDiscovered => write!(f, "feeds_discovered"),
            PipelineStage::ItemsExtracted => write!(f, "items_extracted"),
            PipelineStage::Done => write!(f, "done"),
            PipelineStage::Failed => write!(f, "failed"),
        }
    }
}

/// Fatal failure of an analysis run
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The input could not be parsed as an absolute http(s) URL
    #[error("{stage}: invalid URL {url:?}: {reason}")]
    InvalidUrl {
        stage: PipelineStage,
        url: String,
        reason: String,
    },
    /// No HTML could be obtained for the page
    #[error("{stage}: {source}")]
    Fetch {
        stage: PipelineStage,
        #[source]
        source: FetchError,
    },
}

impl AnalysisError {
    /// The stage that was being attempted when the run failed
    pub fn stage(&self) -> PipelineStage {
        match self {
            AnalysisError::InvalidUrl { stage, .. } | AnalysisError::Fetch { stage, .. } => *stage,
        }
    }
}

/// Non-fatal outcomes recorded on the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// robots.txt could not be fetched, analysis continued as allowed
    RobotsUnavailable,
    /// robots.txt disallows the page, analysis stopped
    RobotsDisallowed,
    /// Page looked script-rendered but the browser fetch failed
    DynamicRenderFailed,
    /// Malformed input that was skipped
    ParseError,
    /// No extraction strategy produced confident items
    NoItemsFound,
}

impl WarningKind {
    /// Format a warning line as `"<kind>: <message>"`
    pub fn message(&self, message: impl std::fmt::Display) -> String {
        format!("{}: {}", self, message)
    }
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::RobotsUnavailable => write!(f, "robots_unavailable"),
            WarningKind::RobotsDisallowed => write!(f, "robots_disallowed"),
            WarningKind::DynamicRenderFailed => write!(f, "dynamic_render_failed"),
            WarningKind::ParseError => write!(f, "parse_error"),
            WarningKind::NoItemsFound => write!(f, "no_items_found"),
        }
    }
}
