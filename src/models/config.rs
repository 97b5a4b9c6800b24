// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use utoipa::ToSchema;

pub const DEFAULT_USER_AGENT: &str = "MenuScoutBot/0.1";

/// Tuning knobs for the JavaScript-rendering heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RenderThresholds {
    /// Pages with fewer visible words than this are "sparse"
    pub text_word_threshold: usize,
    /// Sparse pages with more script tags than this are dynamic
    pub script_count_threshold: usize,
    /// Script bytes divided by body bytes above this is dynamic
    pub script_byte_ratio_threshold: f64,
}

impl Default for RenderThresholds {
    fn default() -> Self {
        Self {
            text_word_threshold: 50,
            script_count_threshold: 10,
            script_byte_ratio_threshold: 0.6,
        }
    }
}

/// How long the scripted browser waits before serializing the DOM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WaitPolicy {
    /// Sleep a fixed number of milliseconds after navigation
    FixedDelay { millis: u64 },
    /// Poll until the CSS selector matches, up to `timeout_ms`
    SelectorPresent { selector: String, timeout_ms: u64 },
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::FixedDelay { millis: 3000 }
    }
}

/// Options for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AnalysisConfig {
    pub user_agent: String,
    pub render_thresholds: RenderThresholds,
    pub wait_policy: WaitPolicy,
    /// Conventional API paths probed relative to the site root
    pub feed_probe_paths: Vec<String>,
    /// Upper bound for every network and browser call
    pub timeout_ms: u64,
    /// Items with both name and price a strategy must yield to be accepted
    pub min_confident_items: usize,
    /// When false, dynamic pages are analysed from their static HTML
    pub browser_enabled: bool,
    /// Transport-level retries for transient HTTP failures
    pub max_retries: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            render_thresholds: RenderThresholds::default(),
            wait_policy: WaitPolicy::default(),
            feed_probe_paths: vec![
                "/api".to_string(),
                "/api/v1".to_string(),
                "/.well-known/api-catalog".to_string(),
            ],
            timeout_ms: 10_000,
            min_confident_items: 2,
            browser_enabled: true,
            max_retries: 3,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from `MENU_SCOUT_*` environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_agent) = lookup("MENU_SCOUT_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(v) = parse_var(&lookup, "MENU_SCOUT_TEXT_WORD_THRESHOLD")? {
            config.render_thresholds.text_word_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "MENU_SCOUT_SCRIPT_COUNT_THRESHOLD")? {
            config.render_thresholds.script_count_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "MENU_SCOUT_SCRIPT_BYTE_RATIO_THRESHOLD")? {
            config.render_thresholds.script_byte_ratio_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "MENU_SCOUT_TIMEOUT_MS")? {
            config.timeout_ms = v;
        }
        if let Some(millis) = parse_var(&lookup, "MENU_SCOUT_BROWSER_WAIT_MS")? {
            config.wait_policy = WaitPolicy::FixedDelay { millis };
        }
        if let Some(selector) = lookup("MENU_SCOUT_BROWSER_WAIT_SELECTOR") {
            config.wait_policy = WaitPolicy::SelectorPresent {
                selector,
                timeout_ms: config.timeout_ms,
            };
        }
        if let Some(paths) = lookup("MENU_SCOUT_FEED_PROBE_PATHS") {
            config.feed_probe_paths = paths
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = parse_var(&lookup, "MENU_SCOUT_MIN_CONFIDENT_ITEMS")? {
            config.min_confident_items = v;
        }
        if let Some(v) = parse_var(&lookup, "MENU_SCOUT_BROWSER_ENABLED")? {
            config.browser_enabled = v;
        }
        if let Some(v) = parse_var(&lookup, "MENU_SCOUT_MAX_RETRIES")? {
            config.max_retries = v;
        }

        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{} must be a valid value, got {:?}: {}", key, raw, e)),
    }
}
