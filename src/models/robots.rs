// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

/// Rules from robots.txt that apply to one user agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RobotsRule {
    /// User agent the rule was resolved for
    pub user_agent: String,
    /// `Disallow:` path prefixes from the matching group(s)
    pub disallowed_paths: BTreeSet<String>,
    /// `Allow:` path prefixes from the matching group(s)
    pub allowed_paths: BTreeSet<String>,
}

impl RobotsRule {
    /// An empty rule allows everything
    pub fn allow_all(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            ..Self::default()
        }
    }

    /// Longest matching prefix wins; a tie goes to `Allow`.
    pub fn is_allowed(&self, path: &str) -> bool {
        let longest = |prefixes: &BTreeSet<String>| {
            prefixes
                .iter()
                .filter(|prefix| path.starts_with(prefix.as_str()))
                .map(|prefix| prefix.len())
                .max()
        };

        match (longest(&self.disallowed_paths), longest(&self.allowed_paths)) {
            (None, _) => true,
            (Some(disallow), None) => disallow == 0,
            (Some(disallow), Some(allow)) => disallow <= allow,
        }
    }
}

/// Everything learned from a site's robots.txt for one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RobotsCheck {
    /// Whether the analysed page may be fetched
    pub allowed: bool,
    /// The resolved rule for the configured user agent
    pub rule: RobotsRule,
    /// Whether a robots.txt was actually retrieved
    pub found: bool,
    /// `Sitemap:` URLs in document order
    pub sitemaps: Vec<String>,
    /// Raw `Crawl-delay:` values in document order
    pub crawl_delays: Vec<String>,
    /// Lines that could not be parsed
    pub malformed_lines: Vec<String>,
}
