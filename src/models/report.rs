// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether a page's content exists in the raw HTTP response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenderMode {
    Static,
    Dynamic,
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderMode::Static => write!(f, "STATIC"),
            RenderMode::Dynamic => write!(f, "DYNAMIC"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedKind {
    /// RSS or Atom feed advertised in the page head
    Rss,
    /// Endpoint answering with JSON
    Api,
}

/// A structured-data alternative to scraping the HTML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeedRef {
    #[serde(rename = "type")]
    pub kind: FeedKind,
    pub url: String,
}

/// One extracted menu entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    pub name: String,
    /// Price text exactly as it appeared on the page
    pub price: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl MenuItem {
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && self.price.is_some()
    }
}

/// Raw measurements behind the render-mode verdict
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RenderSignals {
    pub visible_words: usize,
    pub script_count: usize,
    pub script_bytes: usize,
    pub body_bytes: usize,
    /// Ids of empty SPA root containers
    pub spa_markers: Vec<String>,
}

impl RenderSignals {
    pub fn script_byte_ratio(&self) -> f64 {
        if self.body_bytes == 0 {
            0.0
        } else {
            self.script_bytes as f64 / self.body_bytes as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryCount {
    pub category: String,
    pub items: usize,
}

/// Top categories and prices, for display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MenuSummary {
    pub top_categories: Vec<CategoryCount>,
    pub top_priced: Vec<MenuItem>,
}

/// Result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SiteReport {
    pub url: String,
    pub robots_allowed: bool,
    pub render_mode: RenderMode,
    pub feeds: Vec<FeedRef>,
    pub menu_items: Vec<MenuItem>,
    pub warnings: Vec<String>,
    /// Whether the site serves a robots.txt
    pub robots_found: bool,
    pub sitemaps: Vec<String>,
    pub crawl_delays: Vec<String>,
    pub render_signals: RenderSignals,
    /// Name of the extraction strategy that produced `menu_items`
    pub extraction_strategy: Option<String>,
    /// 0-100, higher is easier to crawl
    pub crawlability_score: u8,
    pub recommendations: Vec<String>,
    pub summary: MenuSummary,
}
