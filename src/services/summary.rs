// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Derived report fields: crawlability score, tooling recommendations and
//! the menu summary.

use crate::models::report::{CategoryCount, MenuItem, MenuSummary, RenderMode};
use once_cell::sync::Lazy;
use regex::Regex;

const SUMMARY_LIMIT: usize = 5;

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,5}(?:[.,]\d{2})?").expect("amount regex is valid"));

/// Score out of 100, higher means easier to crawl
pub fn crawlability_score(
    robots_found: bool,
    crawl_delays: &[String],
    sitemaps: &[String],
    render_mode: RenderMode,
) -> u8 {
    let mut score = 0;
    if robots_found {
        score += 25;
    }
    if !crawl_delays.is_empty() {
        score += 15;
    }
    if !sitemaps.is_empty() {
        score += 30;
    }
    if render_mode == RenderMode::Static {
        score += 30;
    }
    score
}

pub fn recommendations(render_mode: RenderMode, has_sitemaps: bool) -> Vec<String> {
    let mut recs: Vec<String> = match render_mode {
        RenderMode::Dynamic => vec![
            "Use a headless browser (Chromium via CDP, Playwright) to render this site.".to_string(),
            "Wait for the menu container to appear before reading the DOM.".to_string(),
        ],
        RenderMode::Static => vec![
            "Plain HTTP requests with an HTML parser are enough for this site.".to_string(),
            "A crawling framework with rate limiting scales this to many pages.".to_string(),
        ],
    };
    if has_sitemaps {
        recs.push("Use the sitemap URLs to discover menu pages.".to_string());
    }
    recs
}

/// Numeric value of a price string, accepting either `.` or `,` as decimal mark
pub fn price_value(price: &str) -> Option<f64> {
    AMOUNT
        .find(price)
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
}

/// Top categories by item count and the most expensive items
pub fn summarize(items: &[MenuItem]) -> MenuSummary {
    let mut categories: Vec<CategoryCount> = Vec::new();
    for category in items.iter().filter_map(|i| i.category.as_deref()) {
        match categories.iter_mut().find(|c| c.category == category) {
            Some(entry) => entry.items += 1,
            None => categories.push(CategoryCount {
                category: category.to_string(),
                items: 1,
            }),
        }
    }
    categories.sort_by(|a, b| b.items.cmp(&a.items));
    categories.truncate(SUMMARY_LIMIT);

    let mut priced: Vec<(f64, &MenuItem)> = items
        .iter()
        .filter_map(|item| {
            item.price
                .as_deref()
                .and_then(price_value)
                .map(|value| (value, item))
        })
        .collect();
    priced.sort_by(|a, b| b.0.total_cmp(&a.0));

    MenuSummary {
        top_categories: categories,
        top_priced: priced
            .into_iter()
            .take(SUMMARY_LIMIT)
            .map(|(_, item)| item.clone())
            .collect(),
    }
}
