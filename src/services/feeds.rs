// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Discovery of structured-data alternatives to scraping: RSS/Atom feeds
//! advertised in the page head and JSON APIs at conventional paths.

use crate::models::report::{FeedKind, FeedRef};
use crate::services::fetcher::PageFetcher;
use crate::services::html::{is_same_origin, resolve_url};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

const FEED_TYPES: &[&str] = &["application/rss+xml", "application/atom+xml"];

/// Extra probe candidates taken from in-page `/api/` links
const MAX_LINKED_API_CANDIDATES: usize = 5;

static ALTERNATE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel][type][href]").expect("valid selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Find feeds in `html` and probe API candidates relative to `base_url`.
///
/// Probe failures and non-JSON answers are skipped silently.
pub async fn discover(
    fetcher: &dyn PageFetcher,
    html: &str,
    base_url: &str,
    probe_paths: &[String],
) -> Vec<FeedRef> {
    let (rss_urls, api_candidates) = scan_html(html, base_url, probe_paths);

    let mut feeds: Vec<FeedRef> = rss_urls
        .into_iter()
        .map(|url| FeedRef {
            kind: FeedKind::Rss,
            url,
        })
        .collect();

    for candidate in api_candidates {
        match fetcher.probe(&candidate).await {
            Ok(probe) if probe.is_success() && probe.is_json() => {
                debug!("API endpoint found at {}", candidate);
                push_unique(
                    &mut feeds,
                    FeedRef {
                        kind: FeedKind::Api,
                        url: candidate,
                    },
                );
            }
            Ok(probe) => debug!("Probe {} answered {}", candidate, probe.status),
            Err(e) => debug!("Probe {} failed: {}", candidate, e),
        }
    }

    feeds
}

/// Feed URLs advertised in the document and the API URLs worth probing.
///
/// Kept synchronous so the parsed DOM never lives across an await point.
fn scan_html(html: &str, base_url: &str, probe_paths: &[String]) -> (Vec<String>, Vec<String>) {
    let document = Html::parse_document(html);

    let mut rss_urls: Vec<String> = Vec::new();
    for link in document.select(&ALTERNATE_LINK) {
        let el = link.value();
        let is_alternate = el
            .attr("rel")
            .map(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("alternate"))
            })
            .unwrap_or(false);
        let is_feed = el
            .attr("type")
            .map(|t| FEED_TYPES.contains(&t.trim().to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        let href = el.attr("href").unwrap_or("").trim();

        if is_alternate && is_feed && !href.is_empty() {
            let resolved = resolve_url(base_url, href);
            if !rss_urls.contains(&resolved) {
                rss_urls.push(resolved);
            }
        }
    }

    let mut api_candidates: Vec<String> = Vec::new();
    for path in probe_paths {
        let resolved = resolve_url(base_url, path);
        if !api_candidates.contains(&resolved) {
            api_candidates.push(resolved);
        }
    }

    let linked = document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.to_ascii_lowercase().contains("/api/"))
        .map(|href| resolve_url(base_url, href.trim()))
        .filter(|url| is_same_origin(url, base_url));
    let mut added = 0;
    for url in linked {
        if added == MAX_LINKED_API_CANDIDATES {
            break;
        }
        if !api_candidates.contains(&url) {
            api_candidates.push(url);
            added += 1;
        }
    }

    (rss_urls, api_candidates)
}

fn push_unique(feeds: &mut Vec<FeedRef>, feed: FeedRef) {
    if !feeds.contains(&feed) {
        feeds.push(feed);
    }
}
