// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! End-to-end pipeline runs against an in-memory site, no network.

use async_trait::async_trait;
use menu_scout::models::config::{AnalysisConfig, WaitPolicy};
use menu_scout::models::error::{AnalysisError, FetchError, FetchErrorKind, PipelineStage};
use menu_scout::models::report::{FeedKind, FeedRef, RenderMode};
use menu_scout::services::fetcher::{PageFetcher, ProbeResponse};
use menu_scout::services::pipeline::AnalysisPipeline;
use std::sync::{Arc, Mutex};

const SITE: &str = "https://menu.test";

const MENU_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Corner Bistro</title>
  <link rel="alternate" type="application/rss+xml" href="/news.rss">
</head>
<body>
  <h1>Dinner</h1>
  <div class="menu">
    <div class="dish"><h3>Steak Frites</h3><p>Sirloin, fries, herb butter</p><span>$24.00</span></div>
    <div class="dish"><h3>Roast Chicken</h3><p>Half bird, jus</p><span>$19.50</span></div>
    <div class="dish"><h3>Mushroom Risotto</h3><span>$12.50</span></div>
  </div>
  <footer>Open every day from noon until late. Reservations recommended.</footer>
</body>
</html>"#;

const SPA_SHELL: &str = r#"<html><head><script src="/app.js"></script></head>
<body><div id="root"></div></body></html>"#;

const RENDERED_SPA: &str = r#"<html><body><div id="root">
  <ul>
    <li>Margherita <b>$11.00</b></li>
    <li>Diavola <b>$13.00</b></li>
  </ul>
</div></body></html>"#;

/// A fixed site served from memory that records every call made to it
#[derive(Default)]
struct FixtureSite {
    pages: Vec<(String, String)>,
    rendered: Vec<(String, String)>,
    json_endpoints: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl FixtureSite {
    fn page(mut self, path: &str, html: &str) -> Self {
        self.pages.push((format!("{SITE}{path}"), html.to_string()));
        self
    }

    fn rendered(mut self, path: &str, html: &str) -> Self {
        self.rendered.push((format!("{SITE}{path}"), html.to_string()));
        self
    }

    fn json_endpoint(mut self, path: &str) -> Self {
        self.json_endpoints.push(format!("{SITE}{path}"));
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FixtureSite {
    async fn fetch_static(&self, url: &str) -> Result<String, FetchError> {
        self.record(format!("GET {url}"));
        self.pages
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, html)| html.clone())
            .ok_or_else(|| FetchError::http_status(url, 404))
    }

    async fn fetch_rendered(&self, url: &str, _wait: &WaitPolicy) -> Result<String, FetchError> {
        self.record(format!("RENDER {url}"));
        self.rendered
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, html)| html.clone())
            .ok_or_else(|| {
                FetchError::new(FetchErrorKind::BrowserLaunch, url, "Chromium not found")
            })
    }

    async fn probe(&self, url: &str) -> Result<ProbeResponse, FetchError> {
        self.record(format!("PROBE {url}"));
        let json = self.json_endpoints.iter().any(|u| u == url);
        Ok(ProbeResponse {
            url: url.to_string(),
            status: if json { 200 } else { 404 },
            content_type: json.then(|| "application/json".to_string()),
        })
    }
}

fn pipeline(site: &Arc<FixtureSite>) -> AnalysisPipeline {
    AnalysisPipeline::new(site.clone(), AnalysisConfig::default())
}

fn has_warning(warnings: &[String], kind: &str) -> bool {
    warnings.iter().any(|w| w.starts_with(&format!("{kind}: ")))
}

#[tokio::test]
async fn test_static_site_end_to_end() {
    let site = Arc::new(
        FixtureSite::default()
            .page(
                "/robots.txt",
                "User-agent: *\nAllow: /\nSitemap: https://menu.test/sitemap.xml\n",
            )
            .page("/menu", MENU_PAGE),
    );
    let mut pipeline = pipeline(&site);

    let report = pipeline.run("https://menu.test/menu").await.unwrap();

    assert_eq!(pipeline.state(), PipelineStage::Done);
    assert!(report.robots_allowed);
    assert!(report.robots_found);
    assert_eq!(report.render_mode, RenderMode::Static);
    assert_eq!(
        report.feeds,
        vec![FeedRef {
            kind: FeedKind::Rss,
            url: "https://menu.test/news.rss".to_string()
        }]
    );
    assert_eq!(report.menu_items.len(), 3);
    assert_eq!(report.menu_items[2].name, "Mushroom Risotto");
    assert_eq!(report.menu_items[2].price.as_deref(), Some("$12.50"));
    assert_eq!(report.menu_items[0].category.as_deref(), Some("Dinner"));
    assert_eq!(report.extraction_strategy.as_deref(), Some("repeated_blocks"));
    assert_eq!(report.sitemaps, vec!["https://menu.test/sitemap.xml"]);
    assert_eq!(report.crawlability_score, 85);
    assert_eq!(report.recommendations.len(), 3);
    assert_eq!(report.summary.top_priced[0].name, "Steak Frites");
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert!(!site.calls().iter().any(|c| c.starts_with("RENDER")));
}

#[tokio::test]
async fn test_repeated_runs_are_byte_identical() {
    let site = Arc::new(
        FixtureSite::default()
            .page("/robots.txt", "User-agent: *\nDisallow: /admin\nCrawl-delay: 5\n")
            .page("/menu", MENU_PAGE)
            .json_endpoint("/api/v1"),
    );

    let first = pipeline(&site).run("https://menu.test/menu").await.unwrap();
    let second = pipeline(&site).run("https://menu.test/menu").await.unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_robots_disallow_short_circuits() {
    let site = Arc::new(
        FixtureSite::default()
            .page("/robots.txt", "User-agent: *\nDisallow: /\n")
            .page("/menu", MENU_PAGE),
    );
    let mut pipeline = pipeline(&site);

    let report = pipeline.run("https://menu.test/menu").await.unwrap();

    assert_eq!(pipeline.state(), PipelineStage::Done);
    assert!(!report.robots_allowed);
    assert!(report.menu_items.is_empty());
    assert!(report.feeds.is_empty());
    assert!(has_warning(&report.warnings, "robots_disallowed"));
    assert_eq!(site.calls(), vec!["GET https://menu.test/robots.txt"]);
}

#[tokio::test]
async fn test_specific_agent_group_overrides_wildcard() {
    let site = Arc::new(
        FixtureSite::default()
            .page(
                "/robots.txt",
                "User-agent: *\nDisallow: /\n\nUser-agent: MenuScoutBot\nAllow: /menu\n",
            )
            .page("/menu", MENU_PAGE),
    );

    let report = pipeline(&site).run("https://menu.test/menu").await.unwrap();

    assert!(report.robots_allowed);
    assert_eq!(report.menu_items.len(), 3);
}

#[tokio::test]
async fn test_missing_robots_fails_open_with_warning() {
    let site = Arc::new(FixtureSite::default().page("/menu", MENU_PAGE));

    let report = pipeline(&site).run("https://menu.test/menu").await.unwrap();

    assert!(report.robots_allowed);
    assert!(!report.robots_found);
    assert!(has_warning(&report.warnings, "robots_unavailable"));
    assert_eq!(report.menu_items.len(), 3);
}

#[tokio::test]
async fn test_malformed_robots_lines_become_parse_warnings() {
    let site = Arc::new(
        FixtureSite::default()
            .page("/robots.txt", "this line has no colon\nUser-agent: *\nDisallow: /private\n")
            .page("/menu", MENU_PAGE),
    );

    let report = pipeline(&site).run("https://menu.test/menu").await.unwrap();

    assert!(report.robots_allowed);
    assert!(has_warning(&report.warnings, "parse_error"));
}

#[tokio::test]
async fn test_html_served_as_robots_gives_one_parse_warning() {
    let site = Arc::new(
        FixtureSite::default()
            .page(
                "/robots.txt",
                "<!DOCTYPE html>\n<html>\n<body>\n<p>Welcome to the bistro</p>\n</body>\n</html>\n",
            )
            .page("/menu", MENU_PAGE),
    );

    let report = pipeline(&site).run("https://menu.test/menu").await.unwrap();

    let parse_warnings: Vec<_> = report
        .warnings
        .iter()
        .filter(|w| w.starts_with("parse_error: "))
        .collect();
    assert_eq!(parse_warnings.len(), 1, "{:?}", report.warnings);
    assert!(parse_warnings[0].contains("6 malformed line(s)"));
    assert!(parse_warnings[0].contains("<!DOCTYPE html>"));
    assert!(report.robots_allowed);
    assert_eq!(report.menu_items.len(), 3);
}

#[tokio::test]
async fn test_dynamic_page_uses_rendered_html() {
    let site = Arc::new(
        FixtureSite::default()
            .page("/robots.txt", "User-agent: *\nAllow: /\n")
            .page("/", SPA_SHELL)
            .rendered("/", RENDERED_SPA),
    );
    let mut pipeline = pipeline(&site);

    let report = pipeline.run("https://menu.test/").await.unwrap();

    assert_eq!(pipeline.state(), PipelineStage::Done);
    assert_eq!(report.render_mode, RenderMode::Dynamic);
    assert_eq!(report.render_signals.spa_markers, vec!["root"]);
    let names: Vec<_> = report.menu_items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Margherita", "Diavola"]);
    assert!(site.calls().contains(&"RENDER https://menu.test/".to_string()));
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[tokio::test]
async fn test_dynamic_render_failure_degrades() {
    let site = Arc::new(
        FixtureSite::default()
            .page("/robots.txt", "User-agent: *\nAllow: /\n")
            .page("/", SPA_SHELL),
    );
    let mut pipeline = pipeline(&site);

    let report = pipeline.run("https://menu.test/").await.unwrap();

    assert_eq!(pipeline.state(), PipelineStage::Done);
    assert_eq!(report.render_mode, RenderMode::Dynamic);
    assert!(has_warning(&report.warnings, "dynamic_render_failed"));
    assert!(has_warning(&report.warnings, "no_items_found"));
    assert_eq!(report.crawlability_score, 25);
}

#[tokio::test]
async fn test_page_without_prices_still_completes() {
    let site = Arc::new(
        FixtureSite::default()
            .page("/robots.txt", "User-agent: *\nAllow: /\n")
            .page(
                "/about",
                "<html><body><h1>About us</h1><p>Family run since 1982.</p></body></html>",
            ),
    );
    let mut pipeline = pipeline(&site);

    let report = pipeline.run("https://menu.test/about").await.unwrap();

    assert_eq!(pipeline.state(), PipelineStage::Done);
    assert!(report.menu_items.is_empty());
    assert_eq!(report.extraction_strategy, None);
    assert!(has_warning(&report.warnings, "no_items_found"));
}

#[tokio::test]
async fn test_json_api_is_reported_as_feed() {
    let site = Arc::new(
        FixtureSite::default()
            .page("/robots.txt", "User-agent: *\nAllow: /\n")
            .page("/menu", MENU_PAGE)
            .json_endpoint("/api/v1"),
    );

    let report = pipeline(&site).run("https://menu.test/menu").await.unwrap();

    assert!(report.feeds.contains(&FeedRef {
        kind: FeedKind::Api,
        url: "https://menu.test/api/v1".to_string()
    }));
}

#[tokio::test]
async fn test_static_fetch_failure_is_fatal() {
    let site = Arc::new(FixtureSite::default().page("/robots.txt", "User-agent: *\nAllow: /\n"));
    let mut pipeline = pipeline(&site);

    let err = pipeline.run("https://menu.test/gone").await.unwrap_err();

    assert_eq!(pipeline.state(), PipelineStage::Failed);
    assert_eq!(err.stage(), PipelineStage::FetchedStatic);
    match err {
        AnalysisError::Fetch { source, .. } => {
            assert_eq!(source.kind, FetchErrorKind::HttpStatus(404))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_invalid_url_fails_before_any_fetch() {
    let site = Arc::new(FixtureSite::default());
    let mut pipeline = pipeline(&site);

    let err = pipeline.run("menu.test/menu").await.unwrap_err();

    assert_eq!(pipeline.state(), PipelineStage::Failed);
    assert!(matches!(err, AnalysisError::InvalidUrl { .. }));
    assert!(site.calls().is_empty());
}

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    let site = Arc::new(
        FixtureSite::default()
            .page("/robots.txt", "User-agent: *\nAllow: /\n")
            .page("/menu", MENU_PAGE),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let site = site.clone();
            tokio::spawn(async move {
                let mut runner = pipeline(&site);
                runner.run("https://menu.test/menu").await
            })
        })
        .collect();

    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.menu_items.len(), 3);
    }
}
