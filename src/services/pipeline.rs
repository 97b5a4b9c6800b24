// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! One analysis run, from URL to [`SiteReport`].
//!
//! Stages run strictly in order:
//! `init → robots_checked → fetched_static → render_decided → [fetched_dynamic]
//! → feeds_discovered → items_extracted → done`, with `failed` reachable on a
//! bad URL or when the static fetch fails. Every intermediate value is owned by
//! the run, so independent pipelines can be driven concurrently without
//! coordination.

use crate::models::config::AnalysisConfig;
use crate::models::error::{AnalysisError, PipelineStage, WarningKind};
use crate::models::report::{FeedRef, RenderMode, RenderSignals, SiteReport};
use crate::models::robots::RobotsCheck;
use crate::services::extractor::{self, Extraction};
use crate::services::fetcher::PageFetcher;
use crate::services::{feeds, render_mode, robots, summary};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub struct AnalysisPipeline {
    fetcher: Arc<dyn PageFetcher>,
    config: AnalysisConfig,
    state: PipelineStage,
}

impl AnalysisPipeline {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: AnalysisConfig) -> Self {
        Self {
            fetcher,
            config,
            state: PipelineStage::Init,
        }
    }

    /// Stage reached by the most recent run
    pub fn state(&self) -> PipelineStage {
        self.state
    }

    /// Analyze `url` and assemble its report.
    ///
    /// Only an unparsable URL or a failed static fetch is fatal; everything
    /// else degrades into warnings on the report.
    pub async fn run(&mut self, url: &str) -> Result<SiteReport, AnalysisError> {
        self.state = PipelineStage::Init;
        let result = self.execute(url).await;
        match &result {
            Ok(_) => self.advance(PipelineStage::Done),
            Err(e) => {
                warn!("Analysis of {} failed: {}", url, e);
                self.state = PipelineStage::Failed;
            }
        }
        result
    }

    async fn execute(&mut self, url: &str) -> Result<SiteReport, AnalysisError> {
        let page_url = parse_target(url)?;
        let page = page_url.as_str();
        let mut warnings: Vec<String> = Vec::new();

        let (robots, unavailable) =
            robots::check(self.fetcher.as_ref(), &page_url, &self.config.user_agent).await;
        if let Some(reason) = unavailable {
            warnings.push(WarningKind::RobotsUnavailable.message(reason));
        }
        if let Some(first) = robots.malformed_lines.first() {
            warnings.push(WarningKind::ParseError.message(format!(
                "robots.txt: {} malformed line(s) ignored, first {:?}",
                robots.malformed_lines.len(),
                first
            )));
        }
        self.advance(PipelineStage::RobotsChecked);

        if !robots.allowed {
            info!("robots.txt disallows {} for {}", page, self.config.user_agent);
            warnings.push(WarningKind::RobotsDisallowed.message(format!(
                "{} may not fetch {}",
                self.config.user_agent,
                page_url.path()
            )));
            return Ok(self.assemble(page, robots, Page::default(), warnings));
        }

        let static_html = self
            .fetcher
            .fetch_static(page)
            .await
            .map_err(|source| AnalysisError::Fetch {
                stage: PipelineStage::FetchedStatic,
                source,
            })?;
        self.advance(PipelineStage::FetchedStatic);

        let signals = render_mode::measure(&static_html);
        let mode = render_mode::classify(&signals, &self.config.render_thresholds);
        info!("{} classified as {}", page, mode);
        self.advance(PipelineStage::RenderDecided);

        let html = match mode {
            RenderMode::Static => static_html,
            RenderMode::Dynamic => self.render(page, static_html, &mut warnings).await,
        };

        let feeds = feeds::discover(
            self.fetcher.as_ref(),
            &html,
            page,
            &self.config.feed_probe_paths,
        )
        .await;
        debug!("{} feeds found for {}", feeds.len(), page);
        self.advance(PipelineStage::FeedsDiscovered);

        let extraction = extractor::extract(&html, self.config.min_confident_items);
        if extraction.items.is_empty() {
            warnings.push(WarningKind::NoItemsFound.message(format!(
                "no strategy found {} or more priced items",
                self.config.min_confident_items.max(1)
            )));
        }
        self.advance(PipelineStage::ItemsExtracted);

        let fetched = Page {
            mode,
            signals,
            feeds,
            extraction,
        };
        Ok(self.assemble(page, robots, fetched, warnings))
    }

    /// Fetch the rendered DOM, falling back to the static HTML on failure
    async fn render(
        &mut self,
        page: &str,
        static_html: String,
        warnings: &mut Vec<String>,
    ) -> String {
        match self
            .fetcher
            .fetch_rendered(page, &self.config.wait_policy)
            .await
        {
            Ok(rendered) => {
                self.advance(PipelineStage::FetchedDynamic);
                rendered
            }
            Err(e) => {
                warn!("Dynamic render of {} failed, using static HTML: {}", page, e);
                warnings.push(WarningKind::DynamicRenderFailed.message(&e));
                static_html
            }
        }
    }

    fn assemble(
        &self,
        page: &str,
        robots: RobotsCheck,
        fetched: Page,
        warnings: Vec<String>,
    ) -> SiteReport {
        let crawlability_score = summary::crawlability_score(
            robots.found,
            &robots.crawl_delays,
            &robots.sitemaps,
            fetched.mode,
        );
        let recommendations = summary::recommendations(fetched.mode, !robots.sitemaps.is_empty());
        let menu_summary = summary::summarize(&fetched.extraction.items);

        SiteReport {
            url: page.to_string(),
            robots_allowed: robots.allowed,
            render_mode: fetched.mode,
            feeds: fetched.feeds,
            menu_items: fetched.extraction.items,
            warnings,
            robots_found: robots.found,
            sitemaps: robots.sitemaps,
            crawl_delays: robots.crawl_delays,
            render_signals: fetched.signals,
            extraction_strategy: fetched.extraction.strategy.map(str::to_string),
            crawlability_score,
            recommendations,
            summary: menu_summary,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug!("Pipeline {} -> {}", self.state, next);
        self.state = next;
    }
}

/// What was learned from the page itself
struct Page {
    mode: RenderMode,
    signals: RenderSignals,
    feeds: Vec<FeedRef>,
    extraction: Extraction,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            mode: RenderMode::Static,
            signals: RenderSignals::default(),
            feeds: Vec::new(),
            extraction: Extraction::default(),
        }
    }
}

/// Accept only absolute http(s) URLs with a host
fn parse_target(url: &str) -> Result<Url, AnalysisError> {
    let invalid = |reason: String| AnalysisError::InvalidUrl {
        stage: PipelineStage::Init,
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", parsed.scheme())));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("URL has no host".to_string()));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_rejects_non_http() {
        let err = parse_target("ftp://example.com/menu").unwrap_err();
        assert_eq!(err.stage(), PipelineStage::Init);
        assert!(err.to_string().starts_with("init: invalid URL"));
    }

    #[test]
    fn test_parse_target_rejects_relative() {
        assert!(matches!(
            parse_target("/menu"),
            Err(AnalysisError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_parse_target_trims_whitespace() {
        let url = parse_target("  https://example.com/menu ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/menu");
    }
}
