// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! robots.txt gate for an analysis run.

use crate::models::robots::{RobotsCheck, RobotsRule};
use crate::services::fetcher::PageFetcher;
use texting_robots::Robot;
use tracing::{debug, info, warn};
use url::Url;

/// `{origin}/robots.txt` for the given page
pub fn robots_url(page_url: &Url) -> String {
    format!("{}/robots.txt", page_url.origin().ascii_serialization())
}

/// Path (plus query) that robots rules are matched against
fn target_path(page_url: &Url) -> String {
    match page_url.query() {
        Some(query) => format!("{}?{}", page_url.path(), query),
        None => page_url.path().to_string(),
    }
}

/// Product token of a user agent (`MenuScoutBot/0.1` -> `MenuScoutBot`)
fn product_token(user_agent: &str) -> &str {
    user_agent.split('/').next().unwrap_or(user_agent).trim()
}

/// Fetch robots.txt for the page's site and decide whether the page may be fetched.
///
/// Any fetch failure (network, timeout, non-2xx) fails open: the page is allowed,
/// the rule is empty and `unavailable_reason` explains why.
pub async fn check(
    fetcher: &dyn PageFetcher,
    page_url: &Url,
    user_agent: &str,
) -> (RobotsCheck, Option<String>) {
    let robots_url = robots_url(page_url);
    debug!("Fetching robots.txt from {}", robots_url);

    let robots_txt = match fetcher.fetch_static(&robots_url).await {
        Ok(text) => text,
        Err(e) => {
            // If robots.txt doesn't exist or can't be fetched, assume allowed
            warn!("robots.txt unavailable for {}: {}", robots_url, e);
            let check = RobotsCheck {
                allowed: true,
                rule: RobotsRule::allow_all(user_agent),
                ..RobotsCheck::default()
            };
            return (check, Some(e.to_string()));
        }
    };

    let check = evaluate(&robots_txt, user_agent, page_url);
    info!(
        "robots.txt for {} parsed: allowed={}, sitemaps={}",
        page_url,
        check.allowed,
        check.sitemaps.len()
    );
    (check, None)
}

/// Decide whether `page_url` may be fetched under the given robots.txt.
///
/// The verdict and sitemaps come from [`Robot`], which understands `*` and `$`
/// patterns. The group scan in [`parse`] only fills the reported rule sets,
/// crawl delays and malformed lines, and decides on its own when `Robot`
/// rejects the file.
pub fn evaluate(text: &str, user_agent: &str, page_url: &Url) -> RobotsCheck {
    let mut check = parse(text, user_agent);

    match Robot::new(product_token(user_agent), text.as_bytes()) {
        Ok(robot) => {
            check.allowed = robot.allowed(page_url.as_str());
            if let Some(delay) = robot.delay {
                debug!("Crawl-delay for {}: {}s", user_agent, delay);
            }
            check.sitemaps = robot.sitemaps;
        }
        Err(e) => {
            warn!("robots.txt could not be parsed, using prefix rules: {}", e);
            check.allowed = check.rule.is_allowed(&target_path(page_url));
        }
    }
    check
}

#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    disallow: Vec<String>,
    allow: Vec<String>,
}

/// Scan robots.txt groups and resolve the prefix rule for `user_agent`.
///
/// Groups naming the agent's product token take precedence over `*`.
/// `allowed` is only the verdict for `/`; sitemaps are left to [`evaluate`].
/// Blank lines, comments and unknown directives are ignored; lines without
/// a `key: value` shape are collected in `malformed_lines`.
pub fn parse(text: &str, user_agent: &str) -> RobotsCheck {
    let mut groups: Vec<Group> = Vec::new();
    let mut last_was_agent = false;
    let mut check = RobotsCheck {
        found: true,
        ..RobotsCheck::default()
    };

    for raw_line in text.trim_start_matches('\u{feff}').lines() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            check.malformed_lines.push(line.to_string());
            continue;
        };
        let value = value.trim();

        match key.trim().to_ascii_lowercase().as_str() {
            "user-agent" => {
                if !last_was_agent || groups.is_empty() {
                    groups.push(Group::default());
                }
                if let Some(group) = groups.last_mut() {
                    group.agents.push(value.to_ascii_lowercase());
                }
                last_was_agent = true;
            }
            directive @ ("disallow" | "allow") => {
                last_was_agent = false;
                let Some(group) = groups.last_mut() else {
                    check.malformed_lines.push(line.to_string());
                    continue;
                };
                if value.is_empty() {
                    continue;
                }
                if directive == "disallow" {
                    group.disallow.push(value.to_string());
                } else {
                    group.allow.push(value.to_string());
                }
            }
            "crawl-delay" => {
                last_was_agent = false;
                check.crawl_delays.push(value.to_string());
            }
            _ => {}
        }
    }

    check.rule = resolve_rule(&groups, user_agent);
    check.allowed = check.rule.is_allowed("/");
    check
}

fn resolve_rule(groups: &[Group], user_agent: &str) -> RobotsRule {
    let full = user_agent.trim().to_ascii_lowercase();
    let product = product_token(&full).to_string();

    let is_exact = |agent: &String| agent != "*" && (*agent == full || *agent == product);
    let exact: Vec<&Group> = groups
        .iter()
        .filter(|g| g.agents.iter().any(|a| is_exact(a)))
        .collect();
    let matching: Vec<&Group> = if exact.is_empty() {
        groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| a == "*"))
            .collect()
    } else {
        exact
    };

    let mut rule = RobotsRule::allow_all(user_agent);
    for group in matching {
        rule.disallowed_paths.extend(group.disallow.iter().cloned());
        rule.allowed_paths.extend(group.allow.iter().cloned());
    }
    rule
}
