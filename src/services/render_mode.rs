// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Heuristic detection of script-rendered pages.
//!
//! A page is DYNAMIC when any of these hold:
//! - it is sparse (few visible words) and carries many `<script>` tags,
//! - it contains an empty SPA root container (`#root`, `#app`, ...),
//! - script bytes outweigh the body by more than the configured ratio.

use crate::models::config::RenderThresholds;
use crate::models::report::{RenderMode, RenderSignals};
use crate::services::html::visible_word_count;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// Ids that client-side frameworks mount into
const SPA_ROOT_IDS: &[&str] = &["root", "app", "__next", "__nuxt", "svelte", "ember-app"];

static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").expect("valid selector"));
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("valid selector"));
static WITH_ID: Lazy<Selector> = Lazy::new(|| Selector::parse("[id]").expect("valid selector"));

/// Measure the signals the verdict is based on
pub fn measure(html: &str) -> RenderSignals {
    let document = Html::parse_document(html);

    let scripts: Vec<_> = document.select(&SCRIPT).collect();
    let script_bytes: usize = scripts.iter().map(|s| s.html().len()).sum();

    let body = document.select(&BODY).next();
    let body_bytes = body.map(|b| b.html().len()).unwrap_or(0);
    let visible_words = body
        .map(visible_word_count)
        .unwrap_or_else(|| visible_word_count(document.root_element()));

    let spa_markers: Vec<String> = document
        .select(&WITH_ID)
        .filter(|el| {
            let id = el.value().id().unwrap_or("").to_ascii_lowercase();
            SPA_ROOT_IDS.contains(&id.as_str())
                && el.children().all(|child| match child.value().as_text() {
                    Some(text) => text.trim().is_empty(),
                    None => false,
                })
        })
        .filter_map(|el| el.value().id().map(|id| id.to_string()))
        .collect();

    RenderSignals {
        visible_words,
        script_count: scripts.len(),
        script_bytes,
        body_bytes,
        spa_markers,
    }
}

/// Classify measured signals against the thresholds
pub fn classify(signals: &RenderSignals, thresholds: &RenderThresholds) -> RenderMode {
    let sparse_and_scripted = signals.visible_words < thresholds.text_word_threshold
        && signals.script_count > thresholds.script_count_threshold;
    let has_spa_root = !signals.spa_markers.is_empty();
    let script_heavy = signals.script_byte_ratio() > thresholds.script_byte_ratio_threshold;

    if sparse_and_scripted || has_spa_root || script_heavy {
        RenderMode::Dynamic
    } else {
        RenderMode::Static
    }
}

/// Decide whether `static_html` needs a browser to show its content
pub fn detect(static_html: &str, thresholds: &RenderThresholds) -> RenderMode {
    classify(&measure(static_html), thresholds)
}
