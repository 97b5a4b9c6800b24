// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Small DOM helpers shared by the detector, feed discovery and extractor.

use scraper::{ElementRef, Node};

/// Elements whose text is never shown to a reader.
pub const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Visible text nodes below `element`, trimmed, in document order.
pub fn visible_text_chunks(element: ElementRef<'_>) -> Vec<String> {
    let mut chunks = Vec::new();
    collect_text(element, &mut chunks);
    chunks
}

fn collect_text(element: ElementRef<'_>, chunks: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            }
            Node::Element(el) if !HIDDEN_TAGS.contains(&el.name()) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, chunks);
                }
            }
            _ => {}
        }
    }
}

/// Visible text split into non-empty, whitespace-collapsed lines.
pub fn visible_lines(element: ElementRef<'_>) -> Vec<String> {
    visible_text_chunks(element)
        .iter()
        .flat_map(|chunk| chunk.lines())
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Count of whitespace-separated words in the visible text.
pub fn visible_word_count(element: ElementRef<'_>) -> usize {
    visible_text_chunks(element)
        .iter()
        .map(|chunk| chunk.split_whitespace().count())
        .sum()
}

/// Collapse all whitespace in an element's visible text into single spaces.
pub fn normalized_text(element: ElementRef<'_>) -> String {
    visible_text_chunks(element)
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a relative URL against a base URL
pub fn resolve_url(base_url: &str, href: &str) -> String {
    let Ok(base) = url::Url::parse(base_url) else {
        return href.to_string();
    };

    base.join(href)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Whether two absolute URLs share scheme, host and port.
pub fn is_same_origin(candidate: &str, base_url: &str) -> bool {
    match (url::Url::parse(candidate), url::Url::parse(base_url)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin(),
        _ => false,
    }
}
