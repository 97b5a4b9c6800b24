// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Heuristic menu-item extraction.
//!
//! Extraction is an ordered list of independent strategies, each a pure
//! function from a parsed document to menu items. The first strategy whose
//! result holds enough complete items (name and price) wins:
//!
//! 1. `menu_panels`: accordion/tab layouts where a panel title names the
//!    category and the panel body lists items line by line.
//! 2. `repeated_blocks`: repeated sibling elements, each holding one
//!    price-like text and a name.
//! 3. `text_lines`: the whole visible page, each price paired with the line
//!    just before it.

use crate::models::report::MenuItem;
use crate::services::html::{normalized_text, visible_lines, visible_text_chunks, HIDDEN_TAGS};
use once_cell::sync::Lazy;
use regex::{Match, Regex};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Price-like text: `$12.50`, `€9`, `12,50 €`, `4.75`, `120 L.E`, `85 LE`.
pub static PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[$€£]\s?\d{1,5}(?:[.,]\d{2})?|\b\d{1,5}[.,]\d{2}\b(?:\s?[€£]|\s?L\.?E\b\.?)?|\b\d{1,5}\s?L\.?E\b\.?",
    )
    .expect("price regex is valid")
});

/// Lines that only label a price column
const PRICE_LABELS: &[&str] = &["price", "l.e", "le", "l.e."];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4"];

/// How far a price may sit below the element that carries the item's name
const MAX_BLOCK_ASCENT: usize = 4;

/// A pure extraction heuristic
pub type Strategy = fn(&Html) -> Vec<MenuItem>;

/// Strategies in the order they are tried
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("menu_panels", menu_panels),
    ("repeated_blocks", repeated_blocks),
    ("text_lines", text_lines),
];

/// Items found on a page and the strategy that produced them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub items: Vec<MenuItem>,
    pub strategy: Option<&'static str>,
}

/// Run the strategies in order and keep the first confident result.
///
/// A result is confident when at least `min_confident_items` (and never fewer
/// than one) items have both a name and a price. An empty extraction is a
/// valid outcome.
pub fn extract(html: &str, min_confident_items: usize) -> Extraction {
    let document = Html::parse_document(html);
    let required = min_confident_items.max(1);

    for (name, strategy) in STRATEGIES {
        let items = strategy(&document);
        let complete = items.iter().filter(|item| item.is_complete()).count();
        debug!(
            "Strategy {} found {} items ({} complete)",
            name,
            items.len(),
            complete
        );
        if complete >= required {
            return Extraction {
                items,
                strategy: Some(*name),
            };
        }
    }

    Extraction::default()
}

// ---------------------------------------------------------------------------
// Strategy 1: category panels
// ---------------------------------------------------------------------------

struct PanelLayout {
    panel: &'static str,
    title: &'static str,
    /// `None` when the items sit directly in the panel
    body: Option<&'static str>,
}

const PANEL_LAYOUTS: &[PanelLayout] = &[
    PanelLayout {
        panel: ".vc_tta-panel",
        title: ".vc_tta-panel-heading .vc_tta-title-text",
        body: Some(".vc_tta-panel-body"),
    },
    PanelLayout {
        panel: ".menu-section, .menu-category",
        title: "h2, h3",
        body: None,
    },
];

pub fn menu_panels(document: &Html) -> Vec<MenuItem> {
    for layout in PANEL_LAYOUTS {
        let (Ok(panel_sel), Ok(title_sel)) =
            (Selector::parse(layout.panel), Selector::parse(layout.title))
        else {
            continue;
        };
        let body_sel = layout.body.and_then(|s| Selector::parse(s).ok());

        let mut items = Vec::new();
        for panel in document.select(&panel_sel) {
            let category = panel
                .select(&title_sel)
                .next()
                .map(normalized_text)
                .filter(|t| !t.is_empty());

            let body = match &body_sel {
                Some(sel) => match panel.select(sel).next() {
                    Some(body) => body,
                    None => continue,
                },
                None => panel,
            };

            let mut lines = visible_lines(body);
            if body.id() == panel.id() {
                if let Some(title) = &category {
                    if let Some(pos) = lines.iter().position(|line| line == title) {
                        lines.remove(pos);
                    }
                }
            }
            items.extend(scan_lines(&lines, category.as_deref()));
        }

        if !items.is_empty() {
            return items;
        }
    }

    Vec::new()
}

// ---------------------------------------------------------------------------
// Strategy 2: repeated sibling blocks
// ---------------------------------------------------------------------------

pub fn repeated_blocks(document: &Html) -> Vec<MenuItem> {
    let mut headings: Vec<ElementRef> = Vec::new();
    let mut blocks: Vec<(ElementRef, Option<String>)> = Vec::new();

    for node in document.root_element().descendants() {
        if let Some(el) = ElementRef::wrap(node) {
            if HEADING_TAGS.contains(&el.value().name()) {
                headings.push(el);
            }
            continue;
        }

        let Some(text) = node.value().as_text() else {
            continue;
        };
        if !PRICE.is_match(text) {
            continue;
        }
        let Some(holder) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if is_hidden(holder) {
            continue;
        }
        let Some(block) = enclosing_block(holder) else {
            continue;
        };
        if blocks.iter().any(|(seen, _)| seen.id() == block.id()) {
            continue;
        }

        let category = headings
            .iter()
            .rev()
            .find(|heading| heads_section_of(**heading, block))
            .map(|heading| normalized_text(*heading))
            .filter(|t| !t.is_empty());
        blocks.push((block, category));
    }

    let units: Vec<ElementRef> = blocks.iter().map(|(block, _)| repeat_unit(*block)).collect();
    blocks
        .iter()
        .zip(&units)
        .filter(|(_, unit)| {
            units
                .iter()
                .filter(|other| are_repeated_siblings(**unit, **other))
                .count()
                >= 2
        })
        .filter_map(|((block, category), _)| block_item(*block, category.as_deref()))
        .collect()
}

/// The element that repeats for a block: the block itself, or the outermost
/// wrapper reached through parents that hold nothing but it (`.col > .card`)
fn repeat_unit(block: ElementRef<'_>) -> ElementRef<'_> {
    let mut unit = block;
    while let Some(parent) = unit.parent().and_then(ElementRef::wrap) {
        if matches!(parent.value().name(), "body" | "html") {
            break;
        }
        let element_children = parent
            .children()
            .filter(|child| child.value().is_element())
            .count();
        if element_children != 1 {
            break;
        }
        unit = parent;
    }
    unit
}

/// Smallest ancestor of a price holder that also carries a name and only one price
fn enclosing_block(holder: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut candidate = holder;
    for _ in 0..MAX_BLOCK_ASCENT {
        let text = normalized_text(candidate);
        if PRICE.find_iter(&text).count() > 1 {
            return None;
        }
        if PRICE.find(&text).map(|m| has_name(&text, m)).unwrap_or(false) {
            return Some(candidate);
        }
        candidate = candidate.parent().and_then(ElementRef::wrap)?;
        if matches!(candidate.value().name(), "body" | "html") {
            return None;
        }
    }
    None
}

fn block_item(block: ElementRef<'_>, category: Option<&str>) -> Option<MenuItem> {
    let mut name: Option<String> = None;
    let mut price: Option<String> = None;
    let mut description: Vec<String> = Vec::new();

    for chunk in visible_text_chunks(block) {
        let chunk = collapse_whitespace(&chunk);
        let rest = match PRICE.find(&chunk) {
            Some(m) => {
                if price.is_none() {
                    price = Some(m.as_str().trim().to_string());
                }
                strip_price(&chunk, m)
            }
            None => chunk,
        };
        if !has_letters(&rest) || is_price_label(&rest) {
            continue;
        }
        if name.is_none() {
            name = Some(rest);
        } else {
            description.push(rest);
        }
    }

    Some(MenuItem {
        name: name?,
        price,
        description: join_description(description),
        category: category.map(str::to_string),
    })
}

fn are_repeated_siblings(a: ElementRef<'_>, b: ElementRef<'_>) -> bool {
    let parent_a = a.parent().map(|p| p.id());
    let parent_b = b.parent().map(|p| p.id());
    parent_a.is_some() && parent_a == parent_b && a.value().name() == b.value().name()
}

/// A heading titles `block` when it sits beside the block or beside one of its ancestors
fn heads_section_of(heading: ElementRef<'_>, block: ElementRef<'_>) -> bool {
    let Some(parent) = heading.parent() else {
        return false;
    };
    block.ancestors().any(|ancestor| ancestor.id() == parent.id())
        && !heading.ancestors().any(|ancestor| ancestor.id() == block.id())
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    HIDDEN_TAGS.contains(&element.value().name())
        || element.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| HIDDEN_TAGS.contains(&el.name()))
                .unwrap_or(false)
        })
}

// ---------------------------------------------------------------------------
// Strategy 3: whole-page line scan
// ---------------------------------------------------------------------------

pub fn text_lines(document: &Html) -> Vec<MenuItem> {
    let Ok(body_sel) = Selector::parse("body") else {
        return Vec::new();
    };
    let root = document
        .select(&body_sel)
        .next()
        .unwrap_or_else(|| document.root_element());
    pair_lines(&visible_lines(root))
}

// ---------------------------------------------------------------------------
// Line scanners
// ---------------------------------------------------------------------------

/// Walk lines as name, optional description lines, then a price line.
///
/// A price line closes the open item. A price line with its own text and no
/// open item becomes a one-line item. Bare price labels are skipped.
pub fn scan_lines(lines: &[String], category: Option<&str>) -> Vec<MenuItem> {
    let mut items = Vec::new();
    let mut current: Option<MenuItem> = None;
    let mut description: Vec<String> = Vec::new();

    for line in lines {
        if let Some(m) = PRICE.find(line) {
            let price = m.as_str().trim().to_string();
            match current.take() {
                Some(mut item) => {
                    item.price = Some(price);
                    item.description = join_description(std::mem::take(&mut description));
                    items.push(item);
                }
                None => {
                    let rest = strip_price(line, m);
                    if has_letters(&rest) && !is_price_label(&rest) {
                        items.push(MenuItem {
                            name: rest,
                            price: Some(price),
                            description: None,
                            category: category.map(str::to_string),
                        });
                    }
                }
            }
            continue;
        }

        if is_price_label(line) {
            continue;
        }

        if current.is_some() {
            description.push(line.clone());
        } else {
            current = Some(MenuItem {
                name: line.clone(),
                category: category.map(str::to_string),
                ..MenuItem::default()
            });
        }
    }

    items
}

/// Pair each price line with its own text or the line directly before it.
///
/// Used for the whole page, where headings and navigation precede the first
/// item, so text is never carried across more than one line.
pub fn pair_lines(lines: &[String]) -> Vec<MenuItem> {
    let mut items = Vec::new();
    let mut previous: Option<&String> = None;

    for line in lines {
        let Some(m) = PRICE.find(line) else {
            if !is_price_label(line) {
                previous = Some(line);
            }
            continue;
        };

        let rest = strip_price(line, m);
        let name = if has_letters(&rest) && !is_price_label(&rest) {
            Some(rest)
        } else {
            previous.filter(|prev| has_letters(prev)).cloned()
        };
        previous = None;

        if let Some(name) = name {
            items.push(MenuItem {
                name,
                price: Some(m.as_str().trim().to_string()),
                ..MenuItem::default()
            });
        }
    }

    items
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

fn strip_price(text: &str, m: Match<'_>) -> String {
    let joined = format!("{} {}", &text[..m.start()], &text[m.end()..]);
    collapse_whitespace(&joined)
        .trim_matches(|c: char| c.is_whitespace() || "-–—.:|·".contains(c))
        .to_string()
}

fn has_name(text: &str, m: Match<'_>) -> bool {
    let rest = strip_price(text, m);
    has_letters(&rest) && !is_price_label(&rest)
}

fn has_letters(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

fn is_price_label(text: &str) -> bool {
    let lower = text.trim().trim_end_matches(':').trim().to_lowercase();
    PRICE_LABELS.contains(&lower.as_str())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn join_description(parts: Vec<String>) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_BLOCKS: &str = r#"
        <html><body>
          <h1>Lunch Menu</h1>
          <div class="menu">
            <div class="item"><h3>Burger</h3><p>Beef patty, cheddar</p><span class="price">$12.50</span></div>
            <div class="item"><h3>Caesar Salad</h3><span class="price">$9.75</span></div>
            <div class="item"><h3>Lemonade</h3><p>Fresh</p><span class="price">$3.00</span></div>
          </div>
        </body></html>"#;

    fn names(items: &[MenuItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_price_regex_formats() {
        for text in ["$12.50", "€9", "12,50 €", "4.75", "120 L.E", "85 LE", "£3.20"] {
            assert!(PRICE.is_match(text), "expected a price in {text:?}");
        }
        for text in ["Burger", "Open 7 days", "Call 5551234"] {
            assert!(!PRICE.is_match(text), "unexpected price in {text:?}");
        }
    }

    #[test]
    fn test_repeated_blocks_in_document_order() {
        let extraction = extract(THREE_BLOCKS, 2);
        assert_eq!(extraction.strategy, Some("repeated_blocks"));
        assert_eq!(
            names(&extraction.items),
            vec!["Burger", "Caesar Salad", "Lemonade"]
        );
        let prices: Vec<_> = extraction
            .items
            .iter()
            .map(|i| i.price.as_deref().unwrap())
            .collect();
        assert_eq!(prices, vec!["$12.50", "$9.75", "$3.00"]);
        assert_eq!(
            extraction.items[0].description.as_deref(),
            Some("Beef patty, cheddar")
        );
        assert_eq!(extraction.items[1].description, None);
        assert_eq!(extraction.items[0].category.as_deref(), Some("Lunch Menu"));
    }

    #[test]
    fn test_repeated_table_rows() {
        let html = r#"<table>
            <tr><td>Espresso</td><td>2.50</td></tr>
            <tr><td>Latte</td><td>3.80</td></tr>
        </table>"#;
        let items = repeated_blocks(&Html::parse_document(html));
        assert_eq!(names(&items), vec!["Espresso", "Latte"]);
        assert_eq!(items[1].price.as_deref(), Some("3.80"));
    }

    #[test]
    fn test_inline_name_and_price() {
        let html = r#"<ul><li>Pancakes ..... $7.00</li><li>Waffles - $8.50</li></ul>"#;
        let items = repeated_blocks(&Html::parse_document(html));
        assert_eq!(names(&items), vec!["Pancakes", "Waffles"]);
        assert_eq!(items[0].price.as_deref(), Some("$7.00"));
    }

    #[test]
    fn test_lone_priced_block_is_not_repeated() {
        let html = r#"<div><p>Gift cards from</p><span>$25.00</span></div><p>About us</p>"#;
        assert!(repeated_blocks(&Html::parse_document(html)).is_empty());
    }

    #[test]
    fn test_panels_assign_categories() {
        let html = r#"
        <div class="vc_tta-panel">
          <div class="vc_tta-panel-heading"><span class="vc_tta-title-text">Breakfast</span></div>
          <div class="vc_tta-panel-body">
            <p>Foul Sandwich</p><p>With tahini</p><p>Price: 15 L.E</p>
            <p>Falafel Sandwich</p><p>12 L.E</p>
          </div>
        </div>
        <div class="vc_tta-panel">
          <div class="vc_tta-panel-heading"><span class="vc_tta-title-text">Drinks</span></div>
          <div class="vc_tta-panel-body"><p>Mint Tea</p><p>20 LE</p></div>
        </div>"#;
        let extraction = extract(html, 2);
        assert_eq!(extraction.strategy, Some("menu_panels"));
        assert_eq!(
            extraction.items,
            vec![
                MenuItem {
                    name: "Foul Sandwich".to_string(),
                    price: Some("15 L.E".to_string()),
                    description: Some("With tahini".to_string()),
                    category: Some("Breakfast".to_string()),
                },
                MenuItem {
                    name: "Falafel Sandwich".to_string(),
                    price: Some("12 L.E".to_string()),
                    description: None,
                    category: Some("Breakfast".to_string()),
                },
                MenuItem {
                    name: "Mint Tea".to_string(),
                    price: Some("20 LE".to_string()),
                    description: None,
                    category: Some("Drinks".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_generic_menu_section_drops_title_line() {
        let html = r#"
        <section class="menu-section">
          <h2>Desserts</h2>
          <p>Baklava</p><p>4.50</p>
          <p>Kunafa</p><p>5.25</p>
        </section>"#;
        let items = menu_panels(&Html::parse_document(html));
        assert_eq!(names(&items), vec!["Baklava", "Kunafa"]);
        assert!(items
            .iter()
            .all(|i| i.category.as_deref() == Some("Desserts")));
    }

    #[test]
    fn test_scan_lines_skips_labels_and_joins_descriptions() {
        let lines: Vec<String> = ["Koshari", "Rice, lentils", "and pasta", "Price", "45 L.E."]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let items = scan_lines(&lines, None);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Koshari");
        assert_eq!(
            items[0].description.as_deref(),
            Some("Rice, lentils and pasta")
        );
        assert_eq!(items[0].price.as_deref(), Some("45 L.E."));
    }

    #[test]
    fn test_card_grid_with_page_heading() {
        let html = r#"
        <html><body>
          <h1>Our Menu</h1>
          <div class="row">
            <div class="col"><div class="card"><h3>Burger</h3><span>$12.50</span></div></div>
            <div class="col"><div class="card"><h3>Salad</h3><span>$9.00</span></div></div>
            <div class="col"><div class="card"><h3>Soda</h3><span>$3.00</span></div></div>
          </div>
        </body></html>"#;
        let extraction = extract(html, 2);
        assert_eq!(extraction.strategy, Some("repeated_blocks"));
        assert_eq!(names(&extraction.items), vec!["Burger", "Salad", "Soda"]);
        assert_eq!(extraction.items[0].price.as_deref(), Some("$12.50"));
        assert_eq!(extraction.items[0].description, None);
        assert_eq!(extraction.items[0].category.as_deref(), Some("Our Menu"));
    }

    #[test]
    fn test_page_scan_ignores_text_before_first_item() {
        let html = r#"<body>
            <nav>Home About Contact</nav>
            <h1>Our Menu</h1>
            <p>Burger</p><p>$12.50</p>
            <p>Salad</p><p>Price</p><p>$9.00</p>
        </body>"#;
        let items = text_lines(&Html::parse_document(html));
        assert_eq!(names(&items), vec!["Burger", "Salad"]);
        assert_eq!(items[1].price.as_deref(), Some("$9.00"));
        assert!(items.iter().all(|i| i.description.is_none()));
    }

    #[test]
    fn test_no_prices_yields_empty_extraction() {
        let html = "<html><body><h1>Welcome</h1><p>Visit us downtown, open daily.</p></body></html>";
        let extraction = extract(html, 2);
        assert!(extraction.items.is_empty());
        assert_eq!(extraction.strategy, None);
    }

    #[test]
    fn test_single_item_below_confidence_threshold() {
        let html = "<ul><li>Soup $4.00</li><li>Contact us</li></ul>";
        assert_eq!(extract(html, 2), Extraction::default());
        assert_eq!(extract(html, 1).items.len(), 1);
    }

    #[test]
    fn test_prices_inside_scripts_ignored() {
        let html = r#"<body><script>var p = "$12.50"; var q = "$3.00";</script><p>Closed</p></body>"#;
        assert!(extract(html, 1).items.is_empty());
    }
}
