//! Candidate location: find the DOM fragments that look like deal cards.
//!
//! The storefront's markup changes often enough that no single selector
//! survives for long. Strategies run in priority order, from the stable
//! test-id attributes down to a bare "text with a percent sign and a price"
//! sweep, and the first one that yields anything wins.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

/// Deal grid / deal card test-id attributes.
static TEST_ID_CARDS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "[data-testid=\"grid-deals-container\"] > div, \
         [data-testid=\"deal-card\"]",
    )
    .unwrap()
});

/// Known deal-card class naming patterns.
static DEAL_CLASS_CARDS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "div[class*=\"DealCard\"], \
         div[class*=\"deal-card\"], \
         div[class*=\"dealCard\"]",
    )
    .unwrap()
});

/// Classic shelf/list item patterns and product-id data attributes.
static CLASSIC_CARDS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".shoveler-cell, \
         .a-list-item, \
         div[data-deal-id], \
         div[id*=\"deal\"], \
         li[class*=\"deal\"]",
    )
    .unwrap()
});

/// Anchors straight to product detail pages, plus card UI containers.
static PRODUCT_ANCHOR_CARDS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "div.a-section a[href*=\"/dp/\"], \
         div.a-section a[href*=\"/deal/\"], \
         div.a-cardui",
    )
    .unwrap()
});

/// Generic text sections, filtered by content in the last-resort strategy.
static TEXT_SECTIONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.a-section").unwrap());

/// One DOM fragment hypothesized to hold a single product offer.
///
/// Borrowed from the parsed document; lives only for the extraction pass.
pub struct RawCard<'a> {
    pub element: ElementRef<'a>,
    pub text: String,
    pub index: usize,
}

type LocateFn = for<'a> fn(&'a Html) -> Vec<ElementRef<'a>>;

/// Ordered cascade, most precise first. Evaluation stops at the first
/// strategy returning a non-empty list.
const STRATEGIES: &[(&str, LocateFn)] = &[
    ("test-id attributes", by_test_id),
    ("deal-card classes", by_deal_class),
    ("classic shelf items", by_classic_patterns),
    ("product anchors", by_product_anchor),
    ("discount text blocks", by_discount_text),
];

/// Locates candidate cards in an already-rendered document.
///
/// Read-only traversal; a strategy can only come back empty, never fail the
/// cascade. An empty return means the page had nothing recognizable this run.
pub fn locate(document: &Html) -> Vec<RawCard<'_>> {
    for (name, strategy) in STRATEGIES {
        let elements = strategy(document);
        if !elements.is_empty() {
            debug!(strategy = name, cards = elements.len(), "cards located");
            return elements
                .into_iter()
                .enumerate()
                .map(|(index, element)| RawCard {
                    element,
                    text: flatten_text(element),
                    index,
                })
                .collect();
        }
    }
    Vec::new()
}

fn by_test_id(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&TEST_ID_CARDS).collect()
}

fn by_deal_class(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&DEAL_CLASS_CARDS).collect()
}

fn by_classic_patterns(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&CLASSIC_CARDS).collect()
}

fn by_product_anchor(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&PRODUCT_ANCHOR_CARDS).collect()
}

/// Last resort: any text section carrying a percent sign next to a currency
/// symbol or a discount keyword.
fn by_discount_text(document: &Html) -> Vec<ElementRef<'_>> {
    document
        .select(&TEXT_SECTIONS)
        .filter(|section| {
            let text = flatten_text(*section);
            let upper = text.to_uppercase();
            text.contains('%')
                && (text.contains("R$") || upper.contains("OFF") || upper.contains("DESCONTO"))
        })
        .collect()
}

/// Flattens an element's text nodes into newline-separated trimmed lines.
pub fn flatten_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
