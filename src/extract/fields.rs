//! Per-card field extraction: link, identifier hint, title candidates,
//! price texts, discount text, image.
//!
//! Absence of any field is normal on this markup and is represented by an
//! empty value; the assembler decides whether the card is still usable.

use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

use crate::config::STORE_BASE_URL;
use crate::extract::locator::RawCard;

/// Product detail anchors, most specific first; the comma keeps document
/// order, so a `/dp/` link wins over a bare `a[href]` only when it comes
/// first in the card, same as the reference markup lays them out.
static PRODUCT_ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href*=\"/dp/\"], a[href*=\"/deal/\"], a[href]").unwrap()
});

/// Title-labeled child elements.
static TITLE_CHILD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "span[class*=\"title\"], \
         a[class*=\"title\"], \
         span.a-truncate-full, \
         div[class*=\"Title\"], \
         span.a-text-normal, \
         a span",
    )
    .unwrap()
});

/// Current-price elements.
static PRICE_CHILD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "span.a-price span.a-offscreen, \
         span.a-price-whole, \
         span[class*=\"price\"]",
    )
    .unwrap()
});

/// Strikethrough list price.
static STRIKE_PRICE_CHILD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.a-price.a-text-price span.a-offscreen").unwrap()
});

static IMAGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());

/// Fixed-length alphanumeric product code embedded in detail URLs.
static ASIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/dp/([A-Z0-9]{10})").unwrap());

static DEAL_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)dealid=([^&]+)").unwrap());

/// Localized currency amount: symbol, dot-grouped digits, decimal comma,
/// two decimals. Deliberately strict so stray numbers don't parse as prices.
static PRICE_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"R\$\s*\d{1,3}(?:\.\d{3})*,\d{2}").unwrap());

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*%").unwrap());

const MIN_ANCHOR_TITLE_LEN: usize = 15;
const MIN_ALT_TITLE_LEN: usize = 10;
const MIN_TEXT_LINE_LEN: usize = 10;

/// Raw signals pulled from one card, before normalization.
#[derive(Debug, Default, Clone)]
pub struct RawFields {
    /// Absolute product URL, empty when no anchor was found.
    pub link: String,
    /// Stable product code from the URL, when one could be matched.
    pub identifier_hint: Option<String>,
    /// Title candidates in preference order; the assembler takes the first
    /// one that survives cleanup.
    pub title_candidates: Vec<String>,
    /// Every distinct currency string seen in the card.
    pub price_texts: Vec<String>,
    /// First "N%" fragment of the card text.
    pub discount_text: Option<String>,
    pub image_url: Option<String>,
}

/// Extracts the raw signals from one located card.
pub fn extract(card: &RawCard<'_>) -> RawFields {
    let mut fields = RawFields::default();

    // Link + identifier. The card element itself may be the anchor when the
    // locator fell back to the product-anchor strategy.
    let anchor_href = if card.element.value().name() == "a" {
        card.element.value().attr("href")
    } else {
        card.element
            .select(&PRODUCT_ANCHOR)
            .next()
            .and_then(|a| a.value().attr("href"))
    };
    if let Some(href) = anchor_href {
        fields.link = absolutize(href);
        fields.identifier_hint = identifier_from_url(&fields.link);
    }

    collect_title_candidates(card, &fields.link, &mut fields.title_candidates);
    collect_price_texts(card, &mut fields.price_texts);

    fields.discount_text = PERCENT_RE
        .find(&card.text)
        .map(|m| m.as_str().to_string());

    fields.image_url = card
        .element
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(absolutize);

    fields
}

/// Pulls the stable product code out of a detail-page URL.
pub fn identifier_from_url(url: &str) -> Option<String> {
    if let Some(caps) = ASIN_RE.captures(url) {
        return Some(caps[1].to_string());
    }
    DEAL_ID_RE.captures(url).map(|caps| caps[1].to_string())
}

fn collect_title_candidates(card: &RawCard<'_>, link: &str, candidates: &mut Vec<String>) {
    // (a) title-labeled child element
    if let Some(el) = card.element.select(&TITLE_CHILD).next() {
        push_candidate(candidates, el.text().collect::<String>());
    }

    // (b) the product anchor's own text, when long enough to be a name
    if !link.is_empty() {
        let anchor_text = if card.element.value().name() == "a" {
            Some(card.element.text().collect::<String>())
        } else {
            card.element
                .select(&PRODUCT_ANCHOR)
                .next()
                .map(|a| a.text().collect::<String>())
        };
        if let Some(text) = anchor_text
            && text.trim().chars().count() >= MIN_ANCHOR_TITLE_LEN
        {
            push_candidate(candidates, text);
        }
    }

    // (c) image alt text
    if let Some(alt) = card
        .element
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("alt"))
        && alt.trim().chars().count() >= MIN_ALT_TITLE_LEN
    {
        push_candidate(candidates, alt.to_string());
    }

    // (d) longest plain line of the card text that isn't a price or a badge
    if let Some(line) = card
        .text
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.chars().count() > MIN_TEXT_LINE_LEN
                && !line.contains("R$")
                && !line.contains('%')
        })
        .max_by_key(|line| line.chars().count())
    {
        push_candidate(candidates, line.to_string());
    }
}

fn push_candidate(candidates: &mut Vec<String>, raw: String) {
    let trimmed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !trimmed.is_empty() && !candidates.contains(&trimmed) {
        candidates.push(trimmed);
    }
}

/// Price position in the markup is unreliable, so collection is deliberately
/// over-inclusive: dedicated price elements first, then every currency match
/// in the flattened text.
fn collect_price_texts(card: &RawCard<'_>, prices: &mut Vec<String>) {
    let mut push = |raw: String| {
        let trimmed = raw.trim().to_string();
        if !trimmed.is_empty() && !prices.contains(&trimmed) {
            prices.push(trimmed);
        }
    };

    for el in card.element.select(&STRIKE_PRICE_CHILD) {
        push(el.text().collect::<String>());
    }
    for el in card.element.select(&PRICE_CHILD) {
        push(el.text().collect::<String>());
    }
    for m in PRICE_TEXT_RE.find_iter(&card.text) {
        push(m.as_str().to_string());
    }
}

fn absolutize(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{STORE_BASE_URL}{href}")
    } else {
        href.to_string()
    }
}
