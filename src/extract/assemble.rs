//! Deal assembly: thresholds, plausibility checks, title cleanup, and
//! canonical URL construction.

use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::{Config, PRODUCT_PATH, STORE_BASE_URL};
use crate::extract::fields::RawFields;
use crate::extract::normalize::Pricing;
use crate::models::{Deal, IdQuality, SkipReason};

/// Marketing boilerplate the storefront injects around titles.
static LOWEST_PRICE_BANNER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)menor preço em \d+ dias").unwrap());
static OFFER_BADGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)oferta\s*-?\s*\d+%\s*(off)?").unwrap());
static PRICE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)R\$\s*por:").unwrap());
static GLUED_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)preço\s*da\s*oferta").unwrap());

const FALLBACK_TITLE: &str = "Produto em Oferta";

/// Product categories expensive enough that a single-digit price tag next to
/// a huge discount badge is almost certainly a misread, not a deal.
const HIGH_VALUE_KEYWORDS: &[&str] = &[
    "iphone",
    "smartphone",
    "galaxy",
    "notebook",
    "macbook",
    "smart tv",
    " tv ",
    "playstation",
    "ps5",
    "xbox",
    "geladeira",
];

/// Combines one card's raw fields and normalized pricing into a [`Deal`].
///
/// `index` is the card's position in the located list; it only matters for
/// the synthetic identifier fallback.
pub fn assemble(
    fields: &RawFields,
    pricing: &Pricing,
    index: usize,
    config: &Config,
) -> Result<Deal, SkipReason> {
    if fields.link.is_empty()
        && fields.title_candidates.is_empty()
        && fields.price_texts.is_empty()
    {
        return Err(SkipReason::EmptyCard);
    }

    if pricing.discount < config.min_discount {
        return Err(SkipReason::BelowThreshold {
            discount: pricing.discount,
            minimum: config.min_discount,
        });
    }

    if fields.link.is_empty() {
        return Err(SkipReason::NoLink);
    }

    let Some(current) = pricing.current.clone() else {
        return Err(SkipReason::NoPrice);
    };

    let title = clean_title(&fields.title_candidates, config.title_max_len);

    // A huge badge on a tiny price for an expensive category, with no
    // observed list price to cross-check against, is treated as a misread.
    let original_observed = pricing.original.is_some() && !pricing.original_is_derived;
    if !original_observed
        && current.value <= config.suspect_price_ceiling
        && pricing.discount >= config.suspect_discount_floor
        && mentions_high_value_category(&title)
    {
        debug!(
            title = %title,
            price = current.value,
            discount = pricing.discount,
            "rejecting implausible low-price/high-discount combination"
        );
        return Err(SkipReason::ImplausibleDiscount {
            discount: pricing.discount,
        });
    }

    let (id, id_quality) = match &fields.identifier_hint {
        Some(code) => (code.clone(), IdQuality::Stable),
        // Position-derived fallback: not stable across runs, kept only so a
        // card without a recognizable product code can still be published.
        None => (
            format!("deal_{index}_{}", pricing.discount),
            IdQuality::Synthetic,
        ),
    };

    Ok(Deal {
        canonical_url: canonical_url(fields, config),
        id,
        id_quality,
        title,
        current_price: Some(current),
        original_price: pricing.original.clone(),
        discount_percent: pricing.discount,
        image_url: fields.image_url.clone(),
        discovered_at: Utc::now(),
    })
}

/// First candidate that survives boilerplate stripping, capped in length.
/// Never empty: falls back to a generic placeholder.
fn clean_title(candidates: &[String], max_len: usize) -> String {
    for candidate in candidates {
        let mut title = candidate.clone();
        title = LOWEST_PRICE_BANNER_RE.replace_all(&title, "").into_owned();
        title = OFFER_BADGE_RE.replace_all(&title, "").into_owned();
        title = PRICE_LABEL_RE.replace_all(&title, "").into_owned();
        title = GLUED_LABEL_RE.replace_all(&title, "").into_owned();
        let title = title.trim().trim_matches(['-', '–', ':']).trim();
        if !title.is_empty() {
            return truncate_chars(title, max_len);
        }
    }
    FALLBACK_TITLE.to_string()
}

fn truncate_chars(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        s.chars().take(max_len).collect::<String>().trim_end().to_string()
    }
}

fn mentions_high_value_category(title: &str) -> bool {
    // Padded with spaces so the bare "tv" keyword can't fire inside a word.
    let haystack = format!(" {} ", title.to_lowercase());
    HIGH_VALUE_KEYWORDS
        .iter()
        .any(|keyword| haystack.contains(keyword))
}

/// Rebuilds the product URL from the bare product code when one exists;
/// captured hrefs carry session and tracking noise that changes between
/// extraction passes and would defeat the announced-id dedup.
fn canonical_url(fields: &RawFields, config: &Config) -> String {
    let mut url = match &fields.identifier_hint {
        Some(code) if is_product_code(code) => {
            format!("{STORE_BASE_URL}{PRODUCT_PATH}{code}")
        }
        _ => {
            let mut base = fields.link.as_str();
            if let Some(cut) = base.find('?') {
                base = &base[..cut];
            }
            if let Some(cut) = base.find("ref=") {
                base = &base[..cut];
            }
            base.trim_end_matches('/').to_string()
        }
    };

    if let Some(tag) = &config.affiliate_tag {
        let separator = if url.contains('?') { '&' } else { '?' };
        url = format!("{url}{separator}tag={}", urlencoding::encode(tag));
    }
    url
}

/// Fixed-length alphanumeric product code shape.
fn is_product_code(code: &str) -> bool {
    code.len() == 10
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::normalize::normalize;
    use crate::models::NormalizedPrice;

    fn fields(link: &str, titles: &[&str], prices: &[&str], discount: Option<&str>) -> RawFields {
        RawFields {
            link: link.to_string(),
            identifier_hint: crate::extract::fields::identifier_from_url(link),
            title_candidates: titles.iter().map(|t| t.to_string()).collect(),
            price_texts: prices.iter().map(|p| p.to_string()).collect(),
            discount_text: discount.map(|d| d.to_string()),
            image_url: None,
        }
    }

    fn assemble_with(fields: &RawFields, config: &Config) -> Result<Deal, SkipReason> {
        let pricing = normalize(fields, config.discount_tolerance);
        assemble(fields, &pricing, 0, config)
    }

    #[test]
    fn assembles_consistent_deal() {
        let config = Config::for_tests();
        let f = fields(
            "https://www.amazon.com.br/dp/B0ABC12345?ref=deals",
            &["Air Fryer Mondial 4L"],
            &["R$ 1.200,00", "R$ 840,00"],
            Some("30%"),
        );
        let deal = assemble_with(&f, &config).unwrap();
        assert_eq!(deal.id, "B0ABC12345");
        assert_eq!(deal.id_quality, IdQuality::Stable);
        assert_eq!(deal.current_price.as_ref().unwrap().value, 840.0);
        assert_eq!(deal.original_price.as_ref().unwrap().value, 1200.0);
        assert_eq!(deal.discount_percent, 30);
        assert_eq!(
            deal.canonical_url,
            "https://www.amazon.com.br/dp/B0ABC12345?tag=scout-20"
        );
    }

    #[test]
    fn below_threshold_is_skipped() {
        let config = Config::for_tests();
        let f = fields(
            "https://www.amazon.com.br/dp/B0ABC12345",
            &["Produto"],
            &["R$ 99,90"],
            Some("10%"),
        );
        assert_eq!(
            assemble_with(&f, &config),
            Err(SkipReason::BelowThreshold {
                discount: 10,
                minimum: 20
            })
        );
    }

    #[test]
    fn missing_link_is_skipped() {
        let config = Config::for_tests();
        let f = fields("", &["Produto bom"], &["R$ 99,90"], Some("40%"));
        assert_eq!(assemble_with(&f, &config), Err(SkipReason::NoLink));
    }

    #[test]
    fn missing_price_is_skipped() {
        let config = Config::for_tests();
        let f = fields(
            "https://www.amazon.com.br/dp/B0ABC12345",
            &["Produto"],
            &[],
            Some("40%"),
        );
        assert_eq!(assemble_with(&f, &config), Err(SkipReason::NoPrice));
    }

    #[test]
    fn blank_card_reports_empty() {
        let config = Config::for_tests();
        let f = fields("", &[], &[], None);
        assert_eq!(assemble_with(&f, &config), Err(SkipReason::EmptyCard));
    }

    #[test]
    fn implausible_high_value_discount_is_rejected() {
        let config = Config::for_tests();
        let f = fields(
            "https://www.amazon.com.br/dp/B0TV1234AA",
            &["Smart TV 55 polegadas 4K"],
            &["R$ 10,79"],
            Some("85%"),
        );
        assert_eq!(
            assemble_with(&f, &config),
            Err(SkipReason::ImplausibleDiscount { discount: 85 })
        );
    }

    #[test]
    fn low_price_high_discount_without_keyword_passes() {
        let config = Config::for_tests();
        let f = fields(
            "https://www.amazon.com.br/dp/B0CAP12345",
            &["Capinha de silicone"],
            &["R$ 10,79"],
            Some("85%"),
        );
        assert!(assemble_with(&f, &config).is_ok());
    }

    #[test]
    fn observed_consistent_original_disarms_plausibility_filter() {
        let config = Config::for_tests();
        // 85% off 72,00 -> 10,80: the pair itself is consistent, so the
        // badge is trusted even on a high-value keyword.
        let f = fields(
            "https://www.amazon.com.br/dp/B0TV1234AA",
            &["Xbox wireless controller"],
            &["R$ 10,80", "R$ 72,00"],
            Some("85%"),
        );
        let deal = assemble_with(&f, &config).unwrap();
        assert_eq!(deal.original_price.unwrap().value, 72.0);
    }

    #[test]
    fn title_boilerplate_is_stripped() {
        let config = Config::for_tests();
        let f = fields(
            "https://www.amazon.com.br/dp/B0ABC12345",
            &[
                "OFERTA - 40% off Menor preço em 30 dias",
                "Cafeteira Expresso PreçodaOferta",
            ],
            &["R$ 299,00"],
            Some("40%"),
        );
        let deal = assemble_with(&f, &config).unwrap();
        assert_eq!(deal.title, "Cafeteira Expresso");
    }

    #[test]
    fn all_boilerplate_candidates_fall_back_to_placeholder() {
        let config = Config::for_tests();
        let f = fields(
            "https://www.amazon.com.br/dp/B0ABC12345",
            &["OFERTA - 40% off", "Menor preço em 7 dias"],
            &["R$ 299,00"],
            Some("40%"),
        );
        let deal = assemble_with(&f, &config).unwrap();
        assert_eq!(deal.title, FALLBACK_TITLE);
    }

    #[test]
    fn title_is_capped() {
        let mut config = Config::for_tests();
        config.title_max_len = 20;
        let long = "Furadeira de impacto profissional com maleta e 150 acessórios";
        let f = fields(
            "https://www.amazon.com.br/dp/B0ABC12345",
            &[long],
            &["R$ 299,00"],
            Some("40%"),
        );
        let deal = assemble_with(&f, &config).unwrap();
        assert!(deal.title.chars().count() <= 20);
        assert!(!deal.title.is_empty());
    }

    #[test]
    fn synthetic_id_when_no_product_code() {
        let config = Config::for_tests();
        let f = fields(
            "https://www.amazon.com.br/promo/relampago?x=1",
            &["Oferta relâmpago de utilidades"],
            &["R$ 49,90"],
            Some("35%"),
        );
        let deal = assemble_with(&f, &config).unwrap();
        assert_eq!(deal.id, "deal_0_35");
        assert_eq!(deal.id_quality, IdQuality::Synthetic);
    }

    #[test]
    fn canonical_url_strips_tracking_noise() {
        let mut config = Config::for_tests();
        config.affiliate_tag = None;
        let f = fields(
            "https://www.amazon.com.br/promo/relampago/ref=ods_x?pf_rd=abc",
            &["Oferta relâmpago de utilidades"],
            &["R$ 49,90"],
            Some("35%"),
        );
        let deal = assemble_with(&f, &config).unwrap();
        assert_eq!(deal.canonical_url, "https://www.amazon.com.br/promo/relampago");
    }

    #[test]
    fn affiliate_tag_respects_existing_query() {
        let config = Config::for_tests();
        let f = RawFields {
            link: "https://www.amazon.com.br/deal/promo?dealId=XY99".to_string(),
            identifier_hint: Some("XY99".to_string()),
            title_candidates: vec!["Promoção do dia inteiro".to_string()],
            price_texts: vec!["R$ 149,00".to_string()],
            discount_text: Some("25%".to_string()),
            image_url: None,
        };
        let pricing = normalize(&f, config.discount_tolerance);
        let deal = assemble(&f, &pricing, 3, &config).unwrap();
        // dealId hint is not a product code, so the cleaned href is kept.
        assert_eq!(
            deal.canonical_url,
            "https://www.amazon.com.br/deal/promo?tag=scout-20"
        );
        assert_eq!(deal.id, "XY99");
        assert_eq!(deal.id_quality, IdQuality::Stable);
    }

    #[test]
    fn derived_original_round_trips_through_deal() {
        let config = Config::for_tests();
        let f = fields(
            "https://www.amazon.com.br/dp/B0ABC12345",
            &["Fone de ouvido intra-auricular"],
            &["R$ 70,00"],
            Some("30%"),
        );
        let deal = assemble_with(&f, &config).unwrap();
        let original: NormalizedPrice = deal.original_price.unwrap();
        assert_eq!(original.value, 100.0);
        assert_eq!(original.raw_text, "R$ 100,00");
    }
}
