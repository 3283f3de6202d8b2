//! Price and discount normalization.
//!
//! Turns the over-inclusive set of captured currency strings into a
//! `current`/`original` pair, cross-checks the advertised discount badge
//! against the discount those prices imply, and back-computes a missing
//! original price when the badge is the only trustworthy signal.
//!
//! Pure and deterministic; no I/O.

use tracing::debug;

use crate::extract::fields::RawFields;
use crate::models::NormalizedPrice;

/// Normalized pricing signals for one card.
#[derive(Debug, Clone, Default)]
pub struct Pricing {
    pub current: Option<NormalizedPrice>,
    pub original: Option<NormalizedPrice>,
    /// Advertised discount, percentage points in `[0, 100]`. 0 when absent.
    pub discount: u8,
    /// True when `original` was back-computed from `current` + `discount`
    /// rather than observed in the markup.
    pub original_is_derived: bool,
}

/// Normalizes one card's raw price and discount texts.
///
/// `tolerance` is the maximum gap, in percentage points, between the
/// advertised discount and the discount implied by the captured price pair
/// before the original price is treated as mis-paired (a per-unit figure or a
/// neighboring card's price) and dropped.
pub fn normalize(fields: &RawFields, tolerance: u8) -> Pricing {
    let mut parsed: Vec<NormalizedPrice> = fields
        .price_texts
        .iter()
        .filter_map(|raw| parse_price(raw).map(|value| NormalizedPrice::new(raw.clone(), value)))
        .collect();
    parsed.sort_by(|a, b| a.value.total_cmp(&b.value));

    let discount = parse_discount(fields.discount_text.as_deref());

    let current = parsed.first().cloned();
    // Largest distinct value is the candidate list price; a single repeated
    // value means no list price was captured.
    let mut original = match (parsed.first(), parsed.last()) {
        (Some(lo), Some(hi)) if hi.value > lo.value => Some(hi.clone()),
        _ => None,
    };

    // Advertised-vs-implied consistency check.
    if let (Some(cur), Some(orig)) = (&current, &original)
        && orig.value > 0.0
    {
        let implied = 100.0 * (1.0 - cur.value / orig.value);
        if (implied - f64::from(discount)).abs() > f64::from(tolerance) {
            debug!(
                implied,
                advertised = discount,
                original = %orig.raw_text,
                "original price inconsistent with advertised discount, dropping it"
            );
            original = None;
        }
    }

    // Surface a "was" price when the badge is trustworthy but no list price
    // text was captured.
    let mut original_is_derived = false;
    if original.is_none()
        && discount > 0
        && discount < 100
        && let Some(cur) = &current
    {
        let value = round_centavos(cur.value / (1.0 - f64::from(discount) / 100.0));
        original = Some(NormalizedPrice::new(format_brl(value), value));
        original_is_derived = true;
    }

    Pricing {
        current,
        original,
        discount,
        original_is_derived,
    }
}

/// Parses a localized currency string to its numeric value.
///
/// Convention is fixed to the storefront's locale: dot as thousands
/// separator, comma as decimal separator. Anything that does not survive the
/// strip-and-parse is discarded by the caller, never zeroed.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = cleaned.replace('.', "").replacen(',', ".", 1);
    // A second comma means the string glued two numbers together; one price
    // per string is the contract.
    if normalized.contains(',') {
        return None;
    }

    normalized.parse::<f64>().ok().filter(|v| *v >= 0.0)
}

/// Integer preceding the first percent sign; 0 when absent or nonsensical.
pub fn parse_discount(text: Option<&str>) -> u8 {
    let Some(text) = text else { return 0 };
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(value) if value <= 100 => value as u8,
        _ => 0,
    }
}

/// Formats a numeric value back into the storefront's currency convention.
pub fn format_brl(value: f64) -> String {
    let centavos = (value * 100.0).round() as i64;
    let whole = centavos / 100;
    let frac = (centavos % 100).abs();

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("R$ {grouped},{frac:02}")
}

fn round_centavos(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
