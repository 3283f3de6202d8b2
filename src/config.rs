//! Runtime configuration, loaded once from the environment at startup.
//!
//! Every component takes the settings it needs by reference; nothing reads
//! `std::env` after [`Config::from_env`] returns.

use anyhow::{Context, Result, bail};
use tracing::warn;

/// Storefront the pipeline is pointed at. Relative hrefs and rebuilt product
/// URLs are resolved against this origin.
pub const STORE_BASE_URL: &str = "https://www.amazon.com.br";

/// Path under which a bare product code resolves to a product page.
pub const PRODUCT_PATH: &str = "/dp/";

const DEFAULT_DEALS_URL: &str = "https://www.amazon.com.br/ofertas";
const DEFAULT_DATABASE_URL: &str = "sqlite:data/announced.db";
const DEFAULT_MIN_DISCOUNT: u8 = 20;
const DEFAULT_DISCOUNT_TOLERANCE: u8 = 15;
const DEFAULT_TITLE_MAX_LEN: usize = 200;
const DEFAULT_SUSPECT_PRICE_CEILING: f64 = 30.0;
const DEFAULT_SUSPECT_DISCOUNT_FLOOR: u8 = 80;

#[derive(Debug, Clone)]
pub struct Config {
    /// Webhook endpoint the chosen deal is posted to. Required.
    pub webhook_url: String,
    /// Affiliate tag appended to published product URLs. Optional; when
    /// absent, URLs go out untagged.
    pub affiliate_tag: Option<String>,
    /// Listing page the document source fetches.
    pub deals_url: String,
    /// Connection string for the announced-deal store.
    pub database_url: String,
    /// Deals below this discount percentage are skipped.
    pub min_discount: u8,
    /// Maximum gap, in percentage points, tolerated between the advertised
    /// discount and the discount implied by the two captured prices before
    /// the original price is considered mis-paired and dropped.
    pub discount_tolerance: u8,
    /// Published titles are capped at this many characters.
    pub title_max_len: usize,
    /// Plausibility filter: a current price at or below this ceiling...
    pub suspect_price_ceiling: f64,
    /// ...combined with a discount at or above this floor on a high-value
    /// product category is treated as a misread and skipped.
    pub suspect_discount_floor: u8,
}

impl Config {
    /// Reads the full configuration from environment variables.
    ///
    /// A missing webhook URL is fatal. Malformed numeric overrides are also
    /// fatal rather than silently replaced with defaults.
    pub fn from_env() -> Result<Self> {
        let webhook_url = match std::env::var("DISCORD_WEBHOOK_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => bail!("DISCORD_WEBHOOK_URL not set - cannot publish deals without it"),
        };

        let affiliate_tag = std::env::var("AFFILIATE_TAG")
            .ok()
            .filter(|tag| !tag.trim().is_empty());
        if affiliate_tag.is_none() {
            warn!("AFFILIATE_TAG not set - published links will carry no affiliate tag");
        }

        Ok(Self {
            webhook_url,
            affiliate_tag,
            deals_url: env_or("DEALS_PAGE_URL", DEFAULT_DEALS_URL),
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            min_discount: env_parsed("MIN_DISCOUNT_PERCENT", DEFAULT_MIN_DISCOUNT)?,
            discount_tolerance: env_parsed("DISCOUNT_TOLERANCE", DEFAULT_DISCOUNT_TOLERANCE)?,
            title_max_len: env_parsed("TITLE_MAX_LEN", DEFAULT_TITLE_MAX_LEN)?,
            suspect_price_ceiling: env_parsed(
                "SUSPECT_PRICE_CEILING",
                DEFAULT_SUSPECT_PRICE_CEILING,
            )?,
            suspect_discount_floor: env_parsed(
                "SUSPECT_DISCOUNT_FLOOR",
                DEFAULT_SUSPECT_DISCOUNT_FLOOR,
            )?,
        })
    }

    /// Defaults with a placeholder webhook, for tests that never publish.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            webhook_url: "https://discord.example/webhook".to_string(),
            affiliate_tag: Some("scout-20".to_string()),
            deals_url: DEFAULT_DEALS_URL.to_string(),
            database_url: "sqlite::memory:".to_string(),
            min_discount: DEFAULT_MIN_DISCOUNT,
            discount_tolerance: DEFAULT_DISCOUNT_TOLERANCE,
            title_max_len: DEFAULT_TITLE_MAX_LEN,
            suspect_price_ceiling: DEFAULT_SUSPECT_PRICE_CEILING,
            suspect_discount_floor: DEFAULT_SUSPECT_DISCOUNT_FLOOR,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parsed_accepts_valid_override() {
        // Var names unique per test; the process environment is shared.
        unsafe { std::env::set_var("DEAL_SCOUT_TEST_TOLERANCE", "25") };
        let value: u8 = env_parsed("DEAL_SCOUT_TEST_TOLERANCE", 15).unwrap();
        assert_eq!(value, 25);
    }

    #[test]
    fn env_parsed_rejects_garbage() {
        unsafe { std::env::set_var("DEAL_SCOUT_TEST_BAD", "not-a-number") };
        assert!(env_parsed::<u8>("DEAL_SCOUT_TEST_BAD", 15).is_err());
    }

    #[test]
    fn env_parsed_falls_back_when_unset() {
        let value: usize = env_parsed("DEAL_SCOUT_TEST_MISSING", 200).unwrap();
        assert_eq!(value, 200);
    }
}
