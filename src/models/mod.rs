//! Data models for extracted deals and Discord webhook payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A price parsed out of a localized currency string.
///
/// `value` is always the numeric reading of `raw_text`; strings that fail to
/// parse are discarded upstream rather than zeroed, so `value >= 0` holds for
/// every instance that exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPrice {
    pub raw_text: String,
    pub value: f64,
}

impl NormalizedPrice {
    pub fn new(raw_text: impl Into<String>, value: f64) -> Self {
        Self {
            raw_text: raw_text.into(),
            value,
        }
    }
}

/// How trustworthy a deal identifier is for deduplication.
///
/// Synthetic ids are derived from card position + discount and are not stable
/// across runs; two runs may hand the same synthetic id to different products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdQuality {
    Stable,
    Synthetic,
}

impl IdQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Synthetic => "synthetic",
        }
    }
}

/// A discounted product listing, fully normalized and validated.
///
/// Constructed once per extraction pass by the assembler and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub id_quality: IdQuality,
    pub title: String,
    pub current_price: Option<NormalizedPrice>,
    pub original_price: Option<NormalizedPrice>,
    pub discount_percent: u8,
    pub canonical_url: String,
    pub image_url: Option<String>,
    pub discovered_at: DateTime<Utc>,
}

/// Why a card was dropped instead of becoming a [`Deal`].
///
/// Rejections are part of normal operation on volatile markup; they are
/// returned per card so the caller can count them instead of swallowing them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("card text yielded no usable signals")]
    EmptyCard,
    #[error("discount {discount}% below minimum {minimum}%")]
    BelowThreshold { discount: u8, minimum: u8 },
    #[error("no product link found in card")]
    NoLink,
    #[error("no parseable price found in card")]
    NoPrice,
    #[error("discount {discount}% on a low price looks like a misread")]
    ImplausibleDiscount { discount: u8 },
}

/// Discord embed structure for rich notifications
#[derive(Debug, Serialize)]
pub struct DiscordEmbed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    pub timestamp: String,
    pub thumbnail: Option<DiscordThumbnail>,
    pub fields: Vec<DiscordField>,
    pub footer: DiscordFooter,
}

/// Small thumbnail image for Discord embeds
#[derive(Debug, Serialize)]
pub struct DiscordThumbnail {
    pub url: String,
}

/// Key-value field for Discord embeds
#[derive(Debug, Serialize)]
pub struct DiscordField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Footer line under the embed
#[derive(Debug, Serialize)]
pub struct DiscordFooter {
    pub text: String,
}

/// Discord webhook message payload
#[derive(Debug, Serialize)]
pub struct DiscordMessage {
    pub embeds: Vec<DiscordEmbed>,
}
