//! # Discord Webhook Integration
//!
//! Renders a chosen deal into a rich embed and posts it to the configured
//! webhook. One attempt per run, no retry: a transport failure is reported
//! to the caller, which then skips the announced-id append so the same deal
//! is eligible again on the next cycle.
//!
//! Discord answers webhook posts with 204 No Content; any 2xx is treated as
//! success.

use anyhow::{Result, anyhow};
use reqwest::Client;
use tracing::info;

use crate::models::{
    Deal, DiscordEmbed, DiscordField, DiscordFooter, DiscordMessage, DiscordThumbnail,
};

const EMBED_COLOR: u32 = 0x00FF_4500; // orange-red, matches the deal theme

pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
        }
    }

    /// Posts one deal to the webhook.
    ///
    /// Returns an error both on connection failures and on non-2xx
    /// responses, so the caller can tell "published" from "try again next
    /// run" with a single `?`.
    pub async fn send_deal(&self, deal: &Deal) -> Result<()> {
        let message = build_message(deal);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await?;

        if response.status().is_success() {
            info!("Webhook accepted deal: {}", deal.title);
            Ok(())
        } else {
            Err(anyhow!(
                "webhook rejected deal ({}): {}",
                response.status(),
                deal.id
            ))
        }
    }
}

/// Builds the outbound payload for one deal. Pure, so the exact message
/// shape stays testable without a webhook.
pub fn build_message(deal: &Deal) -> DiscordMessage {
    let price_line = match (&deal.current_price, &deal.original_price) {
        (Some(current), Some(original)) => {
            format!("De {} por {}", original.raw_text, current.raw_text)
        }
        (Some(current), None) => current.raw_text.clone(),
        _ => "Preço não disponível".to_string(),
    };

    let embed = DiscordEmbed {
        title: format!("🔥 {}% OFF — {}", deal.discount_percent, deal.title),
        description: deal.title.clone(),
        url: deal.canonical_url.clone(),
        color: EMBED_COLOR,
        timestamp: deal.discovered_at.to_rfc3339(),
        thumbnail: deal
            .image_url
            .as_ref()
            .map(|url| DiscordThumbnail { url: url.clone() }),
        fields: vec![
            DiscordField {
                name: "💰 Preço".to_string(),
                value: price_line,
                inline: true,
            },
            DiscordField {
                name: "📉 Desconto".to_string(),
                value: format!("{}%", deal.discount_percent),
                inline: true,
            },
            DiscordField {
                name: "🔗 Link".to_string(),
                value: format!("[Acessar oferta]({})", deal.canonical_url),
                inline: false,
            },
        ],
        footer: DiscordFooter {
            text: "deal-scout • Amazon BR".to_string(),
        },
    };

    DiscordMessage {
        embeds: vec![embed],
    }
}

impl Clone for DiscordNotifier {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            webhook_url: self.webhook_url.clone(),
        }
    }
}
