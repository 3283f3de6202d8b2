//! One-pass pipeline orchestration: fetch, extract, select, publish, record.

use anyhow::Result;
use scraper::Html;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::Database;
use crate::discord::DiscordNotifier;
use crate::extract;
use crate::fetch::{DealSource, HttpDealSource};
use crate::models::{Deal, IdQuality, SkipReason};
use crate::selection;

#[derive(Clone)]
pub struct DealScout {
    config: Config,
    source: Arc<dyn DealSource>,
    database: Database,
    discord: DiscordNotifier,
}

impl DealScout {
    pub async fn new(config: Config) -> Result<Self> {
        let source: Arc<dyn DealSource> = Arc::new(HttpDealSource::new(config.deals_url.clone()));
        let database = Database::connect(&config.database_url).await?;
        let discord = DiscordNotifier::new(config.webhook_url.clone());

        Ok(Self {
            config,
            source,
            database,
            discord,
        })
    }

    /// Runs one complete cycle. Finding nothing publishable is a normal
    /// `Ok` outcome; only fetch, store, and webhook failures surface as
    /// errors.
    pub async fn check_for_deals(&self) -> Result<()> {
        let html = self.source.fetch_listing().await?;

        // Parsed documents are not Send, so the whole extraction pass stays
        // inside this block and only owned deals cross the await points.
        let (deals, skips) = {
            let document = Html::parse_document(&html);
            let mut deals: Vec<Deal> = Vec::new();
            let mut skips: Vec<SkipReason> = Vec::new();
            for result in extract::extract_deals(&document, &self.config) {
                match result {
                    Ok(deal) => deals.push(deal),
                    Err(reason) => skips.push(reason),
                }
            }
            (deals, skips)
        };

        log_skip_counts(&skips);

        if deals.is_empty() {
            info!("No publishable deals this run");
            return Ok(());
        }
        info!("Extracted {} publishable deals", deals.len());

        let announced = self.database.load_announced_ids().await?;
        let Some(chosen) = selection::select(&deals, &announced) else {
            info!("All {} extracted deals were already announced", deals.len());
            return Ok(());
        };

        if chosen.id_quality == IdQuality::Synthetic {
            warn!(
                id = %chosen.id,
                "selected deal has a synthetic id; cross-run dedup is unreliable for it"
            );
        }
        info!(
            "Publishing: {} ({}% off, id {})",
            chosen.title, chosen.discount_percent, chosen.id
        );

        self.discord.send_deal(chosen).await?;

        // Recorded only after the webhook accepted the message. If the
        // insert itself fails, the deal may go out again next run; that is
        // the accepted at-least-once behavior.
        self.database.record_announced(chosen).await?;

        Ok(())
    }
}

fn log_skip_counts(skips: &[SkipReason]) {
    if skips.is_empty() {
        return;
    }
    let count = |f: fn(&SkipReason) -> bool| skips.iter().filter(|&r| f(r)).count();
    info!(
        below_threshold = count(|r| matches!(r, SkipReason::BelowThreshold { .. })),
        no_link = count(|r| matches!(r, SkipReason::NoLink)),
        no_price = count(|r| matches!(r, SkipReason::NoPrice)),
        implausible = count(|r| matches!(r, SkipReason::ImplausibleDiscount { .. })),
        empty = count(|r| matches!(r, SkipReason::EmptyCard)),
        "cards skipped"
    );
}
