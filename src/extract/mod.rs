//! The extraction pipeline: locate candidate cards in a rendered document,
//! pull raw fields out of each, normalize prices and discounts, and assemble
//! validated deals.
//!
//! Stage order per card: locator -> fields -> normalize -> assemble.

pub mod assemble;
pub mod fields;
pub mod locator;
pub mod normalize;

use scraper::Html;
use tracing::debug;

use crate::config::Config;
use crate::models::{Deal, SkipReason};

/// Runs the full extraction pass over an already-rendered document.
///
/// One entry per located card: either an assembled [`Deal`] or the reason
/// the card was dropped. Zero cards is a normal outcome on this page.
pub fn extract_deals(document: &Html, config: &Config) -> Vec<Result<Deal, SkipReason>> {
    locator::locate(document)
        .iter()
        .map(|card| {
            let raw = fields::extract(card);
            let pricing = normalize::normalize(&raw, config.discount_tolerance);
            let result = assemble::assemble(&raw, &pricing, card.index, config);
            if let Err(reason) = &result {
                debug!(card = card.index, %reason, "card skipped");
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <div data-testid="grid-deals-container">
            <div>
                <a href="/dp/B0ABC12345/ref=x?sp=1"><span class="a-text-normal">Echo Dot 5a geração com Alexa</span></a>
                <span class="a-price"><span class="a-offscreen">R$ 249,00</span></span>
                <span class="a-price a-text-price"><span class="a-offscreen">R$ 415,00</span></span>
                <span>40% off</span>
                <img src="//m.media/echo.jpg" alt="Echo Dot"/>
            </div>
            <div>
                <a href="/dp/B0XYZ99999"><span class="a-text-normal">Mouse sem fio recarregável</span></a>
                <span class="a-price"><span class="a-offscreen">R$ 90,00</span></span>
                <span>10% off</span>
            </div>
            <div>
                <span>Bloco decorativo sem link 30% OFF R$ 50,00</span>
            </div>
        </div>
    "#;

    #[test]
    fn splits_deals_and_skips() {
        let config = Config::for_tests();
        let document = Html::parse_document(LISTING);
        let results = extract_deals(&document, &config);
        assert_eq!(results.len(), 3);

        let deal = results[0].as_ref().unwrap();
        assert_eq!(deal.id, "B0ABC12345");
        assert_eq!(deal.discount_percent, 40);
        assert_eq!(deal.current_price.as_ref().unwrap().value, 249.0);
        assert_eq!(deal.original_price.as_ref().unwrap().value, 415.0);

        assert_eq!(
            results[1],
            Err(SkipReason::BelowThreshold {
                discount: 10,
                minimum: config.min_discount
            })
        );
        assert_eq!(results[2], Err(SkipReason::NoLink));
    }

    #[test]
    fn empty_page_yields_no_results() {
        let config = Config::for_tests();
        let document = Html::parse_document("<html><body><p>manutenção</p></body></html>");
        assert!(extract_deals(&document, &config).is_empty());
    }
}
