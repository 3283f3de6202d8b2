//! Ranking and deduplication against the announced-deal history.

use std::collections::HashSet;

use crate::models::Deal;

/// Picks the best not-yet-announced deal.
///
/// Deals are ranked by discount descending (stable, so extraction order
/// breaks ties) and the first one whose id is absent from `announced` wins.
/// `None` means everything on the page has already been published.
///
/// Pure with respect to its inputs, so re-running with an unchanged
/// announced set selects the same deal.
pub fn select<'a>(deals: &'a [Deal], announced: &HashSet<String>) -> Option<&'a Deal> {
    let mut ranked: Vec<&Deal> = deals.iter().collect();
    ranked.sort_by(|a, b| b.discount_percent.cmp(&a.discount_percent));
    ranked
        .into_iter()
        .find(|deal| !announced.contains(&deal.id))
}
