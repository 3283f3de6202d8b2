//! deal-scout: extracts discounted listings from a storefront's deals page,
//! normalizes them into deal records, and announces the best new one to a
//! webhook, deduplicating against previously announced ids.

pub mod config;
pub mod database;
pub mod deal_scout;
pub mod discord;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod selection;
