//! Persistent store of already-announced deal identifiers.
//!
//! Append-only: ids are inserted after a successful publish and never
//! pruned. The rest of the pipeline only ever reads the full id set once per
//! run, so there is no concurrent-writer handling here.

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, Sqlite, SqlitePool, migrate::MigrateDatabase};
use std::collections::HashSet;
use tracing::info;

use crate::models::Deal;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_url: &str) -> Result<Self> {
        // Create database file if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database file");
            Sqlite::create_database(db_url).await?;
        }

        // One run = one reader + one writer, sequentially. A single
        // connection also keeps in-memory databases alive across the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(db_url)
            .await?;

        // Run migrations
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    /// Full set of previously announced deal ids, loaded once per run.
    pub async fn load_announced_ids(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT id FROM announced_deals")
            .fetch_all(&self.pool)
            .await?;

        let ids = rows
            .into_iter()
            .map(|row| row.get::<String, _>("id"))
            .collect();

        Ok(ids)
    }

    /// Records a published deal. Called at most once per run, only after the
    /// webhook accepted the message.
    pub async fn record_announced(&self, deal: &Deal) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO announced_deals (id, title, discount_percent, id_quality, url, announced_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&deal.id)
        .bind(&deal.title)
        .bind(i64::from(deal.discount_percent))
        .bind(deal.id_quality.as_str())
        .bind(&deal.canonical_url)
        .bind(deal.discovered_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}
