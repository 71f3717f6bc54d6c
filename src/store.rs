// src/store.rs
//! Persistence of matched listings, deduplicated by link.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use metrics::counter;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::model::{SearchResult, StoredListing};

/// Outcome of one `save` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: u64,
    /// Already stored under the same link.
    pub ignored: u64,
    /// Rows that errored and were skipped.
    pub failed: u64,
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert results whose link is not stored yet. Existing rows are never
    /// updated. Saving the same batch twice inserts nothing the second time.
    async fn save(&self, results: &[SearchResult]) -> Result<SaveSummary, StoreError>;
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS listings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        platform TEXT NOT NULL,
        search_term TEXT NOT NULL,
        title TEXT NOT NULL,
        price REAL NOT NULL,
        seller_rating REAL,
        link TEXT NOT NULL UNIQUE,
        found_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_price ON listings(price)",
    "CREATE INDEX IF NOT EXISTS idx_platform ON listings(platform)",
    "CREATE INDEX IF NOT EXISTS idx_search_term ON listings(search_term)",
    "CREATE INDEX IF NOT EXISTS idx_found_at ON listings(found_at)",
];

pub struct SqliteStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database file and ensure the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let init = |source| StoreError::Init {
            path: path.clone(),
            source,
        };

        let opts = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(init)?;

        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&pool).await.map_err(init)?;
        }

        info!(target: "store", path = %path.display(), "result store ready");
        Ok(Self { pool, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recently found listings first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<StoredListing>, StoreError> {
        let rows = sqlx::query_as::<_, StoredListing>(
            r#"
            SELECT id, platform, search_term, title, price, seller_rating, link, found_at
            FROM listings
            ORDER BY found_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_for_link(&self, link: &str) -> Result<i64, StoreError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM listings WHERE link = ?")
            .bind(link)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ResultStore for SqliteStore {
    async fn save(&self, results: &[SearchResult]) -> Result<SaveSummary, StoreError> {
        let mut summary = SaveSummary::default();
        if results.is_empty() {
            debug!(target: "store", "nothing to save");
            return Ok(summary);
        }

        let mut tx = self.pool.begin().await?;
        for r in results {
            let res = sqlx::query(
                r#"
                INSERT OR IGNORE INTO listings
                    (platform, search_term, title, price, seller_rating, link)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(r.platform.as_str())
            .bind(&r.search_term)
            .bind(&r.title)
            .bind(r.price)
            .bind(r.seller_rating)
            .bind(&r.link)
            .execute(&mut *tx)
            .await;

            match res {
                Ok(done) if done.rows_affected() > 0 => summary.inserted += 1,
                Ok(_) => summary.ignored += 1,
                Err(e) => {
                    warn!(target: "store", link = %r.link, error = %e, "row insert failed, skipping");
                    summary.failed += 1;
                }
            }
        }
        tx.commit().await?;

        counter!("shopper_rows_inserted_total").increment(summary.inserted);
        counter!("shopper_rows_ignored_total").increment(summary.ignored);
        info!(
            target: "store",
            inserted = summary.inserted,
            ignored = summary.ignored,
            failed = summary.failed,
            "results saved"
        );
        Ok(summary)
    }
}

/// Records every batch it is asked to save; inserts everything.
pub struct MockStore {
    pub calls: Mutex<Vec<Vec<SearchResult>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(vec![]),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for MockStore {
    async fn save(&self, results: &[SearchResult]) -> Result<SaveSummary, StoreError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(results.to_vec());
        }
        Ok(SaveSummary {
            inserted: results.len() as u64,
            ..Default::default()
        })
    }
}
