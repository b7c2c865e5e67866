//! Optional append-only audit table of (URL, SHA-1) pairs.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use thiserror::Error;
use tokio::sync::Mutex;

const SCHEMA: &str = "\
create table if not exists map (
    url  text not null,
    sha1 text not null,
    timestamp datetime default CURRENT_TIMESTAMP
);
create index if not exists index_url_sha1 on map(url, sha1);
";

#[derive(Debug, Error)]
pub enum UrlMapError {
    #[error("failed to open database: {0}")]
    Open(#[source] sqlx::Error),
    #[error("failed to create schema: {0}")]
    Schema(#[source] sqlx::Error),
    #[error("failed to insert url/sha1 pair: {0}")]
    Insert(#[source] sqlx::Error),
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

/// Append-only map from capture URL to content hash, backed by a single
/// SQLite file. Duplicates are allowed; readers tolerate them.
#[derive(Debug)]
pub struct UrlMap {
    pool: Pool<Sqlite>,
    // One writer at a time, to sidestep `database is locked` from the
    // embedded engine.
    write_lock: Mutex<()>,
}

impl UrlMap {
    /// Open (or create) the database and ensure the schema exists.
    pub async fn open(path: &Path) -> Result<Self, UrlMapError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(UrlMapError::Open)?;
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(UrlMapError::Schema)?;
        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    /// Record one (url, sha1) pair. Insertion order is preserved per
    /// writer; no cross-writer ordering is promised.
    pub async fn insert(&self, url: &str, sha1: &str) -> Result<(), UrlMapError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("insert into map (url, sha1) values (?1, ?2)")
            .bind(url)
            .bind(sha1)
            .execute(&self.pool)
            .await
            .map_err(UrlMapError::Insert)?;
        Ok(())
    }

    /// Number of rows recorded for a given hash.
    pub async fn count_for_sha1(&self, sha1: &str) -> Result<i64, UrlMapError> {
        let (count,): (i64,) = sqlx::query_as("select count(*) from map where sha1 = ?1")
            .bind(sha1)
            .fetch_one(&self.pool)
            .await
            .map_err(UrlMapError::Query)?;
        Ok(count)
    }
}
