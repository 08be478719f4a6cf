//! src/services/metadata_store.rs
//!
//! Persistence for metadata records. The service layer only sees the
//! [`MetadataStore`] trait; [`SqliteMetadataStore`] implements it over the
//! `metadata` table through a shared SQLx pool.

use crate::models::metadata::{ActiveStatus, Metadata};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

const SELECT_COLUMNS: &str =
    "SELECT id, title, publication_date, image_url, feeds, authors, active FROM metadata";

/// Row-level access to stored metadata.
///
/// Point lookups yield at most one record, list queries an ordered sequence,
/// and deletes only a completion signal.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Metadata>, sqlx::Error>;

    async fn find_by_active(&self, status: ActiveStatus) -> Result<Vec<Metadata>, sqlx::Error>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Metadata>, sqlx::Error>;

    /// Insert when `record.id` is `None`, otherwise update the row with that id.
    /// Yields `None` when the row to update no longer exists.
    async fn save(&self, record: Metadata) -> Result<Option<Metadata>, sqlx::Error>;

    async fn delete_by_id(&self, id: i64) -> Result<(), sqlx::Error>;
}

/// SQLite-backed [`MetadataStore`].
#[derive(Clone)]
pub struct SqliteMetadataStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl SqliteMetadataStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    async fn insert(&self, record: Metadata) -> Result<Metadata, sqlx::Error> {
        let saved = sqlx::query_as::<_, Metadata>(
            r#"
            INSERT INTO metadata (title, publication_date, image_url, feeds, authors, active)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, title, publication_date, image_url, feeds, authors, active
            "#,
        )
        .bind(&record.title)
        .bind(record.publication_date)
        .bind(&record.image_url)
        .bind(&record.feeds)
        .bind(&record.authors)
        .bind(record.active)
        .fetch_one(&*self.db)
        .await?;

        debug!(id = ?saved.id, "inserted metadata row");
        Ok(saved)
    }

    async fn update(&self, id: i64, record: Metadata) -> Result<Option<Metadata>, sqlx::Error> {
        let saved = sqlx::query_as::<_, Metadata>(
            r#"
            UPDATE metadata SET
                title = ?,
                publication_date = ?,
                image_url = ?,
                feeds = ?,
                authors = ?,
                active = ?
            WHERE id = ?
            RETURNING id, title, publication_date, image_url, feeds, authors, active
            "#,
        )
        .bind(&record.title)
        .bind(record.publication_date)
        .bind(&record.image_url)
        .bind(&record.feeds)
        .bind(&record.authors)
        .bind(record.active)
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;

        debug!(id, found = saved.is_some(), "updated metadata row");
        Ok(saved)
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn find_all(&self) -> Result<Vec<Metadata>, sqlx::Error> {
        sqlx::query_as::<_, Metadata>(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))
            .fetch_all(&*self.db)
            .await
    }

    async fn find_by_active(&self, status: ActiveStatus) -> Result<Vec<Metadata>, sqlx::Error> {
        sqlx::query_as::<_, Metadata>(&format!(
            "{SELECT_COLUMNS} WHERE active = ? ORDER BY id ASC"
        ))
        .bind(status)
        .fetch_all(&*self.db)
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Metadata>, sqlx::Error> {
        sqlx::query_as::<_, Metadata>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&*self.db)
            .await
    }

    async fn save(&self, record: Metadata) -> Result<Option<Metadata>, sqlx::Error> {
        match record.id {
            Some(id) => self.update(id, record).await,
            None => self.insert(record).await.map(Some),
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM metadata WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        debug!(id, rows = result.rows_affected(), "deleted metadata row");
        Ok(())
    }
}
