//! src/services/metadata_service.rs
//!
//! MetadataService handles listing, lookup, NLU-backed creation, field
//! updates, status transitions and deletion of metadata records. Storage and
//! text analysis are injected as trait objects.

use crate::{
    models::metadata::{ActiveStatus, Metadata, RecordError},
    services::{
        metadata_store::MetadataStore,
        nlu_client::{AnalysisMetadata, NluError, TextAnalyzer},
    },
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata with id {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Upstream(#[from] NluError),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

pub type MetadataResult<T> = Result<T, MetadataError>;

/// MetadataService is the single entry point the HTTP layer calls into.
///
/// Every operation either returns the affected record(s) or a
/// [`MetadataError`]; nothing is retried or recovered locally.
#[derive(Clone)]
pub struct MetadataService {
    store: Arc<dyn MetadataStore>,
    analyzer: Arc<dyn TextAnalyzer>,
}

impl MetadataService {
    pub fn new(store: Arc<dyn MetadataStore>, analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self { store, analyzer }
    }

    /// Every stored record, in store order.
    pub async fn list_all(&self) -> MetadataResult<Vec<Metadata>> {
        Ok(self.store.find_all().await?)
    }

    pub async fn list_active(&self) -> MetadataResult<Vec<Metadata>> {
        Ok(self.store.find_by_active(ActiveStatus::Active).await?)
    }

    pub async fn list_inactive(&self) -> MetadataResult<Vec<Metadata>> {
        Ok(self.store.find_by_active(ActiveStatus::Inactive).await?)
    }

    pub async fn get(&self, id: i64) -> MetadataResult<Metadata> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(MetadataError::NotFound(id))
    }

    /// Send `request_body` to the NLU service and persist the returned metadata
    /// as a new active record.
    pub async fn analyze_and_save(&self, request_body: String) -> MetadataResult<Metadata> {
        let analysis = self.analyzer.analyze(request_body).await?;

        let mut record = record_from_analysis(&analysis.metadata)?;
        record.active = ActiveStatus::Active;

        // an insert always yields the stored row
        let saved = self
            .store
            .save(record)
            .await?
            .ok_or(MetadataError::Store(sqlx::Error::RowNotFound))?;
        info!(id = ?saved.id, "stored analyzed metadata");
        Ok(saved)
    }

    /// Overwrite title, publication date, image URL, feeds and authors of the
    /// record `id` with the values carried by `changes`. The status flag is kept.
    pub async fn update(&self, id: i64, changes: Metadata) -> MetadataResult<Metadata> {
        let mut existing = self.get(id).await?;
        existing.update_title(changes.title);
        existing.update_publication_date(changes.publication_date);
        existing.update_image_url(changes.image_url);
        existing.update_feeds(changes.feeds);
        existing.update_authors(changes.authors);

        let saved = self.save_existing(id, existing).await?;
        debug!(id, "updated metadata");
        Ok(saved)
    }

    pub async fn activate(&self, id: i64) -> MetadataResult<Metadata> {
        self.set_status(id, ActiveStatus::Active).await
    }

    pub async fn deactivate(&self, id: i64) -> MetadataResult<Metadata> {
        self.set_status(id, ActiveStatus::Inactive).await
    }

    /// Remove the record `id` from the store.
    pub async fn delete(&self, id: i64) -> MetadataResult<()> {
        self.get(id).await?;
        self.store.delete_by_id(id).await?;
        info!(id, "deleted metadata");
        Ok(())
    }

    /// Write back a record read earlier; a row deleted in between is `NotFound`.
    async fn save_existing(&self, id: i64, record: Metadata) -> MetadataResult<Metadata> {
        self.store
            .save(record)
            .await?
            .ok_or(MetadataError::NotFound(id))
    }

    async fn set_status(&self, id: i64, status: ActiveStatus) -> MetadataResult<Metadata> {
        let mut record = self.get(id).await?;
        record.active = status;
        let saved = self.save_existing(id, record).await?;
        debug!(id, status = %status.as_char(), "changed metadata status");
        Ok(saved)
    }
}

/// Map the analysis `metadata` section onto a fresh, unsaved record.
fn record_from_analysis(analysis: &AnalysisMetadata) -> Result<Metadata, RecordError> {
    let mut record = Metadata::new();
    record.update_title(analysis.title.clone());
    record.set_publication_date_text(analysis.publication_date.as_deref())?;
    record.update_image_url(analysis.image.clone());
    record.set_feeds(&analysis.feeds)?;
    record.set_authors(&analysis.authors)?;
    Ok(record)
}
