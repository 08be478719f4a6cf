#![allow(dead_code)]

use async_trait::async_trait;
use metamatrix::{
    db,
    models::metadata::{Author, Feed},
    routes::routes::AppState,
    services::{
        metadata_service::MetadataService,
        metadata_store::SqliteMetadataStore,
        nlu_client::{AnalysisMetadata, AnalysisResult, NluError, NluResult, TextAnalyzer},
    },
};
use reqwest::StatusCode;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::{Arc, Mutex};

/// Single-connection in-memory database with the schema applied.
pub async fn memory_pool() -> Arc<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    Arc::new(pool)
}

/// Analyzer that answers every call with a canned result and records request bodies.
pub struct StubAnalyzer {
    reply: Result<AnalysisMetadata, StatusCode>,
    pub seen: Mutex<Vec<String>>,
}

impl StubAnalyzer {
    pub fn returning(metadata: AnalysisMetadata) -> Self {
        Self {
            reply: Ok(metadata),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: StatusCode) -> Self {
        Self {
            reply: Err(status),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextAnalyzer for StubAnalyzer {
    async fn analyze(&self, request_body: String) -> NluResult<AnalysisResult> {
        self.seen.lock().unwrap().push(request_body);
        match &self.reply {
            Ok(metadata) => Ok(AnalysisResult {
                metadata: metadata.clone(),
            }),
            Err(status) => Err(NluError::Status {
                status: *status,
                body: "stubbed failure".into(),
            }),
        }
    }
}

/// The `Foo` analysis used across scenarios.
pub fn foo_analysis() -> AnalysisMetadata {
    AnalysisMetadata {
        title: Some("Foo".into()),
        publication_date: Some("2023-05-01T00:00:00".into()),
        image: Some("http://x/y.png".into()),
        feeds: Vec::new(),
        authors: Vec::new(),
    }
}

pub fn rich_analysis(title: &str) -> AnalysisMetadata {
    AnalysisMetadata {
        title: Some(title.into()),
        publication_date: Some("2024-01-15T10:30:00".into()),
        image: Some(format!("http://img/{title}.png")),
        feeds: vec![Feed {
            link: format!("http://{title}/rss"),
        }],
        authors: vec![Author {
            name: format!("{title} author"),
        }],
    }
}

pub async fn service_with(analyzer: Arc<StubAnalyzer>) -> (MetadataService, Arc<SqlitePool>) {
    let pool = memory_pool().await;
    let store = Arc::new(SqliteMetadataStore::new(pool.clone()));
    (MetadataService::new(store, analyzer), pool)
}

pub async fn app_state_with(analyzer: Arc<StubAnalyzer>) -> AppState {
    let (metadata, db) = service_with(analyzer).await;
    AppState { metadata, db }
}
