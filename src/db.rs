//! Database bootstrap: pool creation and the embedded schema migration.

use anyhow::{Context, Result};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;

/// Schema for the `metadata` table, compiled into the binary.
const INIT_MIGRATION: &str = include_str!("../migrations/0001_init.sql");

/// Open a SQLite pool for `db_url`, creating the file and its parent
/// directory when they do not exist yet.
pub async fn connect(db_url: &str) -> Result<SqlitePool> {
    if let Some(db_path) = file_path(db_url) {
        tracing::debug!("Interpreted SQLite path => {}", db_path);
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating database directory {:?}", parent))?;
                tracing::info!("Created missing directory {:?}", parent);
            }
        }
    }

    let options = db_url
        .parse::<sqlx::sqlite::SqliteConnectOptions>()
        .with_context(|| format!("parsing database URL `{}`", db_url))?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("connecting to {}", db_url))
}

/// Run the embedded migration, one statement at a time.
pub async fn run_migrations(db: &SqlitePool) -> Result<()> {
    let statements = INIT_MIGRATION
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt)
            .execute(db)
            .await
            .with_context(|| format!("executing migration statement `{}`", stmt))?;
    }

    Ok(())
}

/// Local file path behind a SQLite URL, or `None` for in-memory databases.
fn file_path(db_url: &str) -> Option<&str> {
    let path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        None
    } else {
        Some(path)
    }
}
