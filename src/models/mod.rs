//! Core data models for the metadata service.
//!
//! Records map to the `metadata` table via `sqlx::FromRow` and serialize as
//! JSON via `serde`.

pub mod metadata;
