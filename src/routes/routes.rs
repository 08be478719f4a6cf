//! Defines routes for the metadata API.
//!
//! ## Structure
//! - **Health checks**
//!   - `GET    /healthz` -> liveness
//!   - `GET    /readyz`  -> readiness (database reachable)
//!
//! - **Collection endpoints** under `/api/v1/metadata`
//!   - `GET    /`          -> list all records
//!   - `GET    /active`    -> list records flagged `A`
//!   - `GET    /inactive`  -> list records flagged `I`
//!   - `POST   /analyze`   -> analyze text with the NLU service and store the result
//!
//! - **Record endpoints** under `/api/v1/metadata/{id}`
//!   - `GET    /`            -> fetch one record
//!   - `PUT    /`            -> overwrite content fields
//!   - `PATCH  /activate`    -> flag as active
//!   - `PATCH  /deactivate`  -> flag as inactive
//!   - `DELETE /`            -> remove the record

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        metadata_handlers::{
            activate_metadata, analyze_metadata, deactivate_metadata, delete_metadata,
            get_metadata, list_active_metadata, list_inactive_metadata, list_metadata,
            update_metadata,
        },
    },
    services::metadata_service::MetadataService,
};
use axum::{
    Router,
    routing::{get, patch, post},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub metadata: MetadataService,
    /// Pool used directly by the readiness check.
    pub db: Arc<SqlitePool>,
}

/// Build the full application router with request tracing attached.
pub fn routes(state: AppState) -> Router {
    let metadata: Router<AppState> = Router::new()
        .route("/", get(list_metadata))
        .route("/active", get(list_active_metadata))
        .route("/inactive", get(list_inactive_metadata))
        .route("/analyze", post(analyze_metadata))
        .route(
            "/{id}",
            get(get_metadata)
                .put(update_metadata)
                .delete(delete_metadata),
        )
        .route("/{id}/activate", patch(activate_metadata))
        .route("/{id}/deactivate", patch(deactivate_metadata));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/v1/metadata", metadata)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
