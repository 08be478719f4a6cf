//! HTTP handlers for metadata records.
//! Each handler extracts its inputs, delegates to `MetadataService`, and
//! relies on `AppError` for the status mapping of failures.

use crate::{
    errors::AppError,
    models::metadata::{Author, Feed, JsonListInput, Metadata, RecordError},
    routes::routes::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

/// Body for `PUT /api/v1/metadata/{id}`.
///
/// `feeds` and `authors` accept either a JSON-array string or an array of
/// objects. A client-supplied `active` field is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMetadataReq {
    pub title: Option<String>,
    pub publication_date: Option<String>,
    pub image_url: Option<String>,
    pub feeds: Option<JsonListInput<Feed>>,
    pub authors: Option<JsonListInput<Author>>,
}

impl UpdateMetadataReq {
    /// Build the record carrying the new field values.
    pub fn into_record(self) -> Result<Metadata, RecordError> {
        let mut record = Metadata::new();
        record.update_title(self.title);
        record.set_publication_date_text(self.publication_date.as_deref())?;
        record.update_image_url(self.image_url);
        record.update_feeds(
            self.feeds
                .map(|feeds| feeds.into_serialized("feeds"))
                .transpose()?,
        );
        record.update_authors(
            self.authors
                .map(|authors| authors.into_serialized("authors"))
                .transpose()?,
        );
        Ok(record)
    }
}

/// `GET /api/v1/metadata`
pub async fn list_metadata(
    State(state): State<AppState>,
) -> Result<Json<Vec<Metadata>>, AppError> {
    Ok(Json(state.metadata.list_all().await?))
}

/// `GET /api/v1/metadata/active`
pub async fn list_active_metadata(
    State(state): State<AppState>,
) -> Result<Json<Vec<Metadata>>, AppError> {
    Ok(Json(state.metadata.list_active().await?))
}

/// `GET /api/v1/metadata/inactive`
pub async fn list_inactive_metadata(
    State(state): State<AppState>,
) -> Result<Json<Vec<Metadata>>, AppError> {
    Ok(Json(state.metadata.list_inactive().await?))
}

/// `GET /api/v1/metadata/{id}`
pub async fn get_metadata(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Metadata>, AppError> {
    Ok(Json(state.metadata.get(id).await?))
}

/// `POST /api/v1/metadata/analyze`
///
/// The body is forwarded verbatim to the NLU service; the stored record is
/// returned with `201 Created`.
pub async fn analyze_metadata(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let record = state.metadata.analyze_and_save(body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `PUT /api/v1/metadata/{id}`
///
/// An unknown id is reported before the body's field values are validated.
pub async fn update_metadata(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMetadataReq>,
) -> Result<Json<Metadata>, AppError> {
    state.metadata.get(id).await?;
    let changes = payload.into_record()?;
    Ok(Json(state.metadata.update(id, changes).await?))
}

/// `PATCH /api/v1/metadata/{id}/activate`
pub async fn activate_metadata(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Metadata>, AppError> {
    Ok(Json(state.metadata.activate(id).await?))
}

/// `PATCH /api/v1/metadata/{id}/deactivate`
pub async fn deactivate_metadata(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Metadata>, AppError> {
    Ok(Json(state.metadata.deactivate(id).await?))
}

/// `DELETE /api/v1/metadata/{id}`
///
/// Answers `204 No Content`. Earlier versions of this API reported a
/// successful delete as an error carrying a "successfully deleted" message;
/// that behavior was dropped on purpose.
pub async fn delete_metadata(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.metadata.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
