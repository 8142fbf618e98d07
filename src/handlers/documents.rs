use super::read_upload;
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::models::{DocumentPatch, DocumentStatus, NewDocument, Role};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::DocumentFilter;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ReviewBody {
    pub status: DocumentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.documents().list(&filter).await?))
}

pub async fn read(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.documents().get(&id).await?))
}

pub async fn create(State(state): State<AppState>, Json(body): Json<NewDocument>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one(state.client.documents().create(&body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<DocumentPatch>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.documents().update(&id, &body).await?))
}

/// Staff only; the reviewer is the caller.
pub async fn review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    caller: CurrentUser,
    Json(body): Json<ReviewBody>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_role(&[Role::Admin, Role::Teacher])?;
    let doc = state
        .client
        .documents()
        .review(&id, body.status, Some(caller.id()), body.notes)
        .await?;
    Ok(success_one_ok(doc))
}

/// POST /documents/:id/upload: multipart with `file`.
pub async fn upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_upload(multipart).await?;
    Ok(success_one_ok(state.client.documents().upload(&id, form.file).await?))
}

pub async fn file_url(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    let url = state.client.documents().fresh_url(&id).await?;
    Ok(success_one_ok(serde_json::json!({ "url": url })))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.documents().delete(&id).await?))
}
