use crate::error::AppError;
use crate::models::{ChildPatch, NewChild};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::ChildFilter;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct LinkParentBody {
    pub parent_id: Uuid,
    #[serde(default)]
    pub relationship: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ChildFilter>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.children().list(&filter).await?))
}

pub async fn read(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.children().get(&id).await?))
}

pub async fn create(State(state): State<AppState>, Json(body): Json<NewChild>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one(state.client.children().create(&body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ChildPatch>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.children().update(&id, &body).await?))
}

/// DELETE is a soft delete.
pub async fn deactivate(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.children().deactivate(&id).await?))
}

pub async fn reactivate(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.children().reactivate(&id).await?))
}

pub async fn parents(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.children().parents(&id).await?))
}

pub async fn link_parent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<LinkParentBody>,
) -> Result<impl IntoResponse, AppError> {
    let link = state
        .client
        .children()
        .link_parent(&id, &body.parent_id, body.relationship.as_deref())
        .await?;
    Ok(success_one(link))
}

pub async fn unlink_parent(
    State(state): State<AppState>,
    Path((id, parent_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    if !state.client.children().unlink_parent(&id, &parent_id).await? {
        return Err(AppError::NotFound(format!("parent link {} -> {}", parent_id, id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn for_parent(State(state): State<AppState>, Path(parent_id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.children().for_parent(&parent_id).await?))
}
