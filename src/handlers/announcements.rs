use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::models::{AnnouncementPatch, NewAnnouncement, Role};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::AnnouncementFilter;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct PinBody {
    pub pinned: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<AnnouncementFilter>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.announcements().list(&filter).await?))
}

pub async fn read(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.announcements().get(&id).await?))
}

/// Staff only; the caller becomes the author.
pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(mut body): Json<NewAnnouncement>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_role(&[Role::Admin, Role::Teacher])?;
    body.author_id = Some(caller.id());
    Ok(success_one(state.client.announcements().create(&body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AnnouncementPatch>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.announcements().update(&id, &body).await?))
}

pub async fn set_pinned(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PinBody>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.announcements().set_pinned(&id, body.pinned).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.announcements().delete(&id).await?))
}
