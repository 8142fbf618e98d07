use super::read_upload;
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::models::{ActivityLogPatch, NewActivityLog};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::ActivityFilter;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ActivityFilter>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.activities().list(&filter).await?))
}

pub async fn read(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.activities().get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    caller: Option<CurrentUser>,
    Json(mut body): Json<NewActivityLog>,
) -> Result<impl IntoResponse, AppError> {
    if body.logged_by.is_none() {
        body.logged_by = caller.map(|c| c.id());
    }
    Ok(success_one(state.client.activities().create(&body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ActivityLogPatch>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.activities().update(&id, &body).await?))
}

pub async fn acknowledge(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.activities().acknowledge(&id).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.activities().delete(&id).await?))
}

pub async fn photos(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.activities().photos(&id).await?))
}

/// POST /activities/:id/photos: multipart with `file` and an optional `caption`.
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    caller: Option<CurrentUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = read_upload(multipart).await?;
    let caption = form.fields.remove("caption");
    let photo = state
        .client
        .activities()
        .upload_photo(&id, form.file, caption, caller.map(|c| c.id()))
        .await?;
    Ok(success_one(photo))
}

pub async fn delete_photo(
    State(state): State<AppState>,
    Path((_activity_id, photo_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.activities().delete_photo(&photo_id).await?))
}
