use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::models::{NewNotification, Role};
use crate::response::{success_count, success_many, success_one, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn list(State(state): State<AppState>, caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.notifications().list(&caller.id()).await?))
}

pub async fn unread_count(State(state): State<AppState>, caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_count(state.client.notifications().unread_count(&caller.id()).await?))
}

/// Staff can notify any user.
pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(body): Json<NewNotification>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_role(&[Role::Admin, Role::Teacher])?;
    Ok(success_one(state.client.notifications().create(&body).await?))
}

/// Only the recipient may mark a notification read.
pub async fn mark_read(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let n = state.client.notifications().get(&id).await?;
    caller.require_self(&[n.user_id])?;
    Ok(success_one_ok(state.client.notifications().mark_read(&id).await?))
}

pub async fn mark_all_read(State(state): State<AppState>, caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    let n = state.client.notifications().mark_all_read(&caller.id()).await?;
    Ok(success_count(n as u64))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let n = state.client.notifications().get(&id).await?;
    caller.require_self(&[n.user_id])?;
    Ok(success_one_ok(state.client.notifications().delete(&id).await?))
}
