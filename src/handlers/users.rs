use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::models::{NewUser, Role, UserPatch};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::UserFilter;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct RoleBody {
    pub role: Role,
}

pub async fn me(caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(caller.user))
}

pub async fn list(State(state): State<AppState>, Query(filter): Query<UserFilter>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.users().list(&filter).await?))
}

pub async fn read(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.users().get(&id).await?))
}

/// Admin only: profile without a password (the person signs in after a reset).
pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_role(&[Role::Admin])?;
    Ok(success_one(state.client.users().create_profile(&body).await?))
}

/// Callers may edit themselves; admins may edit anyone.
pub async fn update(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UserPatch>,
) -> Result<impl IntoResponse, AppError> {
    if caller.id() != id {
        caller.require_role(&[Role::Admin])?;
    }
    Ok(success_one_ok(state.client.users().update(&id, &body).await?))
}

pub async fn set_role(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RoleBody>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_role(&[Role::Admin])?;
    Ok(success_one_ok(state.client.users().set_role(&id, body.role).await?))
}

pub async fn deactivate(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_role(&[Role::Admin])?;
    Ok(success_one_ok(state.client.users().deactivate(&id).await?))
}

pub async fn activate(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_role(&[Role::Admin])?;
    Ok(success_one_ok(state.client.users().activate(&id).await?))
}
