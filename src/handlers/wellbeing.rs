use crate::error::AppError;
use crate::models::{NewWellbeingReport, WellbeingReportPatch};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::WellbeingFilter;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<WellbeingFilter>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.wellbeing().list(&filter).await?))
}

pub async fn read(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.wellbeing().get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewWellbeingReport>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one(state.client.wellbeing().create(&body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<WellbeingReportPatch>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.wellbeing().update(&id, &body).await?))
}

pub async fn mark_parent_notified(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.wellbeing().mark_parent_notified(&id).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.wellbeing().delete(&id).await?))
}
