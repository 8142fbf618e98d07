use crate::error::AppError;
use crate::models::{MealLogPatch, NewMealLog};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::MealFilter;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn list(State(state): State<AppState>, Query(filter): Query<MealFilter>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.meals().list(&filter).await?))
}

pub async fn create(State(state): State<AppState>, Json(body): Json<NewMealLog>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one(state.client.meals().create(&body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<MealLogPatch>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.meals().update(&id, &body).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.meals().delete(&id).await?))
}
