use crate::error::AppError;
use crate::models::{ClassroomPatch, NewClassroom};
use crate::response::{success_many, success_one, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize, Default)]
pub struct ListParams {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Deserialize)]
pub struct AssignBody {
    pub teacher_id: Uuid,
}

pub async fn list(State(state): State<AppState>, Query(p): Query<ListParams>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.classrooms().list(p.include_inactive).await?))
}

pub async fn read(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.classrooms().get(&id).await?))
}

pub async fn create(State(state): State<AppState>, Json(body): Json<NewClassroom>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one(state.client.classrooms().create(&body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ClassroomPatch>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.classrooms().update(&id, &body).await?))
}

pub async fn deactivate(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.client.classrooms().deactivate(&id).await?))
}

pub async fn co_teachers(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.classrooms().co_teachers(&id).await?))
}

pub async fn assign_teacher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AssignBody>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one(state.client.classrooms().assign_teacher(&id, &body.teacher_id).await?))
}

pub async fn unassign_teacher(
    State(state): State<AppState>,
    Path((id, teacher_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    if !state.client.classrooms().unassign_teacher(&id, &teacher_id).await? {
        return Err(AppError::NotFound(format!("teacher {} in classroom {}", teacher_id, id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Classrooms a teacher leads or co-teaches.
pub async fn for_teacher(State(state): State<AppState>, Path(teacher_id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.classrooms().for_teacher(&teacher_id).await?))
}
