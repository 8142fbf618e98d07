use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::models::{Role, SchoolSettingsPatch};
use crate::response::success_one_ok;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};

pub async fn read(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let settings = state
        .client
        .settings()
        .get()
        .await?
        .ok_or_else(|| AppError::NotFound("school settings".into()))?;
    Ok(success_one_ok(settings))
}

pub async fn update(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(body): Json<SchoolSettingsPatch>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_role(&[Role::Admin])?;
    Ok(success_one_ok(state.client.settings().update(&body).await?))
}
