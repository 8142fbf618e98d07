//! Account endpoints. Reset requests answer the same way whether or not the email exists.

use crate::auth::AuthResult;
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::models::Role;
use crate::response::{success_one, success_one_ok};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct SignupBody {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// Honoured only when an admin creates the account; self sign-up is always a parent.
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ResetBody {
    pub email: String,
}

#[derive(Deserialize)]
pub struct CompleteResetBody {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PasswordBody {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub user: crate::models::User,
}

pub async fn signup(
    State(state): State<AppState>,
    caller: Option<CurrentUser>,
    Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, AppError> {
    let is_admin = caller.map(|c| c.user.role == Role::Admin).unwrap_or(false);
    let role = match body.role {
        Some(r) if is_admin => r,
        _ => Role::Parent,
    };
    let user = state
        .client
        .auth()
        .signup(&body.email, &body.password, &body.full_name, role)
        .await?;
    Ok(success_one(user))
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Result<impl IntoResponse, AppError> {
    let (session, user) = state.client.auth().login(&body.email, &body.password).await?;
    Ok(success_one_ok(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user,
    }))
}

pub async fn logout(State(state): State<AppState>, caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    state.client.auth().logout(&caller.session.token).await?;
    Ok(success_one_ok(AuthResult::ok()))
}

/// Always reports success for a well-formed email. The token goes to the log until
/// an email sender is wired in.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetBody>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = state.client.auth().request_password_reset(&body.email).await? {
        tracing::debug!(token = %token, "password reset token issued");
    }
    Ok(success_one_ok(AuthResult::ok()))
}

pub async fn complete_reset(
    State(state): State<AppState>,
    Json(body): Json<CompleteResetBody>,
) -> Result<impl IntoResponse, AppError> {
    state
        .client
        .auth()
        .complete_password_reset(&body.token, &body.password)
        .await?;
    Ok(success_one_ok(AuthResult::ok()))
}

pub async fn update_password(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(body): Json<PasswordBody>,
) -> Result<impl IntoResponse, AppError> {
    state.client.auth().update_password(&caller.id(), &body.password).await?;
    Ok(success_one_ok(AuthResult::ok()))
}
