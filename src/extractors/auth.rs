//! Resolve `Authorization: Bearer <token>` into the acting user.

use crate::auth::Session;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

pub const AUTHORIZATION_SCHEME: &str = "Bearer";

/// Signed-in caller. Rejects with 401 when the token is missing, unknown or expired.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
    pub session: Session,
}

impl CurrentUser {
    pub fn id(&self) -> uuid::Uuid {
        self.user.id
    }

    /// 403 unless the caller is one of `owners`.
    pub fn require_self(&self, owners: &[uuid::Uuid]) -> Result<(), AppError> {
        if owners.contains(&self.user.id) {
            return Ok(());
        }
        Err(AppError::Forbidden("this record belongs to another user".into()))
    }

    /// 403 unless the caller has one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.user.role) {
            return Ok(());
        }
        Err(AppError::Forbidden(format!("{} accounts cannot do this", self.user.role.as_str())))
    }
}

/// Token from the `Authorization` header, if it uses the bearer scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(AUTHORIZATION_SCHEME))
        .map(|(_, token)| token.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| AppError::Auth("missing bearer token".into()))?;
        let (session, user) = state.client.auth().session_user(&token).await?;
        Ok(CurrentUser { user, session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_scheme_only() {
        let mut h = HeaderMap::new();
        assert_eq!(bearer_token(&h), None);
        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&h).as_deref(), Some("abc123"));
        h.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&h), None);
    }
}
