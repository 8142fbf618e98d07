//! Password accounts, bearer sessions and the per-user auth context.
//!
//! Credentials and sessions are ordinary backend tables. `AuthService` returns typed errors;
//! `AuthContext` wraps it for callers that only need a success flag and a message.

use crate::backend::{from_row, from_rows, Filter, Query, Row};
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{NewUser, Role, User};
use crate::query_key;
use crate::schema::{AUTH_CREDENTIALS, AUTH_SESSIONS, PASSWORD_RESETS};
use crate::service::{require_text, select_by_id, validate_email, validate_password};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::RwLock;
use uuid::Uuid;

const TOKEN_LEN: usize = 48;
const SESSION_TTL_DAYS: i64 = 7;
const RESET_TTL_HOURS: i64 = 1;
const BAD_LOGIN: &str = "invalid email or password";

/// Outcome of an auth action. Never an `Err`: failures carry a message for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthResult {
    pub fn ok() -> Self {
        AuthResult {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        AuthResult {
            success: false,
            error: Some(message.into()),
        }
    }
}

impl<T> From<Result<T, AppError>> for AuthResult {
    fn from(r: Result<T, AppError>) -> Self {
        match r {
            Ok(_) => AuthResult::ok(),
            Err(AppError::Auth(m)) | Err(AppError::Validation(m)) | Err(AppError::Conflict(m)) => AuthResult::failed(m),
            Err(e) => AuthResult::failed(e.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Deserialize)]
struct Credential {
    user_id: Uuid,
    password_hash: String,
}

#[derive(Deserialize)]
struct PasswordReset {
    id: Uuid,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    used: bool,
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Auth(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

fn timestamp(t: DateTime<Utc>) -> Value {
    Value::String(t.to_rfc3339_opts(SecondsFormat::Micros, true))
}

pub struct AuthService<'a> {
    client: &'a CareClient,
}

impl<'a> AuthService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        AuthService { client }
    }

    async fn credential_by_email(&self, email: &str) -> Result<Option<Credential>, AppError> {
        let rows = self
            .client
            .backend()
            .select(&Query::table(AUTH_CREDENTIALS).eq("email", email).limit(1))
            .await?;
        Ok(from_rows::<Credential>(rows)?.into_iter().next())
    }

    async fn active_user(&self, id: &Uuid) -> Result<User, AppError> {
        let user: User = select_by_id(self.client, crate::schema::USERS, id)
            .await?
            .map(from_row)
            .transpose()?
            .ok_or_else(|| AppError::Auth("account not found".into()))?;
        if !user.is_active {
            return Err(AppError::Auth("account is deactivated".into()));
        }
        Ok(user)
    }

    /// Create a profile and its credentials.
    pub async fn signup(&self, email: &str, password: &str, full_name: &str, role: Role) -> Result<User, AppError> {
        let email = validate_email(email)?;
        validate_password(password)?;
        let full_name = require_text("full_name", full_name)?;
        if self.credential_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("an account with this email already exists".into()));
        }
        let hash = hash_password(password)?;
        let user = self
            .client
            .users()
            .create_profile(&NewUser {
                email: email.clone(),
                full_name,
                role,
                phone: None,
            })
            .await?;

        let mut row = Row::new();
        row.insert("user_id".into(), Value::String(user.id.to_string()));
        row.insert("email".into(), Value::String(email));
        row.insert("password_hash".into(), Value::String(hash));
        if let Err(e) = self.client.backend().insert(AUTH_CREDENTIALS, row).await {
            tracing::warn!(user_id = %user.id, error = %e, "credentials not stored; removing profile");
            if let Err(rollback) = self
                .client
                .backend()
                .delete(crate::schema::USERS, &crate::service::id_filter(&user.id))
                .await
            {
                tracing::warn!(user_id = %user.id, error = %rollback, "profile left without credentials");
            }
            self.client.cache().invalidate_all(&[query_key!("users"), query_key!("user")]);
            return Err(e);
        }
        tracing::info!(user_id = %user.id, role = role.as_str(), "account created");
        Ok(user)
    }

    /// Check the password and open a session. Unknown email and wrong password fail alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<(Session, User), AppError> {
        let email = validate_email(email).map_err(|_| AppError::Auth(BAD_LOGIN.into()))?;
        let cred = self
            .credential_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Auth(BAD_LOGIN.into()))?;
        if !verify_password(password, &cred.password_hash) {
            tracing::info!(user_id = %cred.user_id, "login rejected");
            return Err(AppError::Auth(BAD_LOGIN.into()));
        }
        let user = self.active_user(&cred.user_id).await?;

        let session = Session {
            token: random_token(),
            user_id: user.id,
            expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
        };
        let mut row = Row::new();
        row.insert("token".into(), Value::String(session.token.clone()));
        row.insert("user_id".into(), Value::String(user.id.to_string()));
        row.insert("expires_at".into(), timestamp(session.expires_at));
        self.client.backend().insert(AUTH_SESSIONS, row).await?;
        tracing::info!(user_id = %user.id, "session opened");
        Ok((session, user))
    }

    /// Close a session. Returns whether it existed.
    pub async fn logout(&self, token: &str) -> Result<bool, AppError> {
        let removed = self
            .client
            .backend()
            .delete(AUTH_SESSIONS, &[Filter::Eq("token".into(), token.into())])
            .await?;
        Ok(!removed.is_empty())
    }

    /// Resolve a bearer token to its session and active user.
    pub async fn session_user(&self, token: &str) -> Result<(Session, User), AppError> {
        let rows = self
            .client
            .backend()
            .select(&Query::table(AUTH_SESSIONS).eq("token", token).limit(1))
            .await?;
        let session: Session = from_rows::<Session>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Auth("invalid session".into()))?;
        if session.is_expired(Utc::now()) {
            self.logout(token).await?;
            return Err(AppError::Auth("session expired".into()));
        }
        let user = self.active_user(&session.user_id).await?;
        Ok((session, user))
    }

    /// Issue a reset token when the email has an account. `None` for unknown emails.
    /// Delivering the token is left to the caller.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AppError> {
        let email = validate_email(email)?;
        let Some(cred) = self.credential_by_email(&email).await? else {
            tracing::info!("password reset requested for unknown email");
            return Ok(None);
        };
        let token = random_token();
        let mut row = Row::new();
        row.insert("token".into(), Value::String(token.clone()));
        row.insert("user_id".into(), Value::String(cred.user_id.to_string()));
        row.insert("expires_at".into(), timestamp(Utc::now() + Duration::hours(RESET_TTL_HOURS)));
        self.client.backend().insert(PASSWORD_RESETS, row).await?;
        tracing::info!(user_id = %cred.user_id, "password reset issued");
        Ok(Some(token))
    }

    /// Set a new password from a reset token. The token is single-use and every open session
    /// of the account is closed.
    pub async fn complete_password_reset(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        validate_password(new_password)?;
        let rows = self
            .client
            .backend()
            .select(&Query::table(PASSWORD_RESETS).eq("token", token).limit(1))
            .await?;
        let reset = from_rows::<PasswordReset>(rows)?
            .into_iter()
            .next()
            .filter(|r| !r.used && r.expires_at > Utc::now())
            .ok_or_else(|| AppError::Auth("reset link is invalid or has expired".into()))?;

        self.set_password(&reset.user_id, new_password).await?;
        let mut used = Row::new();
        used.insert("used".into(), Value::Bool(true));
        self.client
            .backend()
            .update(PASSWORD_RESETS, &crate::service::id_filter(&reset.id), used)
            .await?;
        self.client
            .backend()
            .delete(AUTH_SESSIONS, &[Filter::Eq("user_id".into(), reset.user_id.to_string().into())])
            .await?;
        tracing::info!(user_id = %reset.user_id, "password reset completed");
        Ok(())
    }

    pub async fn update_password(&self, user_id: &Uuid, new_password: &str) -> Result<(), AppError> {
        validate_password(new_password)?;
        self.set_password(user_id, new_password).await
    }

    async fn set_password(&self, user_id: &Uuid, new_password: &str) -> Result<(), AppError> {
        let mut patch = Row::new();
        patch.insert("password_hash".into(), Value::String(hash_password(new_password)?));
        let updated = self
            .client
            .backend()
            .update(AUTH_CREDENTIALS, &[Filter::Eq("user_id".into(), user_id.to_string().into())], patch)
            .await?;
        if updated.is_empty() {
            return Err(AppError::Auth("account has no password".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
struct AuthState {
    session: Option<Session>,
    profile: Option<User>,
}

/// Signed-in state for one client: current session, profile and role.
pub struct AuthContext {
    client: CareClient,
    state: RwLock<AuthState>,
}

impl AuthContext {
    pub fn new(client: CareClient) -> Self {
        AuthContext {
            client,
            state: RwLock::new(AuthState::default()),
        }
    }

    fn set(&self, session: Option<Session>, profile: Option<User>) {
        if let Ok(mut s) = self.state.write() {
            s.session = session;
            s.profile = profile;
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.state.read().ok().and_then(|s| s.session.clone())
    }

    pub fn profile(&self) -> Option<User> {
        self.state.read().ok().and_then(|s| s.profile.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.state.read().ok().and_then(|s| s.profile.as_ref().map(|p| p.role))
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_teacher(&self) -> bool {
        self.role() == Some(Role::Teacher)
    }

    pub fn is_parent(&self) -> bool {
        self.role() == Some(Role::Parent)
    }

    /// Resume from a stored token.
    pub async fn restore(&self, token: &str) -> AuthResult {
        match self.client.auth().session_user(token).await {
            Ok((session, user)) => {
                self.set(Some(session), Some(user));
                AuthResult::ok()
            }
            Err(e) => {
                self.set(None, None);
                Err::<(), _>(e).into()
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult {
        match self.client.auth().login(email, password).await {
            Ok((session, user)) => {
                self.set(Some(session), Some(user));
                AuthResult::ok()
            }
            Err(e) => Err::<(), _>(e).into(),
        }
    }

    /// Create the account and sign in with it.
    pub async fn signup(&self, email: &str, password: &str, full_name: &str, role: Role) -> AuthResult {
        if let Err(e) = self.client.auth().signup(email, password, full_name, role).await {
            return Err::<(), _>(e).into();
        }
        self.login(email, password).await
    }

    /// Local state is cleared even when closing the session on the backend fails.
    pub async fn logout(&self) -> AuthResult {
        let token = self.session().map(|s| s.token);
        self.set(None, None);
        match token {
            Some(t) => self.client.auth().logout(&t).await.into(),
            None => AuthResult::ok(),
        }
    }

    /// Reports success for unknown emails so account existence is not revealed.
    pub async fn reset_password(&self, email: &str) -> AuthResult {
        self.client.auth().request_password_reset(email).await.into()
    }

    pub async fn complete_password_reset(&self, token: &str, new_password: &str) -> AuthResult {
        self.client.auth().complete_password_reset(token, new_password).await.into()
    }

    pub async fn update_password(&self, new_password: &str) -> AuthResult {
        let Some(session) = self.session() else {
            return AuthResult::failed("not signed in");
        };
        self.client
            .auth()
            .update_password(&session.user_id, new_password)
            .await
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_only_the_original_password() {
        let h = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &h));
        assert!(!verify_password("wrong horse", &h));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn tokens_are_long_and_distinct() {
        let a = random_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert_ne!(a, random_token());
    }

    #[test]
    fn results_carry_error_messages() {
        let r: AuthResult = Err::<(), _>(AppError::Auth(BAD_LOGIN.into())).into();
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some(BAD_LOGIN));
        assert_eq!(AuthResult::from(Ok::<_, AppError>(1)), AuthResult::ok());
    }
}
