mod common;

use async_trait::async_trait;
use daycare_sdk::models::Role;
use daycare_sdk::{
    AppError, AuthContext, AuthResult, Backend, CareClient, Filter, MemoryBackend, MemoryStorage, Query, Realtime, Row,
};
use std::sync::Arc;

/// Memory backend that refuses to store credentials and, optionally, to delete profiles.
struct NoCredentials {
    inner: MemoryBackend,
    block_user_delete: bool,
}

#[async_trait]
impl Backend for NoCredentials {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, AppError> {
        self.inner.select(query).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, AppError> {
        if table == "auth_credentials" {
            return Err(AppError::BadRequest("credentials store offline".into()));
        }
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>, AppError> {
        self.inner.update(table, filters, patch).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, AppError> {
        if self.block_user_delete && table == "users" {
            return Err(AppError::BadRequest("users store offline".into()));
        }
        self.inner.delete(table, filters).await
    }
}

fn client_without_credentials(block_user_delete: bool) -> CareClient {
    let backend = NoCredentials {
        inner: MemoryBackend::new(),
        block_user_delete,
    };
    CareClient::new(Arc::new(backend), Arc::new(MemoryStorage::new()), Realtime::new())
}

#[tokio::test]
async fn signup_then_login_opens_a_session() {
    let c = common::client();
    let user = c
        .auth()
        .signup("Maria@Example.org", "sunflower42", "Maria Rivera", Role::Parent)
        .await
        .unwrap();
    assert_eq!(user.email, "maria@example.org");

    let (session, profile) = c.auth().login("maria@example.org", "sunflower42").await.unwrap();
    assert_eq!(profile.id, user.id);
    let (resolved, _) = c.auth().session_user(&session.token).await.unwrap();
    assert_eq!(resolved.user_id, user.id);

    assert!(c.auth().logout(&session.token).await.unwrap());
    assert!(matches!(c.auth().session_user(&session.token).await, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let c = common::client();
    c.auth().signup("tess@example.org", "sunflower42", "Tess", Role::Teacher).await.unwrap();
    let err = c
        .auth()
        .signup("TESS@example.org", "another-pass", "Tess Two", Role::Teacher)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_fail_the_same_way() {
    let c = common::client();
    c.auth().signup("maria@example.org", "sunflower42", "Maria", Role::Parent).await.unwrap();
    let wrong = c.auth().login("maria@example.org", "not-it-at-all").await.unwrap_err();
    let unknown = c.auth().login("nobody@example.org", "sunflower42").await.unwrap_err();
    assert_eq!(wrong.to_string(), unknown.to_string());
}

#[tokio::test]
async fn short_password_is_rejected() {
    let c = common::client();
    let err = c.auth().signup("a@example.org", "short", "A", Role::Parent).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn deactivated_account_cannot_sign_in() {
    let c = common::client();
    let user = c.auth().signup("maria@example.org", "sunflower42", "Maria", Role::Parent).await.unwrap();
    c.users().deactivate(&user.id).await.unwrap();
    let err = c.auth().login("maria@example.org", "sunflower42").await.unwrap_err();
    assert!(matches!(err, AppError::Auth(ref m) if m.contains("deactivated")));
}

#[tokio::test]
async fn password_reset_is_single_use_and_closes_sessions() {
    let c = common::client();
    c.auth().signup("maria@example.org", "sunflower42", "Maria", Role::Parent).await.unwrap();
    let (session, _) = c.auth().login("maria@example.org", "sunflower42").await.unwrap();

    assert!(c.auth().request_password_reset("ghost@example.org").await.unwrap().is_none());
    let token = c
        .auth()
        .request_password_reset("maria@example.org")
        .await
        .unwrap()
        .unwrap();
    c.auth().complete_password_reset(&token, "daffodil99").await.unwrap();

    assert!(c.auth().session_user(&session.token).await.is_err());
    assert!(c.auth().login("maria@example.org", "sunflower42").await.is_err());
    assert!(c.auth().login("maria@example.org", "daffodil99").await.is_ok());

    let again = c.auth().complete_password_reset(&token, "tulip12345").await.unwrap_err();
    assert!(matches!(again, AppError::Auth(_)));
}

#[tokio::test]
async fn context_tracks_role_and_reports_failures_as_results() {
    let c = common::client();
    let ctx = AuthContext::new(c.clone());
    assert!(ctx.session().is_none());

    let r = ctx.signup("tess@example.org", "sunflower42", "Tess", Role::Teacher).await;
    assert_eq!(r, AuthResult::ok());
    assert!(ctx.is_teacher());
    assert!(!ctx.is_admin());
    assert_eq!(ctx.profile().map(|p| p.full_name), Some("Tess".to_string()));

    let token = ctx.session().map(|s| s.token).unwrap();
    assert!(ctx.logout().await.success);
    assert!(ctx.role().is_none());

    let bad = ctx.login("tess@example.org", "wrong-password").await;
    assert!(!bad.success);
    assert_eq!(bad.error.as_deref(), Some("invalid email or password"));

    // the logged-out token no longer restores
    assert!(!ctx.restore(&token).await.success);

    assert!(ctx.reset_password("ghost@example.org").await.success);
    assert!(!ctx.update_password("whatever123").await.success);
}

#[tokio::test]
async fn failed_credentials_remove_the_new_profile() {
    let c = client_without_credentials(false);
    let err = c
        .auth()
        .signup("maria@example.org", "sunflower42", "Maria", Role::Parent)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "bad request: credentials store offline");
    assert!(c.users().by_email("maria@example.org").await.unwrap().is_none());
}

#[tokio::test]
async fn failed_rollback_still_reports_the_credentials_error() {
    let c = client_without_credentials(true);
    let err = c
        .auth()
        .signup("maria@example.org", "sunflower42", "Maria", Role::Parent)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "bad request: credentials store offline");
    // the orphaned profile stays behind and is logged
    assert!(c.users().by_email("maria@example.org").await.unwrap().is_some());
}
