//! Request extractors.

mod auth;

pub use auth::{bearer_token, CurrentUser, AUTHORIZATION_SCHEME};
