use async_trait::async_trait;

use super::{
    errors::BackendError,
    models::{BackendUser, TokenPair},
};

/// The slice of the backend API the web tier's authentication depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `POST /login/access-token`
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, BackendError>;
    /// `POST /login/refresh`. Called at most once per incoming request.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, BackendError>;
    /// `GET /users/me`
    async fn current_user(&self, access_token: &str) -> Result<BackendUser, BackendError>;
    /// `POST /logout`, revoking the refresh token when one is given.
    async fn logout(&self, refresh_token: Option<&str>) -> Result<(), BackendError>;
}
