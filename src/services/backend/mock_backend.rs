use async_trait::async_trait;
use std::sync::Mutex;

use super::{
    errors::BackendError,
    models::{BackendUser, TokenPair},
    service::AuthBackend,
};

/// Canned backend responses plus a record of every call made.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub login_result: Option<Result<TokenPair, BackendError>>,
    pub refresh_result: Option<Result<TokenPair, BackendError>>,
    pub user_result: Option<Result<BackendUser, BackendError>>,
    pub logout_fails: bool,
    pub login_calls: Mutex<Vec<(String, String)>>,
    pub refresh_calls: Mutex<Vec<String>>,
    pub current_user_calls: Mutex<Vec<String>>,
    pub logout_calls: Mutex<Vec<Option<String>>>,
}

fn not_configured<T>() -> Result<T, BackendError> {
    Err(BackendError::Transport("mock response not configured".into()))
}

impl MockBackend {
    pub fn refresh_call_count(&self) -> usize {
        self.refresh_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, BackendError> {
        self.login_calls
            .lock()
            .unwrap()
            .push((email.to_string(), password.to_string()));
        self.login_result.clone().unwrap_or_else(not_configured)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, BackendError> {
        self.refresh_calls
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        self.refresh_result.clone().unwrap_or_else(not_configured)
    }

    async fn current_user(&self, access_token: &str) -> Result<BackendUser, BackendError> {
        self.current_user_calls
            .lock()
            .unwrap()
            .push(access_token.to_string());
        self.user_result.clone().unwrap_or_else(not_configured)
    }

    async fn logout(&self, refresh_token: Option<&str>) -> Result<(), BackendError> {
        self.logout_calls
            .lock()
            .unwrap()
            .push(refresh_token.map(str::to_string));
        if self.logout_fails {
            return Err(BackendError::Transport("mock fail".into()));
        }
        Ok(())
    }
}
