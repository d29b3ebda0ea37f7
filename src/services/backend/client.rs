use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    errors::BackendError,
    models::{BackendUser, RefreshRequest, TokenPair, TokenResponse},
    service::AuthBackend,
};

#[derive(Clone)]
pub struct BackendClient {
    pub client: Client,
    pub base_url: String,
}

impl BackendClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthBackend for BackendClient {
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, BackendError> {
        // The token endpoint expects an OAuth2 password form, not JSON
        let res = self
            .client
            .post(self.url("/login/access-token"))
            .form(&[
                ("username", email),
                ("password", password),
                ("scope", ""),
                ("grant_type", "password"),
            ])
            .send()
            .await?;

        let body: TokenResponse = read_json(res).await?;
        token_pair(body)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, BackendError> {
        let res = self
            .client
            .post(self.url("/login/refresh"))
            .json(&RefreshRequest {
                refresh_token: Some(refresh_token),
            })
            .send()
            .await?;

        let body: TokenResponse = read_json(res).await?;
        token_pair(body)
    }

    async fn current_user(&self, access_token: &str) -> Result<BackendUser, BackendError> {
        let res = self
            .client
            .get(self.url("/users/me"))
            .bearer_auth(access_token)
            .send()
            .await?;

        read_json(res).await
    }

    async fn logout(&self, refresh_token: Option<&str>) -> Result<(), BackendError> {
        let res = self
            .client
            .post(self.url("/logout"))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(status_error(res).await);
        }
        Ok(())
    }
}

fn token_pair(body: TokenResponse) -> Result<TokenPair, BackendError> {
    let access_token = body
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or(BackendError::MissingAccessToken)?;

    Ok(TokenPair {
        access_token,
        refresh_token: body.refresh_token.filter(|token| !token.is_empty()),
    })
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, BackendError> {
    if !res.status().is_success() {
        return Err(status_error(res).await);
    }
    res.json().await.map_err(|_| BackendError::InvalidBody)
}

async fn status_error(res: Response) -> BackendError {
    let status = res.status();
    let detail = match res.json::<Value>().await {
        Ok(body) => match body.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => status.canonical_reason().unwrap_or("error").to_string(),
        },
        Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
    };

    BackendError::Status {
        status: status.as_u16(),
        detail,
    }
}
