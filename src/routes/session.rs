use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{
    responses::JsonResponse,
    services::backend::{auth_fetch::fetch_with_refresh, errors::BackendError},
    session::{CurrentSession, SessionIdentity, SessionTokens},
    state::AppState,
    utils::cookies::{access_token_cookie, append_set_cookies, refresh_token_cookie},
};

#[derive(Debug, Serialize)]
pub struct LayoutSession {
    #[serde(rename = "authenticatedUser")]
    pub authenticated_user: Option<SessionIdentity>,
    pub scopes: Vec<String>,
}

impl From<Option<SessionIdentity>> for LayoutSession {
    fn from(identity: Option<SessionIdentity>) -> Self {
        let scopes = identity
            .as_ref()
            .map(|identity| identity.scopes.clone())
            .unwrap_or_default();
        LayoutSession {
            authenticated_user: identity,
            scopes,
        }
    }
}

/// Session data every page layout needs.
pub async fn handle_session(CurrentSession(identity): CurrentSession) -> Json<LayoutSession> {
    Json(LayoutSession::from(identity))
}

/// Proxies `GET /users/me`, refreshing once if the backend answers 401.
pub async fn handle_me(State(app_state): State<AppState>, tokens: SessionTokens) -> Response {
    let backend = app_state.backend.clone();
    // One refresh per request; the gate may already have used it
    let refresh_token = if tokens.refreshed {
        None
    } else {
        tokens.refresh_token.as_deref()
    };
    let fetched = fetch_with_refresh(
        app_state.backend.as_ref(),
        tokens.access_token.clone(),
        refresh_token,
        |access_token| {
            let backend = backend.clone();
            async move {
                match access_token {
                    Some(token) => backend.current_user(&token).await,
                    None => Err(BackendError::unauthorized("Not authenticated")),
                }
            }
        },
    )
    .await;

    let mut response = match fetched.result {
        Ok(user) => Json(user).into_response(),
        Err(err) => JsonResponse::backend_error(&err),
    };

    if let Some(pair) = fetched.rotated {
        let secure = app_state.config.auth_cookie_secure;
        let mut cookies = vec![access_token_cookie(pair.access_token, secure)];
        if let Some(refresh_token) = pair.refresh_token {
            cookies.push(refresh_token_cookie(refresh_token, secure));
        }
        append_set_cookies(response.headers_mut(), &cookies);
    }
    response
}
