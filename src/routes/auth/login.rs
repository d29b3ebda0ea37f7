use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    responses::JsonResponse,
    state::AppState,
    utils::cookies::{access_token_cookie, append_set_cookies, refresh_token_cookie},
};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
pub struct LoginQuery {
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// Only same-site paths are honored; anything else lands on `/`.
pub fn safe_redirect_target(target: Option<&str>) -> &str {
    match target {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

pub async fn handle_login(
    State(app_state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Response {
    let pair = match app_state.backend.login(&form.email, &form.password).await {
        Ok(pair) => pair,
        Err(err) => {
            tracing::warn!(email = %form.email, %err, "login rejected by backend");
            return JsonResponse::backend_error(&err);
        }
    };

    if let Err(err) = app_state.backend.current_user(&pair.access_token).await {
        tracing::error!(email = %form.email, %err, "failed to load user after login");
        return JsonResponse::error(StatusCode::NOT_FOUND, "User not found").into_response();
    }

    let secure = app_state.config.auth_cookie_secure;
    let mut cookies = vec![access_token_cookie(pair.access_token, secure)];
    if let Some(refresh_token) = pair.refresh_token {
        cookies.push(refresh_token_cookie(refresh_token, secure));
    }

    tracing::info!(email = %form.email, "user logged in");
    let mut response =
        Redirect::to(safe_redirect_target(query.redirect_to.as_deref())).into_response();
    append_set_cookies(response.headers_mut(), &cookies);
    response
}
