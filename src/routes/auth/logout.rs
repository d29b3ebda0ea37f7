use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    session::SessionTokens,
    state::AppState,
    utils::cookies::{append_set_cookies, cleared_session_cookies},
};

pub async fn handle_logout(State(app_state): State<AppState>, tokens: SessionTokens) -> Response {
    if let Some(refresh_token) = tokens.refresh_token.as_deref() {
        // Revocation is best effort; the cookies are cleared regardless
        if let Err(err) = app_state.backend.logout(Some(refresh_token)).await {
            tracing::warn!(%err, "failed to revoke refresh token on logout");
        }
    }

    let mut response = (StatusCode::FOUND, [(LOCATION, "/")]).into_response();
    append_set_cookies(
        response.headers_mut(),
        &cleared_session_cookies(app_state.config.auth_cookie_secure),
    );
    response
}
