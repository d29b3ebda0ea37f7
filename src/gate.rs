//! Per-request authentication gate.
//!
//! Every request is classified before it reaches a handler: the devtools probe
//! gets an empty 204, requests without an access token continue anonymously,
//! and requests with a token either continue with a [`SessionIdentity`]
//! (possibly after one silent refresh) or are sent to the login page with
//! their session cookies cleared.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::IdentitySource,
    routes::auth::claims::ClaimsRejection,
    services::backend::errors::BackendError,
    session::{CurrentSession, SessionIdentity, SessionTokens},
    state::AppState,
    utils::{
        cookies::{
            access_token_cookie, append_unset_cookies, cleared_session_cookies,
            refresh_token_cookie,
        },
        jwt::verify_access_token,
    },
};

/// Browser devtools probe this path on every page load.
pub const DEVTOOLS_PROBE_PREFIX: &str = "/.well-known/appspecific/com.chrome.devtools";
pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";

#[derive(Debug)]
pub enum GateOutcome {
    /// Run the handler. `cookies` are rotated credentials to send back.
    Continue {
        identity: Option<SessionIdentity>,
        tokens: SessionTokens,
        cookies: Vec<Cookie<'static>>,
    },
    Redirect {
        location: String,
        cookies: Vec<Cookie<'static>>,
    },
    NoContent,
}

#[derive(Debug, Error)]
pub enum IdentityRejection {
    #[error(transparent)]
    Claims(#[from] ClaimsRejection),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub fn login_redirect_location(path: &str) -> String {
    format!("{LOGIN_PATH}?redirectTo={}", urlencoding::encode(path))
}

/// Confirms an access token and materializes the identity it carries.
pub async fn resolve_identity(
    state: &AppState,
    access_token: &str,
) -> Result<SessionIdentity, IdentityRejection> {
    match state.config.identity_source {
        IdentitySource::Token => {
            let claims =
                verify_access_token(access_token, state.config.jwt_secret.as_ref(), Utc::now())?;
            Ok(SessionIdentity::from_claims(&claims))
        }
        IdentitySource::Backend => {
            let user = state.backend.current_user(access_token).await?;
            Ok(SessionIdentity::from_backend_user(&user))
        }
    }
}

pub async fn evaluate(state: &AppState, path: &str, jar: &CookieJar) -> GateOutcome {
    if path.starts_with(DEVTOOLS_PROBE_PREFIX) {
        return GateOutcome::NoContent;
    }

    let presented = SessionTokens::from_jar(jar);
    let Some(access_token) = presented.access_token.clone() else {
        return GateOutcome::Continue {
            identity: None,
            tokens: presented,
            cookies: Vec::new(),
        };
    };

    match resolve_identity(state, &access_token).await {
        Ok(identity) => {
            return GateOutcome::Continue {
                identity: Some(identity),
                tokens: presented,
                cookies: Vec::new(),
            };
        }
        Err(reason) => debug!(%path, %reason, "access token rejected"),
    }

    let secure = state.config.auth_cookie_secure;
    if let Some(refresh_token) = presented.refresh_token.as_deref() {
        match state.backend.refresh(refresh_token).await {
            Ok(pair) => {
                let mut cookies = vec![access_token_cookie(pair.access_token.clone(), secure)];
                if let Some(rotated) = pair.refresh_token.clone() {
                    cookies.push(refresh_token_cookie(rotated, secure));
                }

                match resolve_identity(state, &pair.access_token).await {
                    Ok(identity) => {
                        info!(user_id = %identity.id, %path, "session refreshed");
                        let tokens = SessionTokens {
                            access_token: Some(pair.access_token),
                            refresh_token: pair
                                .refresh_token
                                .or_else(|| presented.refresh_token.clone()),
                            refreshed: true,
                        };
                        return GateOutcome::Continue {
                            identity: Some(identity),
                            tokens,
                            cookies,
                        };
                    }
                    Err(reason) => warn!(%path, %reason, "refreshed access token is unusable"),
                }
            }
            Err(err) => warn!(%path, %err, "token refresh failed"),
        }
    } else {
        debug!(%path, "no refresh token to recover the session with");
    }

    let cookies = cleared_session_cookies(secure);
    // Login and logout run against a cleared session instead of redirecting to themselves
    if path == LOGIN_PATH || path == LOGOUT_PATH {
        return GateOutcome::Continue {
            identity: None,
            tokens: SessionTokens {
                access_token: None,
                refreshed: presented.refresh_token.is_some(),
                refresh_token: presented.refresh_token,
            },
            cookies,
        };
    }

    // Anonymous requests returned above, so a token was presented here
    GateOutcome::Redirect {
        location: login_redirect_location(path),
        cookies,
    }
}

/// Middleware applying [`evaluate`] to every request.
pub async fn session_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();

    match evaluate(&state, &path, &jar).await {
        GateOutcome::NoContent => StatusCode::NO_CONTENT.into_response(),
        GateOutcome::Redirect { location, cookies } => {
            info!(%path, "session invalid, redirecting to login");
            let mut response = (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
            append_unset_cookies(response.headers_mut(), &cookies);
            response
        }
        GateOutcome::Continue {
            identity,
            tokens,
            cookies,
        } => {
            req.extensions_mut().insert(CurrentSession(identity));
            req.extensions_mut().insert(tokens);
            let mut response = next.run(req).await;
            append_unset_cookies(response.headers_mut(), &cookies);
            response
        }
    }
}
