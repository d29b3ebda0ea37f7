use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::routes::auth::claims::AccessTokenClaims;
use crate::services::backend::models::BackendUser;
use crate::utils::cookies::{cookie_value, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

/// The signed-in user for a single request. Never stored server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub id: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub full_name: Option<String>,
    pub scopes: Vec<String>,
}

impl SessionIdentity {
    pub fn from_claims(claims: &AccessTokenClaims) -> Self {
        SessionIdentity {
            id: claims.id.clone(),
            email: claims.sub.clone(),
            is_active: claims.is_active,
            is_superuser: claims.is_superuser,
            full_name: normalize_full_name(claims.full_name.as_deref()),
            scopes: string_scopes(&claims.scopes),
        }
    }

    pub fn from_backend_user(user: &BackendUser) -> Self {
        SessionIdentity {
            id: user.id.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            full_name: normalize_full_name(user.full_name.as_deref()),
            scopes: string_scopes(&user.scopes),
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|granted| granted == scope)
    }
}

fn normalize_full_name(name: Option<&str>) -> Option<String> {
    name.filter(|value| !value.trim().is_empty())
        .map(str::to_owned)
}

fn string_scopes(raw: &[Value]) -> Vec<String> {
    let mut scopes: Vec<String> = Vec::with_capacity(raw.len());
    for scope in raw.iter().filter_map(Value::as_str) {
        if !scopes.iter().any(|existing| existing == scope) {
            scopes.push(scope.to_owned());
        }
    }
    scopes
}

/// Identity attached by the session gate; `None` for anonymous requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentSession(pub Option<SessionIdentity>);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Credentials in effect for this request. After a silent refresh these are
/// the newly issued tokens rather than the ones the browser sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// The gate already spent this request's refresh attempt.
    pub refreshed: bool,
}

impl SessionTokens {
    pub fn from_jar(jar: &CookieJar) -> Self {
        SessionTokens {
            access_token: cookie_value(jar, ACCESS_TOKEN_COOKIE),
            refresh_token: cookie_value(jar, REFRESH_TOKEN_COOKIE),
            refreshed: false,
        }
    }
}

impl<S> FromRequestParts<S> for SessionTokens
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(tokens) = parts.extensions.get::<SessionTokens>() {
            return Ok(tokens.clone());
        }
        Ok(SessionTokens::from_jar(&CookieJar::from_headers(&parts.headers)))
    }
}
