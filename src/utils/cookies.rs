use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration as TimeDuration;

pub const ACCESS_TOKEN_COOKIE: &str = "auth_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

pub const ACCESS_TOKEN_MAX_AGE_SECS: i64 = 60 * 60;
pub const REFRESH_TOKEN_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

pub fn access_token_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(TimeDuration::seconds(ACCESS_TOKEN_MAX_AGE_SECS))
        .build()
}

pub fn refresh_token_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(TimeDuration::seconds(REFRESH_TOKEN_MAX_AGE_SECS))
        .build()
}

/// Expired replacements for both session cookies.
pub fn cleared_session_cookies(secure: bool) -> Vec<Cookie<'static>> {
    let mut access = access_token_cookie(String::new(), secure);
    access.set_max_age(TimeDuration::seconds(0));
    let mut refresh = refresh_token_cookie(String::new(), secure);
    refresh.set_max_age(TimeDuration::seconds(0));
    vec![access, refresh]
}

/// Non-empty value of a request cookie.
pub fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

pub fn append_set_cookies(headers: &mut HeaderMap, cookies: &[Cookie<'_>]) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(err) => {
                tracing::error!(?err, cookie = cookie.name(), "cookie is not a valid header value");
            }
        }
    }
}

/// Like [`append_set_cookies`] but leaves cookies the response already sets untouched.
pub fn append_unset_cookies(headers: &mut HeaderMap, cookies: &[Cookie<'_>]) {
    let already_set: Vec<String> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_owned()).ok())
        .map(|cookie| cookie.name().to_owned())
        .collect();

    let pending: Vec<Cookie<'_>> = cookies
        .iter()
        .filter(|cookie| !already_set.iter().any(|name| name == cookie.name()))
        .cloned()
        .collect();
    append_set_cookies(headers, &pending);
}
