pub mod admin;
pub mod auth;
pub mod session;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{gate::session_gate, responses::JsonResponse, state::AppState};

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::handle_login))
        .route("/logout", get(auth::handle_logout));

    // Superuser-only area
    let admin_routes = Router::new()
        .route("/", get(admin::handle_admin_layout))
        .route("/{*section}", get(admin::handle_admin_layout))
        .route_layer(middleware::from_fn(admin::require_superuser));

    Router::new()
        .route("/", get(root))
        .route("/api/session", get(session::handle_session))
        .route("/api/me", get(session::handle_me))
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), session_gate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Response {
    JsonResponse::success("Recipe admin web is running").into_response()
}

async fn not_found() -> Response {
    JsonResponse::error(StatusCode::NOT_FOUND, "Not found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
        Json,
    };
    use chrono::Duration;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{
        config::Config,
        services::backend::{
            errors::BackendError,
            mock_backend::MockBackend,
            models::{BackendUser, TokenPair},
        },
        session::CurrentSession,
        utils::jwt::test_support::{access_payload, access_token, sign_payload, TEST_SECRET},
    };

    fn state(backend: Arc<MockBackend>) -> AppState {
        AppState::for_tests(backend, Config::test_default())
    }

    /// A page-like route behind the gate that echoes the attached identity.
    fn page_app(state: AppState) -> Router {
        Router::new()
            .route(
                "/dashboard",
                get(|CurrentSession(identity): CurrentSession| async move { Json(identity) }),
            )
            .layer(middleware::from_fn_with_state(state.clone(), session_gate))
            .with_state(state)
    }

    fn get_with_cookies(uri: &str, cookies: &str) -> Request<Body> {
        let mut builder = Request::get(uri);
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn set_cookies(res: &Response) -> Vec<String> {
        res.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    async fn json_body(res: Response) -> Value {
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn anonymous_request_reaches_handler_without_identity() {
        let backend = Arc::new(MockBackend::default());
        let res = page_app(state(backend.clone()))
            .oneshot(get_with_cookies("/dashboard", ""))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(set_cookies(&res).is_empty());
        assert!(json_body(res).await.is_null());
        assert_eq!(backend.refresh_call_count(), 0);
    }

    #[tokio::test]
    async fn expired_token_with_valid_refresh_continues_with_new_identity() {
        let a2 = access_token("fresh@example.com", Duration::hours(1));
        let backend = Arc::new(MockBackend {
            refresh_result: Some(Ok(TokenPair {
                access_token: a2.clone(),
                refresh_token: None,
            })),
            ..Default::default()
        });
        let expired = access_token("fresh@example.com", Duration::minutes(-1));

        let res = page_app(state(backend.clone()))
            .oneshot(get_with_cookies(
                "/dashboard",
                &format!("auth_token={expired}; refresh_token=R1"),
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let cookies = set_cookies(&res);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with(&format!("auth_token={a2}")));
        assert!(cookies[0].contains("HttpOnly"));
        assert!(cookies[0].contains("Secure"));
        assert!(cookies[0].contains("SameSite=Strict"));
        assert!(cookies[0].contains("Max-Age=3600"));
        assert_eq!(backend.refresh_call_count(), 1);

        let identity = json_body(res).await;
        assert_eq!(identity["email"], "fresh@example.com");
    }

    #[tokio::test]
    async fn expired_token_without_refresh_redirects_to_login() {
        let backend = Arc::new(MockBackend::default());
        let expired = access_token("stale@example.com", Duration::minutes(-1));

        let res = page_app(state(backend))
            .oneshot(get_with_cookies("/dashboard", &format!("auth_token={expired}")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(
            res.headers()[header::LOCATION],
            "/auth/login?redirectTo=%2Fdashboard"
        );
        let cookies = set_cookies(&res);
        assert!(cookies.iter().any(|c| c.starts_with("auth_token=;")));
        assert!(cookies.iter().any(|c| c.starts_with("refresh_token=;")));
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn devtools_probe_returns_empty_no_content() {
        let backend = Arc::new(MockBackend::default());
        let res = build_router(state(backend.clone()))
            .oneshot(get_with_cookies(
                "/.well-known/appspecific/com.chrome.devtools/x",
                "auth_token=garbage; refresh_token=R1",
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(set_cookies(&res).is_empty());
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
        assert_eq!(backend.refresh_call_count(), 0);
    }

    #[tokio::test]
    async fn layout_session_reflects_token_claims() {
        let token = access_token("chef@example.com", Duration::minutes(30));
        let res = build_router(state(Arc::new(MockBackend::default())))
            .oneshot(get_with_cookies("/api/session", &format!("auth_token={token}")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["authenticatedUser"]["email"], "chef@example.com");
        assert_eq!(
            json["scopes"],
            serde_json::json!(["recipes:read", "ingredients:read"])
        );
    }

    #[tokio::test]
    async fn admin_area_requires_superuser() {
        let token = access_token("chef@example.com", Duration::minutes(30));
        let res = build_router(state(Arc::new(MockBackend::default())))
            .oneshot(get_with_cookies("/admin/users", &format!("auth_token={token}")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers()[header::LOCATION],
            "/auth/login?redirectTo=%2Fadmin%2Fusers"
        );
    }

    #[tokio::test]
    async fn anonymous_admin_visit_is_sent_to_login() {
        let res = build_router(state(Arc::new(MockBackend::default())))
            .oneshot(get_with_cookies("/admin", ""))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/auth/login?redirectTo=%2Fadmin");
    }

    #[tokio::test]
    async fn superuser_enters_admin_area() {
        let mut payload = access_payload("admin@example.com", Duration::minutes(30));
        payload["is_superuser"] = Value::Bool(true);
        let token = sign_payload(&payload, TEST_SECRET);

        let res = build_router(state(Arc::new(MockBackend::default())))
            .oneshot(get_with_cookies("/admin/ingredients", &format!("auth_token={token}")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["authenticatedUser"]["is_superuser"], true);
    }

    #[tokio::test]
    async fn logout_cookies_win_over_refreshed_cookies() {
        let backend = Arc::new(MockBackend {
            refresh_result: Some(Ok(TokenPair {
                access_token: access_token("chef@example.com", Duration::hours(1)),
                refresh_token: Some("R2".into()),
            })),
            ..Default::default()
        });
        let expired = access_token("chef@example.com", Duration::minutes(-1));

        let res = build_router(state(backend.clone()))
            .oneshot(get_with_cookies(
                "/auth/logout",
                &format!("auth_token={expired}; refresh_token=R1"),
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FOUND);
        let cookies = set_cookies(&res);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        assert_eq!(
            *backend.logout_calls.lock().unwrap(),
            vec![Some("R2".to_string())]
        );
    }

    #[tokio::test]
    async fn me_after_gate_refresh_does_not_refresh_again() {
        let backend = Arc::new(MockBackend {
            refresh_result: Some(Ok(TokenPair {
                access_token: access_token("chef@example.com", Duration::hours(1)),
                refresh_token: Some("R2".into()),
            })),
            user_result: Some(Err(BackendError::unauthorized("Could not validate credentials"))),
            ..Default::default()
        });
        let expired = access_token("chef@example.com", Duration::minutes(-1));

        let res = build_router(state(backend.clone()))
            .oneshot(get_with_cookies(
                "/api/me",
                &format!("auth_token={expired}; refresh_token=R1"),
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(*backend.refresh_calls.lock().unwrap(), vec!["R1".to_string()]);
    }

    #[tokio::test]
    async fn login_form_is_processed_despite_stale_access_cookie() {
        let backend = Arc::new(MockBackend {
            login_result: Some(Ok(TokenPair {
                access_token: "A1".into(),
                refresh_token: Some("R1".into()),
            })),
            user_result: Some(Ok(BackendUser {
                id: "u-1".into(),
                email: "chef@example.com".into(),
                is_active: true,
                is_superuser: false,
                full_name: None,
                scopes: vec![],
            })),
            ..Default::default()
        });
        let expired = access_token("chef@example.com", Duration::minutes(-1));

        let req = Request::post("/auth/login?redirectTo=%2Frecipes")
            .header(header::COOKIE, format!("auth_token={expired}"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=chef%40example.com&password=hunter22"))
            .unwrap();
        let res = build_router(state(backend.clone())).oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/recipes");
        let cookies = set_cookies(&res);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.starts_with("auth_token=A1")));
        assert!(cookies.iter().any(|c| c.starts_with("refresh_token=R1")));
        assert_eq!(backend.login_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let res = build_router(state(Arc::new(MockBackend::default())))
            .oneshot(get_with_cookies("/nowhere", ""))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
