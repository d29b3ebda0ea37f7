use axum::{
    extract::{OriginalUri, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};

use crate::{
    gate::login_redirect_location,
    routes::session::LayoutSession,
    session::CurrentSession,
};

/// Guards the admin area. Only superusers get through.
pub async fn require_superuser(
    OriginalUri(original_uri): OriginalUri,
    CurrentSession(identity): CurrentSession,
    req: Request,
    next: Next,
) -> Response {
    match identity {
        Some(identity) if identity.is_superuser => next.run(req).await,
        Some(identity) => {
            tracing::warn!(user_id = %identity.id, path = %original_uri.path(), "non-superuser denied admin access");
            Redirect::to(&login_redirect_location(original_uri.path())).into_response()
        }
        None => Redirect::to(&login_redirect_location(original_uri.path())).into_response(),
    }
}

pub async fn handle_admin_layout(CurrentSession(identity): CurrentSession) -> Json<LayoutSession> {
    Json(LayoutSession::from(identity))
}
