use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::backend::errors::BackendError;

#[derive(Serialize, Deserialize)]
pub struct JsonResponse {
    pub status: String,
    pub success: bool,
    pub message: String,
    pub code: Option<String>,
}

impl JsonResponse {
    pub fn success(msg: &str) -> impl IntoResponse {
        (
            StatusCode::OK,
            Json(JsonResponse {
                status: "success".to_string(),
                success: true,
                message: msg.to_string(),
                code: None,
            }),
        )
    }

    pub fn error(status: StatusCode, msg: &str) -> impl IntoResponse {
        (
            status,
            Json(JsonResponse {
                status: "error".to_string(),
                success: false,
                message: msg.to_string(),
                code: None,
            }),
        )
    }

    /// Relays a backend failure, keeping the backend's status when it sent one.
    pub fn backend_error(err: &BackendError) -> Response {
        match err {
            BackendError::Status { status, detail } => {
                let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                JsonResponse::error(status, detail).into_response()
            }
            BackendError::Transport(_) => {
                JsonResponse::error(StatusCode::BAD_GATEWAY, "Backend unavailable").into_response()
            }
            BackendError::InvalidBody | BackendError::MissingAccessToken => {
                JsonResponse::error(StatusCode::BAD_GATEWAY, "Unexpected backend response")
                    .into_response()
            }
        }
    }
}
