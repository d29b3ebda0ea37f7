use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(String),
    #[error("backend responded with {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("backend response body could not be parsed")]
    InvalidBody,
    #[error("backend response did not include an access token")]
    MissingAccessToken,
}

impl BackendError {
    pub fn unauthorized(detail: &str) -> Self {
        BackendError::Status {
            status: 401,
            detail: detail.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Status { status: 401, .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}
