use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("invalid advisor request: {0}")]
    InvalidRequest(String),

    /// No successful reply after the whole retry ladder.
    #[error("upstream provider error (status {status:?})")]
    Upstream { status: Option<u16>, body: Value },
}

impl AdvisorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdvisorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AdvisorError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AdvisorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AdvisorError::InvalidRequest(msg) => json!({ "detail": msg }),
            AdvisorError::Upstream { body, .. } => json!({ "detail": { "provider_error": body } }),
        };
        (status, Json(body)).into_response()
    }
}
