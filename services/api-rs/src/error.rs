use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of a single collector call. Logged by the dispatcher, never surfaced.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("collector rejected {path} with {status}: {body}")]
    Rejected {
        path: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("event {0} not found")]
    EventNotFound(u64),
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::EventNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidBody(rejection) => rejection.status(),
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
