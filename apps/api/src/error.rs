use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use grantline_application::public_message;
use grantline_core::{AppError, StatusCategory};
use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    error: String,
    status_category: &'static str,
}

/// Caller-safe failure ready to be rendered as an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    message: String,
    status_category: StatusCategory,
}

impl ApiError {
    pub fn new(message: String, status_category: StatusCategory) -> Self {
        Self {
            message,
            status_category,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.status_category {
            StatusCategory::BadRequest | StatusCategory::NotFound => StatusCode::BAD_REQUEST,
            StatusCategory::Upstream => StatusCode::BAD_GATEWAY,
            StatusCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self::new(public_message(&value), value.status_category())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::new(
            format!("invalid request body: {}", value.body_text()),
            StatusCategory::BadRequest,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload = Json(ErrorResponse {
            error: self.message,
            status_category: self.status_category.as_str(),
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
