use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::mail::DispatchError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// `Json` whose rejection is reported through `AppError`, so malformed bodies
/// get the same envelope as every other failure.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl AppError {
    /// Collects request fields that are absent or blank.
    /// Returns `MissingFields` when any are, so handlers can `?` it.
    pub fn require(fields: &[(&str, Option<&str>)]) -> Result<(), AppError> {
        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingFields(missing))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidBody(rejection) => {
                (rejection.status(), "INVALID_BODY", self.to_string())
            }
            AppError::MissingFields(_) => {
                (StatusCode::BAD_REQUEST, "MISSING_FIELDS", self.to_string())
            }
            AppError::Dispatch(e) => dispatch_status(e),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn dispatch_status(e: &DispatchError) -> (StatusCode, &'static str, String) {
    match e {
        DispatchError::UnknownTemplate(_) => (StatusCode::NOT_FOUND, "UNKNOWN_TEMPLATE", e.to_string()),
        DispatchError::MissingFields(_) => (StatusCode::BAD_REQUEST, "MISSING_FIELDS", e.to_string()),
        DispatchError::InvalidPayload(_) | DispatchError::Address(_) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
        }
        DispatchError::Layout(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "LAYOUT_ERROR",
            e.to_string(),
        ),
        DispatchError::Smtp(_) | DispatchError::Delivery(_) => {
            tracing::error!("Email delivery error: {e}");
            (
                StatusCode::BAD_GATEWAY,
                "SMTP_ERROR",
                "Failed to send email".to_string(),
            )
        }
        DispatchError::TemplateNotFound(_) | DispatchError::Render(_) | DispatchError::Message(_) => {
            tracing::error!("Email rendering error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RENDER_ERROR",
                "Failed to render email".to_string(),
            )
        }
    }
}
