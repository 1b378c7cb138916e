//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::{Error, OptimizeError};

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<OptimizeError> for AppError {
    fn from(err: OptimizeError) -> Self {
        Self::Core(Error::Optimize(err))
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

fn internal(message: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %message, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            Self::Core(err) => match err {
                Error::Domain(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
                Error::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
                Error::Optimize(e) => match e {
                    OptimizeError::Validation(v) => {
                        (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", v.to_string())
                    }
                    OptimizeError::SolverTimeout(_) => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "SOLVER_TIMEOUT",
                        e.to_string(),
                    ),
                    OptimizeError::InfeasibleProblem => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "INFEASIBLE_PROBLEM",
                        e.to_string(),
                    ),
                    OptimizeError::Cancelled => (StatusCode::CONFLICT, "CANCELLED", e.to_string()),
                    OptimizeError::Internal(msg) => internal(msg),
                },
                other => internal(&other.to_string()),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();
        let body = json!({
            "error": message,
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}
