use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use goalplan_core::GoalError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Goal(GoalError),
    NotFound(&'static str),
    Internal(anyhow::Error),
}

impl From<GoalError> for ApiError {
    fn from(err: GoalError) -> Self {
        Self::Goal(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Goal(
                err @ (GoalError::AmountNotFound
                | GoalError::YearNotFound
                | GoalError::EmptyMessage),
            ) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Goal(GoalError::InvalidInput(msg)) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Self::Internal(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
