use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tds_core::{CalculationError, RepositoryError};
use thiserror::Error;
use tracing::error;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,     // HTTP status code
    pub error: String,   // Short error identifier
    pub message: String, // Human-readable error message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrorResponse {
    pub fn new(
        status: StatusCode,
        error: &str,
        message: &str,
        details: Vec<String>,
    ) -> Self {
        ErrorResponse {
            status: status.as_u16(),
            error: error.to_string(),
            message: message.to_string(),
            details,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidBody(String),

    #[error("Request validation failed")]
    Validation(Vec<String>),

    #[error(transparent)]
    Calculation(#[from] CalculationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Failed to build report: {0}")]
    Report(#[from] rust_xlsxwriter::XlsxError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) | Self::Validation(_) | Self::Calculation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Repository(_) | Self::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidBody(_) => "invalid_body",
            Self::Validation(_) => "validation_failed",
            Self::Calculation(CalculationError::UnknownSection(_)) => "unknown_section",
            Self::Calculation(CalculationError::AmountOutOfRange) => "amount_out_of_range",
            Self::Calculation(_) => "calculation_failed",
            Self::Repository(RepositoryError::NotFound) => "not_found",
            Self::Repository(_) => "storage_error",
            Self::Report(_) => "report_failed",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let details = match &self {
            Self::Validation(problems) => problems.clone(),
            _ => Vec::new(),
        };
        ErrorResponse::new(status, self.code(), &self.to_string(), details).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn unknown_section_is_bad_request() {
        let err = ApiError::from(CalculationError::UnknownSection("194Z".to_string()));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "unknown_section");
        assert_eq!(err.to_string(), "Section 194Z not found");
    }

    #[test]
    fn overflowing_amount_is_bad_request() {
        let err = ApiError::from(CalculationError::AmountOutOfRange);

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "amount_out_of_range");
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let err = ApiError::from(RepositoryError::Database("locked".to_string()));

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::from(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn error_response_omits_empty_details() {
        let body = serde_json::to_value(ErrorResponse::new(
            StatusCode::BAD_REQUEST,
            "invalid_body",
            "bad",
            Vec::new(),
        ))
        .unwrap();

        assert_eq!(body["status"], 400);
        assert!(body.get("details").is_none());
    }
}
