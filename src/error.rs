use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Generic message shown when the narrative report cannot be produced.
pub const GENERATION_FAILED: &str =
    "Failed to generate PDF. Please try again or contact support if the issue persists.";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Failed to load template {path}: {reason}")]
    TemplateInvalid { path: String, reason: String },
    #[error("Nothing to export: fill any section to generate a report")]
    NothingToExport,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("{}", GENERATION_FAILED)]
    GenerationFailed,
}

impl From<lopdf::Error> for ReportError {
    fn from(err: lopdf::Error) -> Self {
        ReportError::Pdf(err.to_string())
    }
}

impl ReportError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ReportError::TemplateNotFound(_) => (StatusCode::BAD_GATEWAY, "TEMPLATE_NOT_FOUND"),
            ReportError::TemplateInvalid { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "TEMPLATE_INVALID"),
            ReportError::NothingToExport => (StatusCode::UNPROCESSABLE_ENTITY, "NOTHING_TO_EXPORT"),
            ReportError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ReportError::Pdf(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PDF_ERROR"),
            ReportError::GenerationFailed => (StatusCode::INTERNAL_SERVER_ERROR, "GENERATION_FAILED"),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorResponse { success: false, error: self.to_string(), code };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_errors_name_the_path() {
        let err = ReportError::TemplateNotFound("/standard 1/1-2.pdf".into());
        assert_eq!(err.to_string(), "Template not found: /standard 1/1-2.pdf");
        assert_eq!(err.status_and_code().0, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn guarded_failure_uses_generic_message() {
        assert_eq!(ReportError::GenerationFailed.to_string(), GENERATION_FAILED);
    }
}
