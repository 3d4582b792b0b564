use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domains::DomainError;
use serde_json::json;

/// Error type for HTTP handlers.
///
/// Wraps [`DomainError`] and adds the failures only the web layer can hit.
/// Renders as a JSON body `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
}

pub type WebResult<T> = Result<T, WebError>;

/// Status a failed form submission is answered with.
pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::UploadInProgress => StatusCode::CONFLICT,
        DomainError::NotFound(..) => StatusCode::NOT_FOUND,
        DomainError::Fetch(_) | DomainError::Persist(_) => StatusCode::BAD_GATEWAY,
        DomainError::MalformedStyleData(_)
        | DomainError::Conversion(_)
        | DomainError::Upload(_)
        | DomainError::MissingIdentifier
        | DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn code_for(err: &DomainError) -> &'static str {
    match err {
        DomainError::MalformedStyleData(_) => "MALFORMED_STYLE",
        DomainError::Conversion(_) => "CONVERSION_FAILED",
        DomainError::Upload(_) => "UPLOAD_FAILED",
        DomainError::Fetch(_) => "FETCH_FAILED",
        DomainError::MissingIdentifier => "MISSING_IDENTIFIER",
        DomainError::Persist(_) => "PERSIST_FAILED",
        DomainError::Validation(_) => "VALIDATION_ERROR",
        DomainError::UploadInProgress => "UPLOAD_IN_PROGRESS",
        DomainError::NotFound(..) => "NOT_FOUND",
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            WebError::Domain(err) => (status_for(err), code_for(err), err.to_string()),
            WebError::Template(err) => {
                tracing::error!(error = %err, "template rendering failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            WebError::Multipart(err) => (err.status(), "BAD_REQUEST", err.body_text()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
