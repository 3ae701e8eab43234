use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ErrorResponse;

/// Failures of the store client. Never shown to callers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("service account credentials unusable: {0}")]
    Credentials(String),

    #[error("access token exchange failed: {0}")]
    Token(String),

    #[error("database request failed: {0}")]
    Request(String),

    #[error("database returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Outcomes of the ingest handler that end in an error response.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Missing \"lat\" or \"lng\" in the request body")]
    MissingCoordinates,

    #[error("Failed to save data")]
    Persistence(#[from] StoreError),
}

impl IngestError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            IngestError::MissingCoordinates => StatusCode::BAD_REQUEST,
            IngestError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        // Display of Persistence is the generic message; the cause stays in the source
        let body = Json(ErrorResponse::new(self.to_string()));

        match self {
            IngestError::MethodNotAllowed => {
                (self.status(), [(header::ALLOW, "POST")], body).into_response()
            }
            _ => (self.status(), body).into_response(),
        }
    }
}
