use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method},
    Json,
};
use tracing::{debug, error, info};

use crate::{
    error::IngestError,
    models::{CoordinateInput, RecordCreatedResponse},
    server::AppState,
};

/// Record a GPS coordinate.
///
/// Only `POST` is accepted. The body must be JSON and carry `lat` and `lng`; their values
/// are stored as given next to a server timestamp, and the store-generated key
/// is returned. Store failures are logged and answered with a generic 500.
pub async fn record_coordinate(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RecordCreatedResponse>, IngestError> {
    if method != Method::POST {
        debug!("Rejecting {} request to GPS endpoint", method);
        return Err(IngestError::MethodNotAllowed);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let record = CoordinateInput::from_request(content_type, &body)
        .into_record()
        .ok_or(IngestError::MissingCoordinates)?;

    debug!(
        "Recording coordinate ({}, {}) at {}",
        record.lat, record.lng, record.timestamp
    );

    match state
        .store
        .append_child(&state.collection_path, &record)
        .await
    {
        Ok(id) => {
            info!(
                "Saved coordinate under {} with id {}",
                state.collection_path,
                id.as_deref().unwrap_or("<none>")
            );
            Ok(Json(RecordCreatedResponse::new(id)))
        }
        Err(e) => {
            error!("Error writing to Firebase: {}", e);
            Err(IngestError::Persistence(e))
        }
    }
}
