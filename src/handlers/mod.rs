pub mod gps;

use axum::{response::IntoResponse, Json};

pub use gps::record_coordinate;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "gps-ingest",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
