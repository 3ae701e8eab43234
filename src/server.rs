use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    handlers::{health, record_coordinate},
    services::store::DynStore,
};

/// State shared by every request: the initialized store handle and the
/// collection records are appended under.
#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub collection_path: String,
}

impl AppState {
    pub fn new(store: DynStore, collection_path: impl Into<String>) -> Self {
        Self {
            store,
            collection_path: collection_path.into(),
        }
    }
}

/// Build the HTTP router.
///
/// The GPS route accepts every method so the handler can answer non-POST
/// requests with its own 405 body.
pub fn router(config: &Config, store: DynStore) -> Router {
    let state = AppState::new(store, config.gps_collection_path.clone());

    Router::new()
        .route(&config.gps_endpoint_path, any(record_coordinate))
        .route("/health", get(health))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::StoreError, models::CoordinateRecord, services::store::CoordinateStore};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    struct UnreachableStore;

    #[async_trait]
    impl CoordinateStore for UnreachableStore {
        async fn append_child(
            &self,
            _path: &str,
            _record: &CoordinateRecord,
        ) -> Result<Option<String>, StoreError> {
            panic!("store must not be called");
        }
    }

    fn app() -> Router {
        router(&Config::default(), Arc::new(UnreachableStore))
    }

    #[tokio::test]
    async fn test_head_request_is_rejected_before_store() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("HEAD")
                    .uri("/api/gps")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
    }

    #[tokio::test]
    async fn test_empty_post_is_rejected_before_store() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/gps")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app()
            .oneshot(Request::builder().uri("/api/other").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
