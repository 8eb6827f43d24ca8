use std::sync::Arc;

use axum::{routing::get, Router};

use monitoring_cell::{create_monitoring_router, HealthMonitorService};
use product_stats_cell::{create_stats_router, RefreshCoordinator};

pub fn create_router(
    coordinator: Arc<RefreshCoordinator>,
    health_service: Arc<HealthMonitorService>,
) -> Router {
    Router::new()
        .route("/", get(|| async { "Product Stats API is running!" }))
        .nest("/api", create_stats_router(coordinator))
        .merge(create_monitoring_router(health_service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use product_stats_cell::OdaCatalogSource;
    use shared_config::AppConfig;
    use shared_database::RedisBackend;
    use tower::ServiceExt;

    fn offline_app() -> Router {
        let config = AppConfig {
            redis_url: "redis://127.0.0.1:1".to_string(),
            oda_api_base_url: "http://127.0.0.1:1".to_string(),
            ..AppConfig::default()
        };
        let backend = Arc::new(RedisBackend::new(&config).unwrap());
        let catalog = Arc::new(OdaCatalogSource::new(&config));

        create_router(
            Arc::new(RefreshCoordinator::new(&config, catalog)),
            Arc::new(HealthMonitorService::new(&config, backend)),
        )
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn root_is_a_liveness_string() {
        let (status, body) = get(offline_app(), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("running"));
    }

    #[tokio::test]
    async fn health_is_mounted_at_top_level() {
        let (status, body) = get(offline_app(), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"redis\":\"disconnected\""));
    }

    #[tokio::test]
    async fn stats_are_not_mounted_at_top_level() {
        let (status, _) = get(offline_app(), "/stats").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
