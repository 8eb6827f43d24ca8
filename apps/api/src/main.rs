use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use monitoring_cell::HealthMonitorService;
use product_stats_cell::{BackgroundRefresher, OdaCatalogSource, RefreshCoordinator};
use shared_config::AppConfig;
use shared_database::RedisBackend;
use shared_models::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Product Stats API server");

    let config = AppConfig::from_env();
    config
        .validate()
        .map_err(|e| AppError::Config(e.to_string()))?;

    // Shared services
    let backend = Arc::new(
        RedisBackend::new(&config).map_err(|e| AppError::Startup(e.to_string()))?,
    );
    let catalog = Arc::new(OdaCatalogSource::new(&config));
    let coordinator =
        Arc::new(RefreshCoordinator::new(&config, catalog).with_mirror(backend.clone()));
    let health_service = Arc::new(HealthMonitorService::new(&config, backend));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresher = if config.stats_background_refresh {
        Some(BackgroundRefresher::new(coordinator.clone()).spawn(shutdown_rx))
    } else {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            if let Err(e) = coordinator.refresh_now().await {
                warn!("Initial stats warm-up failed: {}", e);
            }
        });
        None
    };

    // Set up CORS
    let origin = config
        .cors_allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| AppError::Config(format!("CORS_ALLOWED_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(coordinator, health_service)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Startup(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("Server stopped, shutting down background tasks");
    let _ = shutdown_tx.send(true);
    if let Some(handle) = refresher {
        if let Err(e) = handle.await {
            error!("Background refresher ended abnormally: {}", e);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
