//! Gazetteer Server - the `/compare` HTTP façade over the address
//! resolution engine.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use gazetteer_core::config::Config as PipelineConfig;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use utoipa::OpenApi;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use state::AppState;

/// Initialize the Gazetteer server with the given server and engine
/// configuration, and the directory holding the alias files.
pub async fn init_server(
    config: ServerConfig,
    pipeline_config: PipelineConfig,
    data_dir: impl AsRef<Path>,
) -> ServerResult<Router> {
    info!("Initializing Gazetteer server v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config.clone(), pipeline_config, data_dir.as_ref()).await?;
    let app = build_router(state, &config)?;

    info!("Gazetteer server initialized successfully");
    Ok(app)
}

/// Build the main application router with all routes and middleware
fn build_router(state: AppState, config: &ServerConfig) -> ServerResult<Router> {
    let cors = build_cors_layer(config)?;

    let app = Router::new()
        .nest("/api/v1", routes::api_routes())
        .nest("/health", routes::health_routes())
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", <routes::ApiDoc as OpenApi>::openapi()),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(cors);

    Ok(app)
}

/// Build CORS layer from configuration
fn build_cors_layer(config: &ServerConfig) -> ServerResult<CorsLayer> {
    use tower_http::cors::Any;

    let cors = if config.cors.allow_any_origin {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<http::HeaderValue> = config
            .cors
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    Ok(cors)
}

/// Start the server and listen on the configured address
pub async fn serve(config: ServerConfig, pipeline_config: PipelineConfig, data_dir: impl AsRef<Path>) -> ServerResult<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Configuration(format!("Invalid host/port: {}", e)))?;

    info!("Starting Gazetteer server on {}", addr);

    let app = init_server(config.clone(), pipeline_config, data_dir).await?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::IoError(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server listening on http://{}", addr);
    info!("API documentation available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::IoError(format!("Server error: {}", e)))?;

    warn!("Server stopped");
    Ok(())
}
