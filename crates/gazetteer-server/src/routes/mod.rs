//! API route definitions
//!
//! This module contains the HTTP route handlers for the address
//! resolution API.

pub mod compare;

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::OpenApi;

use crate::state::AppState;

/// Build API v1 routes
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(compare::routes()).route("/", get(api_info))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
}

/// API information response
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EndpointInfo {
    pub path: String,
    pub description: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// API info handler
#[utoipa::path(
    get,
    path = "/api/v1",
    responses(
        (status = 200, description = "API information", body = ApiInfo)
    ),
    tag = "Info"
)]
async fn api_info() -> Json<ApiInfo> {
    Json(ApiInfo {
        name: "Gazetteer Resolution API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Entity resolution over free-text postal addresses".to_string(),
        endpoints: vec![EndpointInfo {
            path: "/api/v1/compare".to_string(),
            description: "Compare two addresses for same-entity resolution".to_string(),
        }],
    })
}

/// Health check handler
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Readiness check handler
async fn readiness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ready".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Liveness check handler
async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(api_info, health_check, compare::compare,),
    components(
        schemas(
            ApiInfo,
            EndpointInfo,
            HealthResponse,
            compare::CompareRequest,
            compare::CompareResponse,
            compare::DecisionDto,
            compare::ParsedAddressDto,
        )
    ),
    tags(
        (name = "Info", description = "API information endpoints"),
        (name = "Health", description = "Health check endpoints"),
        (name = "Compare", description = "Address comparison endpoints"),
    )
)]
pub struct ApiDoc;
