//! # Lineage HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Registry status
//! - `POST /persons` - Create a person
//! - `GET /persons` - List persons
//! - `GET /persons/{person_id}` - Fetch one person
//! - `DELETE /persons/{person_id}` - Delete a person (no cascade)
//! - `GET /persons/{person_id}/family` - Immediate family
//! - `GET /persons/count?person_id=` - Family size (self + children)
//! - `GET /persons/gen?person_id=` - Paternal-line generation count
//! - `GET /persons/male_count?person_id=` - Males in the immediate family
//! - `GET /persons/female_count?person_id=` - Females in the immediate family
//! - `POST /export` - Export all records as a binary snapshot
//!
//! Security settings (CORS, rate limit, API key) come from `ServerConfig`.

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{ApiKey, key_matches};
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    CountResponse, CreatePersonRequest, DeleteResponse, ErrorResponse, ExportResponse,
    FamilyResponse, GenerationsResponse, HealthResponse, PersonJson, PersonQuery, PersonResponse,
    StatusResponse,
};

use crate::config::ServerConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::get,
};
use lineage_core::{LineageError, StorageBackend};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the person store.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend holding every person record.
    pub store: Arc<RwLock<StorageBackend>>,
    /// Settings the router was built from.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create app state with default server settings.
    #[must_use]
    pub fn new(store: StorageBackend) -> Self {
        Self::with_config(store, ServerConfig::default())
    }

    /// Create app state with explicit server settings.
    #[must_use]
    pub fn with_config(store: StorageBackend, config: ServerConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

/// Build the CORS layer.
///
/// - `"*"`: allows all origins (development only)
/// - `None`: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(ALLOWED_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if an API key is configured)
pub fn create_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let cors = build_cors_layer(config.cors_origins.as_deref());

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/persons",
            get(handlers::list_persons_handler).post(handlers::create_person_handler),
        )
        .route(
            "/persons/",
            get(handlers::list_persons_handler).post(handlers::create_person_handler),
        )
        .route("/persons/count", get(handlers::family_size_handler))
        .route("/persons/gen", get(handlers::generations_handler))
        .route("/persons/male_count", get(handlers::male_count_handler))
        .route("/persons/female_count", get(handlers::female_count_handler))
        .route(
            "/persons/{person_id}",
            get(handlers::get_person_handler).delete(handlers::delete_person_handler),
        )
        .route("/persons/{person_id}/family", get(handlers::family_handler))
        .route("/export", axum::routing::post(handlers::export_handler));

    match config.api_key.as_deref() {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            let key: ApiKey = Arc::from(key);
            router = router.layer(axum_middleware::from_fn_with_state(
                key,
                auth::api_key_auth_middleware,
            ));
        }
        None => {
            tracing::warn!(
                "API key authentication DISABLED - all endpoints are publicly accessible! \
                 Set LINEAGE_API_KEY or [server] api_key to enable authentication."
            );
        }
    }

    if config.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", config.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(config.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(config.body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Resolve after Ctrl+C so the server can drain in-flight requests.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(store: StorageBackend, config: ServerConfig) -> Result<(), LineageError> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::with_config(store, config);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LineageError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Lineage HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LineageError::IoError(format!("Server error: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================
