use axum::{
    Router,
    extract::State,
    http::Method,
    middleware as axum_middleware,
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::config::ServerConfig;
use crate::services::IntegrationCredentialService;
use crate::web::middleware::auth;
use crate::web::routes::*;

pub use crate::web::error::AppError;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub integration_credentials: Arc<IntegrationCredentialService>,
    pub config: Arc<ServerConfig>,
}

async fn health_check_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<&'static str, AppError> {
    app_state.db_pool.ping().await?;
    Ok("OK")
}

pub fn create_axum_router(
    db_pool: DatabaseConnection,
    integration_credentials: Arc<IntegrationCredentialService>,
    config: Arc<ServerConfig>,
) -> Router {
    let app_state = Arc::new(AppState {
        db_pool,
        integration_credentials,
        config,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    // The last route_layer wraps the others, so `auth` runs before `require_admin`.
    Router::new()
        .route("/api/health", get(health_check_handler))
        .nest(
            "/api/integration-credentials",
            integration_credential_routes::create_integration_credential_router()
                .route_layer(axum_middleware::from_fn(auth::require_admin))
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
