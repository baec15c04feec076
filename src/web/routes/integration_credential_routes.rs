use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::db::models::IntegrationCredential;
use crate::services::IntegrationCredentialError;
use crate::web::models::integration_credential_models::{
    CreateIntegrationCredentialRequest, ListIntegrationCredentialsQuery,
    UpdateIntegrationCredentialRequest,
};
use crate::web::{AppError, AppState};

pub fn create_integration_credential_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_credentials).post(create_credential))
        .route("/active/{integration_type}", get(get_active_credential))
        .route(
            "/{id}",
            get(get_credential)
                .put(update_credential)
                .delete(delete_credential),
        )
}

/// A path segment that is not a UUID cannot name a stored record.
fn parse_id(raw: &str) -> Result<Uuid, IntegrationCredentialError> {
    Uuid::parse_str(raw).map_err(|_| IntegrationCredentialError::NotFound(raw.to_string()))
}

/// Every failure becomes a 400. Storage failures are logged and answered with `fallback`.
fn client_error(err: IntegrationCredentialError, fallback: &str) -> AppError {
    match err {
        IntegrationCredentialError::Repository(e) => {
            error!(error = %e, "{}", fallback);
            AppError::BadRequest(fallback.to_string())
        }
        other => AppError::BadRequest(other.to_string()),
    }
}

/// Like `client_error`, but absence is a 404.
fn lookup_error(err: IntegrationCredentialError, fallback: &str) -> AppError {
    if err.is_not_found() {
        AppError::NotFound(err.to_string())
    } else {
        client_error(err, fallback)
    }
}

async fn create_credential(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<CreateIntegrationCredentialRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IntegrationCredential>), AppError> {
    let Json(payload) = payload?;
    let data = payload.into_new_credential()?;

    let created = app_state
        .integration_credentials
        .create(data)
        .await
        .map_err(|e| client_error(e, "Failed to create integration credential"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_credentials(
    State(app_state): State<Arc<AppState>>,
    query: Result<Query<ListIntegrationCredentialsQuery>, QueryRejection>,
) -> Result<Json<Vec<IntegrationCredential>>, AppError> {
    let Query(query) = query?;
    let credentials = app_state
        .integration_credentials
        .list(query.into())
        .await
        .map_err(|e| client_error(e, "Failed to list integration credentials"))?;
    Ok(Json(credentials))
}

async fn get_credential(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<IntegrationCredential>, AppError> {
    const FALLBACK: &str = "Failed to fetch integration credential";
    let id = parse_id(&id).map_err(|e| lookup_error(e, FALLBACK))?;

    let credential = app_state
        .integration_credentials
        .get_by_id(id)
        .await
        .map_err(|e| lookup_error(e, FALLBACK))?;
    Ok(Json(credential))
}

async fn get_active_credential(
    State(app_state): State<Arc<AppState>>,
    Path(integration_type): Path<String>,
) -> Result<Json<IntegrationCredential>, AppError> {
    let credential = app_state
        .integration_credentials
        .get_active_by_type(&integration_type)
        .await
        .map_err(|e| lookup_error(e, "Failed to fetch active integration credential"))?;
    Ok(Json(credential))
}

async fn update_credential(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateIntegrationCredentialRequest>, JsonRejection>,
) -> Result<Json<IntegrationCredential>, AppError> {
    const FALLBACK: &str = "Failed to update integration credential";
    let id = parse_id(&id).map_err(|e| client_error(e, FALLBACK))?;
    let Json(payload) = payload?;

    let updated = app_state
        .integration_credentials
        .update(id, payload.into())
        .await
        .map_err(|e| client_error(e, FALLBACK))?;
    Ok(Json(updated))
}

async fn delete_credential(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    const FALLBACK: &str = "Failed to delete integration credential";
    let id = parse_id(&id).map_err(|e| client_error(e, FALLBACK))?;

    app_state
        .integration_credentials
        .delete(id)
        .await
        .map_err(|e| client_error(e, FALLBACK))?;
    Ok(StatusCode::NO_CONTENT)
}
