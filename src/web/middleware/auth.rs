use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use std::sync::Arc;
use tracing::warn;

use crate::web::models::{AuthenticatedUser, Claims};
use crate::web::{AppState, error::AppError};

pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let jwt_secret = &state.config.jwt_secret;

    // Try to get token from Authorization header first, then fall back to cookie
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| jar.get("token").map(|c| c.value().to_string()))
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!(error = ?e, "JWT decoding error during auth middleware.");
        AppError::Unauthorized("Invalid authentication token".to_string())
    })?;

    let authenticated_user = AuthenticatedUser {
        id: token_data.claims.sub,
        role: token_data.claims.role,
    };
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}

/// Must run after `auth`, which inserts the `AuthenticatedUser` extension.
pub async fn require_admin(req: Request<AxumBody>, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;

    if !user.is_admin() {
        warn!(user_id = %user.id, role = %user.role, "Non-admin user denied.");
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }
    Ok(next.run(req).await)
}
