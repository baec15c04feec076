use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bizhub_backend::db::{self, repositories::SeaOrmIntegrationCredentialRepository};
use bizhub_backend::server::config::ServerConfig;
use bizhub_backend::services::IntegrationCredentialService;
use bizhub_backend::services::encryption_service::EncryptionService;
use bizhub_backend::web::{create_axum_router, models::Claims};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const JWT_SECRET: &str = "test-secret";
const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
const BASE: &str = "/api/integration-credentials";

async fn app() -> Router {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db_pool = Database::connect(opt).await.unwrap();
    db::ensure_schema(&db_pool).await.unwrap();

    let config = Arc::new(ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        credential_encryption_key: KEY_HEX.to_string(),
        log_dir: "logs".to_string(),
        max_db_connections: 1,
    });
    let encryption = Arc::new(EncryptionService::from_hex_key(KEY_HEX).unwrap());
    let repository = SeaOrmIntegrationCredentialRepository::new(db_pool.clone(), encryption);
    let service = Arc::new(IntegrationCredentialService::new(Arc::new(repository)));

    create_axum_router(db_pool, service, config)
}

fn token(role: &str) -> String {
    let claims = Claims {
        sub: "user-1".to_string(),
        role: role.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let admin = token("admin");
    send_as(app, method, uri, body, Some(admin.as_str())).await
}

async fn send_as(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {bearer}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, value)
}

fn evolution_principal() -> Value {
    json!({
        "name": "Evolution Principal",
        "type": "evolution",
        "credentials": { "apiToken": "xxx" }
    })
}

#[tokio::test]
async fn test_credential_lifecycle() {
    let app = app().await;

    let (status, created) = send(&app, "POST", BASE, Some(evolution_principal())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["isActive"], json!(true));
    assert_eq!(created["type"], json!("evolution"));
    assert_eq!(created["credentials"], json!({ "apiToken": "xxx" }));
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", BASE, Some(evolution_principal())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    let (status, fetched) = send(&app, "GET", &format!("{BASE}/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("{BASE}/{id}"),
        Some(json!({ "isActive": false, "type": "zapi" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["isActive"], json!(false));
    assert_eq!(updated["type"], json!("evolution"));
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_ne!(updated["updatedAt"], created["updatedAt"]);

    let (status, body) = send(&app, "DELETE", &format!("{BASE}/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, "GET", &format!("{BASE}/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "DELETE", &format!("{BASE}/{id}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_requires_name_type_and_credentials() {
    let app = app().await;

    for body in [
        json!({ "type": "evolution", "credentials": { "apiToken": "xxx" } }),
        json!({ "name": "x", "credentials": { "apiToken": "xxx" } }),
        json!({ "name": "x", "type": "evolution" }),
    ] {
        let (status, response) = send(&app, "POST", BASE, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response["error"].is_string());
    }

    let (status, response) = send(
        &app,
        "POST",
        BASE,
        Some(json!({ "name": "x", "type": "evolution", "credentials": "not-an-object" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].is_string());
}

#[tokio::test]
async fn test_list_filters_by_type_and_active_flag() {
    let app = app().await;

    for (name, integration_type, active) in [
        ("evo-1", "evolution", true),
        ("evo-2", "evolution", false),
        ("zapi-1", "zapi", true),
    ] {
        let (status, _) = send(
            &app,
            "POST",
            BASE,
            Some(json!({
                "name": name,
                "type": integration_type,
                "credentials": { "token": name },
                "isActive": active,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, all) = send(&app, "GET", BASE, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, evolution) = send(&app, "GET", &format!("{BASE}?type=evolution"), None).await;
    assert_eq!(evolution.as_array().unwrap().len(), 2);

    let (_, active) = send(&app, "GET", &format!("{BASE}?type=evolution&activeOnly=true"), None).await;
    let active = active.as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["name"], json!("evo-1"));

    let (_, loose) = send(&app, "GET", &format!("{BASE}?activeOnly=yes"), None).await;
    assert_eq!(loose.as_array().unwrap().len(), 3);

    let (status, body) = send(
        &app,
        "GET",
        &format!("{BASE}?activeOnly=true&activeOnly=false"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("activeOnly"));

    let (status, current) = send(&app, "GET", &format!("{BASE}/active/evolution"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["name"], json!("evo-1"));

    let (status, _) = send(&app, "GET", &format!("{BASE}/active/telegram"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_rename_rules() {
    let app = app().await;
    let (_, first) = send(&app, "POST", BASE, Some(evolution_principal())).await;
    let (_, second) = send(
        &app,
        "POST",
        BASE,
        Some(json!({ "name": "Backup", "type": "evolution", "credentials": {} })),
    )
    .await;
    let second_uri = format!("{BASE}/{}", second["id"].as_str().unwrap());
    let first_uri = format!("{BASE}/{}", first["id"].as_str().unwrap());

    let (status, body) = send(&app, "PUT", &second_uri, Some(json!({ "name": "Evolution Principal" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    let (status, body) = send(&app, "PUT", &first_uri, Some(json!({ "name": "Evolution Principal" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("Evolution Principal"));

    let (status, body) = send(
        &app,
        "PUT",
        &first_uri,
        Some(json!({ "description": "primary", "credentials": { "apiToken": "rotated" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], json!("primary"));
    assert_eq!(body["credentials"], json!({ "apiToken": "rotated" }));

    let (status, body) = send(&app, "PUT", &first_uri, Some(json!({ "description": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], Value::Null);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("{BASE}/{}", uuid::Uuid::new_v4()),
        Some(json!({ "isActive": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_uuid_ids() {
    let app = app().await;
    let (status, _) = send(&app, "GET", &format!("{BASE}/not-a-uuid"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &format!("{BASE}/not-a-uuid"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_routes_require_admin() {
    let app = app().await;

    let (status, body) = send_as(&app, "GET", BASE, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send_as(&app, "GET", BASE, None, Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let staff = token("staff");
    let (status, _) = send_as(&app, "GET", BASE, None, Some(staff.as_str())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri(BASE)
        .header(header::COOKIE, format!("token={}", token("admin")))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_check() {
    let app = app().await;
    let (status, body) = send_as(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}
