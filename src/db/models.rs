use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque key/value secrets for one integration, e.g. `{"apiToken": "..."}`.
pub type CredentialPayload = serde_json::Map<String, serde_json::Value>;

/// A named third-party integration credential with its payload decrypted.
/// Corresponds to the `integration_credentials` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationCredential {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub integration_type: String,
    pub credentials: CredentialPayload,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a credential. `is_active` defaults to true when `None`.
#[derive(Debug, Clone)]
pub struct NewIntegrationCredential {
    pub name: String,
    pub integration_type: String,
    pub credentials: CredentialPayload,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

/// Partial update. `None` leaves a field untouched; `description: Some(None)` clears it.
/// The integration type is fixed at creation and has no field here.
#[derive(Debug, Clone, Default)]
pub struct IntegrationCredentialChanges {
    pub name: Option<String>,
    pub credentials: Option<CredentialPayload>,
    pub is_active: Option<bool>,
    pub description: Option<Option<String>>,
}
