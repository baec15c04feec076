use serde::{Deserialize, Deserializer};

use crate::db::models::{CredentialPayload, IntegrationCredentialChanges, NewIntegrationCredential};
use crate::services::CredentialFilter;
use crate::web::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntegrationCredentialRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub integration_type: Option<String>,
    pub credentials: Option<CredentialPayload>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

impl CreateIntegrationCredentialRequest {
    /// Requires `name`, `type` and `credentials`; blank strings count as missing.
    pub fn into_new_credential(self) -> Result<NewIntegrationCredential, AppError> {
        let name = self.name.filter(|n| !n.trim().is_empty());
        let integration_type = self.integration_type.filter(|t| !t.trim().is_empty());

        match (name, integration_type, self.credentials) {
            (Some(name), Some(integration_type), Some(credentials)) => {
                Ok(NewIntegrationCredential {
                    name,
                    integration_type,
                    credentials,
                    is_active: self.is_active,
                    description: self.description,
                })
            }
            _ => Err(AppError::InvalidInput(
                "name, type and credentials are required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIntegrationCredentialRequest {
    pub name: Option<String>,
    pub credentials: Option<CredentialPayload>,
    pub is_active: Option<bool>,
    /// Absent leaves the description alone; `null` clears it.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
}

impl From<UpdateIntegrationCredentialRequest> for IntegrationCredentialChanges {
    fn from(req: UpdateIntegrationCredentialRequest) -> Self {
        IntegrationCredentialChanges {
            name: req.name,
            credentials: req.credentials,
            is_active: req.is_active,
            description: req.description,
        }
    }
}

fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIntegrationCredentialsQuery {
    #[serde(rename = "type")]
    pub integration_type: Option<String>,
    pub active_only: Option<String>,
}

impl From<ListIntegrationCredentialsQuery> for CredentialFilter {
    fn from(query: ListIntegrationCredentialsQuery) -> Self {
        CredentialFilter {
            integration_type: query.integration_type.filter(|t| !t.is_empty()),
            // Only the literal string "true" enables the filter.
            active_only: query.active_only.as_deref() == Some("true"),
        }
    }
}
