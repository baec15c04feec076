use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::{
    IntegrationCredential, IntegrationCredentialChanges, NewIntegrationCredential,
};
use crate::db::repositories::{IntegrationCredentialRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum IntegrationCredentialError {
    #[error("Integration credential not found: {0}")]
    NotFound(String),
    #[error("No active integration credential found for type '{0}'")]
    NoActiveCredential(String),
    #[error("An integration credential named '{0}' already exists")]
    DuplicateName(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl IntegrationCredentialError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NoActiveCredential(_))
    }
}

impl From<RepositoryError> for IntegrationCredentialError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound(id.to_string()),
            RepositoryError::DuplicateName(name) => Self::DuplicateName(name),
            other => Self::Repository(other),
        }
    }
}

/// Optional filters for listing credentials.
#[derive(Debug, Clone, Default)]
pub struct CredentialFilter {
    pub integration_type: Option<String>,
    pub active_only: bool,
}

/// Business rules for integration credentials on top of the repository port.
pub struct IntegrationCredentialService {
    repository: Arc<dyn IntegrationCredentialRepository>,
}

impl IntegrationCredentialService {
    pub fn new(repository: Arc<dyn IntegrationCredentialRepository>) -> Self {
        Self { repository }
    }

    /// Creates a credential, rejecting a name that is already taken.
    pub async fn create(
        &self,
        data: NewIntegrationCredential,
    ) -> Result<IntegrationCredential, IntegrationCredentialError> {
        if data.name.trim().is_empty() {
            return Err(IntegrationCredentialError::InvalidInput(
                "name must not be empty".to_string(),
            ));
        }
        if data.integration_type.trim().is_empty() {
            return Err(IntegrationCredentialError::InvalidInput(
                "type must not be empty".to_string(),
            ));
        }

        // Fast path only. The unique index on `name` settles concurrent creates.
        if self.repository.find_id_by_name(&data.name).await?.is_some() {
            return Err(IntegrationCredentialError::DuplicateName(data.name));
        }

        let created = self.repository.create(data).await?;
        info!(
            id = %created.id,
            name = %created.name,
            integration_type = %created.integration_type,
            "Integration credential created."
        );
        Ok(created)
    }

    pub async fn get_by_id(
        &self,
        id: Uuid,
    ) -> Result<IntegrationCredential, IntegrationCredentialError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| IntegrationCredentialError::NotFound(id.to_string()))
    }

    /// Lists credentials, newest first. An empty list is not an error.
    pub async fn list(
        &self,
        filter: CredentialFilter,
    ) -> Result<Vec<IntegrationCredential>, IntegrationCredentialError> {
        let credentials = match filter.integration_type.as_deref() {
            Some(integration_type) => {
                self.repository
                    .find_by_type(integration_type, filter.active_only)
                    .await?
            }
            None => self.repository.find_all(filter.active_only).await?,
        };
        Ok(credentials)
    }

    /// The most recently created active credential of `integration_type`.
    ///
    /// This is the lookup integrations use to obtain their current secrets.
    pub async fn get_active_by_type(
        &self,
        integration_type: &str,
    ) -> Result<IntegrationCredential, IntegrationCredentialError> {
        self.repository
            .find_by_type(integration_type, true)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                IntegrationCredentialError::NoActiveCredential(integration_type.to_string())
            })
    }

    /// Applies a partial update. Renaming onto another record's name is rejected.
    pub async fn update(
        &self,
        id: Uuid,
        changes: IntegrationCredentialChanges,
    ) -> Result<IntegrationCredential, IntegrationCredentialError> {
        if !self.repository.exists(id).await? {
            return Err(IntegrationCredentialError::NotFound(id.to_string()));
        }

        if let Some(name) = changes.name.as_deref() {
            if name.trim().is_empty() {
                return Err(IntegrationCredentialError::InvalidInput(
                    "name must not be empty".to_string(),
                ));
            }
            if let Some(holder) = self.repository.find_id_by_name(name).await? {
                if holder != id {
                    return Err(IntegrationCredentialError::DuplicateName(name.to_string()));
                }
            }
        }

        let updated = self.repository.update(id, changes).await?;
        info!(id = %updated.id, name = %updated.name, "Integration credential updated.");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), IntegrationCredentialError> {
        if !self.repository.exists(id).await? {
            return Err(IntegrationCredentialError::NotFound(id.to_string()));
        }

        self.repository.delete(id).await.map_err(|e| {
            warn!(id = %id, error = %e, "Failed to delete integration credential.");
            IntegrationCredentialError::from(e)
        })?;
        info!(id = %id, "Integration credential deleted.");
        Ok(())
    }
}
