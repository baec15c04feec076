use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::db::entities::integration_credential;
use crate::db::entities::prelude::{
    IntegrationCredential as CredentialEntity, IntegrationCredentialColumn,
};
use crate::db::models::{
    CredentialPayload, IntegrationCredential, IntegrationCredentialChanges,
    NewIntegrationCredential,
};
use crate::services::encryption_service::{EncryptionError, EncryptionService};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Integration credential not found: {0}")]
    NotFound(Uuid),
    #[error("An integration credential named '{0}' already exists")]
    DuplicateName(String),
}

/// Storage port for integration credentials.
///
/// Implementations only perform keyed storage operations; existence and
/// uniqueness rules live in `IntegrationCredentialService`. Listing methods
/// return newest-created first and leave out rows whose payload cannot be opened.
#[async_trait]
pub trait IntegrationCredentialRepository: Send + Sync {
    async fn create(
        &self,
        data: NewIntegrationCredential,
    ) -> Result<IntegrationCredential, RepositoryError>;

    /// Checks for a row without opening its payload.
    async fn exists(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Id of the record holding `name`, without opening its payload.
    async fn find_id_by_name(&self, name: &str) -> Result<Option<Uuid>, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<IntegrationCredential>, RepositoryError>;

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<IntegrationCredential>, RepositoryError>;

    async fn find_by_type(
        &self,
        integration_type: &str,
        active_only: bool,
    ) -> Result<Vec<IntegrationCredential>, RepositoryError>;

    async fn find_all(&self, active_only: bool) -> Result<Vec<IntegrationCredential>, RepositoryError>;

    /// Fails with `NotFound` if `id` does not exist. Always refreshes `updated_at`.
    async fn update(
        &self,
        id: Uuid,
        changes: IntegrationCredentialChanges,
    ) -> Result<IntegrationCredential, RepositoryError>;

    /// Fails with `NotFound` if `id` does not exist.
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// SeaORM-backed repository. Payloads are stored as AES-GCM sealed JSON.
pub struct SeaOrmIntegrationCredentialRepository {
    db: DatabaseConnection,
    encryption_service: Arc<EncryptionService>,
}

impl SeaOrmIntegrationCredentialRepository {
    pub fn new(db: DatabaseConnection, encryption_service: Arc<EncryptionService>) -> Self {
        Self {
            db,
            encryption_service,
        }
    }

    fn seal(&self, credentials: &CredentialPayload) -> Result<Vec<u8>, RepositoryError> {
        let plain = serde_json::to_vec(credentials)?;
        Ok(self.encryption_service.encrypt(&plain)?)
    }

    fn to_domain(
        &self,
        model: integration_credential::Model,
    ) -> Result<IntegrationCredential, RepositoryError> {
        let plain = self.encryption_service.decrypt(&model.credentials)?;
        let credentials: CredentialPayload = serde_json::from_slice(&plain)?;

        Ok(IntegrationCredential {
            id: model.id,
            name: model.name,
            integration_type: model.integration_type,
            credentials,
            is_active: model.is_active,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    async fn fetch_list(
        &self,
        mut query: Select<CredentialEntity>,
        active_only: bool,
    ) -> Result<Vec<IntegrationCredential>, RepositoryError> {
        if active_only {
            query = query.filter(IntegrationCredentialColumn::IsActive.eq(true));
        }
        let models = query
            .order_by_desc(IntegrationCredentialColumn::CreatedAt)
            .all(&self.db)
            .await?;

        let mut credentials = Vec::with_capacity(models.len());
        for model in models {
            let id = model.id;
            match self.to_domain(model) {
                Ok(credential) => credentials.push(credential),
                Err(e) => warn!(id = %id, error = %e, "Skipping unreadable integration credential."),
            }
        }
        Ok(credentials)
    }
}

/// Maps a unique-constraint violation on write to `DuplicateName`.
fn map_write_error(err: DbErr, name: &str) -> RepositoryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            RepositoryError::DuplicateName(name.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl IntegrationCredentialRepository for SeaOrmIntegrationCredentialRepository {
    async fn create(
        &self,
        data: NewIntegrationCredential,
    ) -> Result<IntegrationCredential, RepositoryError> {
        // Postgres keeps microseconds; truncate so the returned record matches a later read.
        let now = Utc::now().trunc_subsecs(6);
        let sealed = self.seal(&data.credentials)?;

        let new_credential = integration_credential::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(data.name.clone()),
            integration_type: Set(data.integration_type),
            credentials: Set(sealed),
            is_active: Set(data.is_active.unwrap_or(true)),
            description: Set(data.description),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = new_credential
            .insert(&self.db)
            .await
            .map_err(|e| map_write_error(e, &data.name))?;

        self.to_domain(model)
    }

    async fn exists(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let count = CredentialEntity::find_by_id(id).count(&self.db).await?;
        Ok(count > 0)
    }

    async fn find_id_by_name(&self, name: &str) -> Result<Option<Uuid>, RepositoryError> {
        let id = CredentialEntity::find()
            .select_only()
            .column(IntegrationCredentialColumn::Id)
            .filter(IntegrationCredentialColumn::Name.eq(name))
            .into_tuple::<Uuid>()
            .one(&self.db)
            .await?;
        Ok(id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<IntegrationCredential>, RepositoryError> {
        CredentialEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(|m| self.to_domain(m))
            .transpose()
    }

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<IntegrationCredential>, RepositoryError> {
        CredentialEntity::find()
            .filter(IntegrationCredentialColumn::Name.eq(name))
            .one(&self.db)
            .await?
            .map(|m| self.to_domain(m))
            .transpose()
    }

    async fn find_by_type(
        &self,
        integration_type: &str,
        active_only: bool,
    ) -> Result<Vec<IntegrationCredential>, RepositoryError> {
        let query = CredentialEntity::find()
            .filter(IntegrationCredentialColumn::IntegrationType.eq(integration_type));
        self.fetch_list(query, active_only).await
    }

    async fn find_all(&self, active_only: bool) -> Result<Vec<IntegrationCredential>, RepositoryError> {
        self.fetch_list(CredentialEntity::find(), active_only).await
    }

    async fn update(
        &self,
        id: Uuid,
        changes: IntegrationCredentialChanges,
    ) -> Result<IntegrationCredential, RepositoryError> {
        let existing = CredentialEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;

        let target_name = changes.name.clone().unwrap_or_else(|| existing.name.clone());
        let mut active: integration_credential::ActiveModel = existing.into();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(credentials) = changes.credentials.as_ref() {
            active.credentials = Set(self.seal(credentials)?);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        active.updated_at = Set(Utc::now().trunc_subsecs(6));

        let model = active.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => RepositoryError::NotFound(id),
            other => map_write_error(other, &target_name),
        })?;

        self.to_domain(model)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = CredentialEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}
