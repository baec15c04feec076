pub mod integration_credential_repository;

pub use integration_credential_repository::{
    IntegrationCredentialRepository, RepositoryError, SeaOrmIntegrationCredentialRepository,
};
