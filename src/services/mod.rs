pub mod encryption_service;
pub mod integration_credential_service;

pub use integration_credential_service::{
    CredentialFilter, IntegrationCredentialError, IntegrationCredentialService,
};
