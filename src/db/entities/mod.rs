//! SeaORM entities mapping to database tables.

pub mod integration_credential;

pub mod prelude {
    pub use super::integration_credential::Entity as IntegrationCredential;
    pub use super::integration_credential::Column as IntegrationCredentialColumn;
}
