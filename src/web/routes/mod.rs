pub mod integration_credential_routes;
