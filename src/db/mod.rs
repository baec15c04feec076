pub mod entities;
pub mod models;
pub mod repositories;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};
use tracing::debug;

use crate::db::entities::prelude::IntegrationCredential;

/// Creates the `integration_credentials` table and its indexes if they are absent.
///
/// The unique constraint on `name` is created here; it backs the duplicate-name
/// rule when two writers race past the lookup in the service layer.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut create_table = schema.create_table_from_entity(IntegrationCredential);
    create_table.if_not_exists();
    db.execute(backend.build(&create_table)).await?;

    for mut create_index in schema.create_index_from_entity(IntegrationCredential) {
        create_index.if_not_exists();
        db.execute(backend.build(&create_index)).await?;
    }

    debug!("Database schema is ready.");
    Ok(())
}
