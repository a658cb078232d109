use sea_orm::{ConnectionTrait, DbErr, EntityName, EntityTrait, Schema};
use tracing::info;

use crate::entities::{delivery, item, member, order, order_item};

/// Creates every table from the entity definitions if it does not exist.
///
/// Referenced tables come first so foreign keys resolve on Postgres. The
/// unique index on `member.name` is what closes the check-then-insert race
/// in member registration.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    create_table(db, member::Entity).await?;
    create_table(db, item::Entity).await?;
    create_table(db, delivery::Entity).await?;
    create_table(db, order::Entity).await?;
    create_table(db, order_item::Entity).await?;
    Ok(())
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    info!(table = entity.table_name(), "Ensured table");
    Ok(())
}
