//! Database configuration module.
//!
//! Handles the `SQLite` connection and schema creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`
//! so the schema always matches the Rust structs. Creation is idempotent, which
//! lets the server call it on every start.

use crate::entities::{
    Cart, CartItem, Category, Combo, ComboItem, FoodItem, Order, OrderDetail, User, UserRole,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::debug;

/// Default location of the database file
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/fastfood.sqlite?mode=rwc";

/// Establishes a connection to the database at `database_url`.
///
/// For file-backed `SQLite` URLs the parent directory is created first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_parent(database_url) {
        std::fs::create_dir_all(parent)?;
    }
    Database::connect(database_url).await.map_err(Into::into)
}

fn sqlite_file_parent(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(builder.build(&index)).await?;
    }

    debug!("Ensured table {}", entity.table_name());
    Ok(())
}

/// Creates every table and index, parents before children.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    // Catalog
    create_table(db, &schema, Category).await?;
    create_table(db, &schema, FoodItem).await?;
    create_table(db, &schema, Combo).await?;
    create_table(db, &schema, ComboItem).await?;

    // Carts and orders
    create_table(db, &schema, Cart).await?;
    create_table(db, &schema, CartItem).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderDetail).await?;

    // Users
    create_table(db, &schema, User).await?;
    create_table(db, &schema, UserRole).await?;

    Ok(())
}
