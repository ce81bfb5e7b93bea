//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating catalog entities with sensible defaults.

use crate::{
    core::{
        catalog::{self, ComboInput, ComboItemInput, ComboWithItems, FoodItemInput},
        identity::Requester,
    },
    entities::{ComboStatus, ItemStatus, category, food_item},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// The administrator used by fixtures.
pub fn test_admin() -> Requester {
    Requester::admin("test_admin")
}

/// Creates an available food item.
///
/// # Defaults
/// * `description`: empty
/// * `image_url`: empty
pub async fn create_test_food_item(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
    category_id: i64,
) -> Result<food_item::Model> {
    catalog::create_food_item(
        db,
        &test_admin(),
        FoodItemInput {
            name: name.to_string(),
            description: String::new(),
            price,
            image_url: String::new(),
            status: ItemStatus::Available,
            category_id,
        },
    )
    .await
}

/// Builds an active combo form with one unit of each food item.
pub fn combo_input(name: &str, price: Decimal, food_item_ids: &[i64]) -> ComboInput {
    ComboInput {
        name: name.to_string(),
        description: String::new(),
        price,
        image_url: None,
        status: ComboStatus::Active,
        items: food_item_ids
            .iter()
            .map(|&food_item_id| ComboItemInput {
                food_item_id,
                quantity: 1,
            })
            .collect(),
    }
}

/// Creates an active combo with one unit of each food item.
pub async fn create_test_combo(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
    food_item_ids: &[i64],
) -> Result<ComboWithItems> {
    catalog::create_combo(db, &test_admin(), combo_input(name, price, food_item_ids)).await
}

/// Sets up a complete test environment with one category.
/// Returns (db, category) for catalog and cart tests.
pub async fn setup_with_category() -> Result<(DatabaseConnection, category::Model)> {
    init_test_tracing();
    let db = setup_test_db().await?;
    let category = catalog::create_category(&db, &test_admin(), "Burger").await?;
    Ok((db, category))
}
