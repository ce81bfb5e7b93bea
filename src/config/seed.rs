//! Catalog seed loading from a TOML file.
//!
//! The seed describes the starting catalog and the administrator profiles. It
//! is applied section by section: a section is written only when its table is
//! still empty, so restarting the server never duplicates data.

use crate::{
    core::{
        catalog::{self, ComboInput, ComboItemInput, FoodItemInput},
        identity::Role,
        user,
    },
    entities::{Category, Combo, ComboStatus, FoodItem, ItemStatus, User, category, combo, food_item},
    errors::{Error, FieldErrors, Result},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Entire seed file
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
    /// Categories to create
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    /// Food items, each naming its category
    #[serde(default)]
    pub food_items: Vec<FoodItemSeed>,
    /// Combos, each listing food items by name
    #[serde(default)]
    pub combos: Vec<ComboSeed>,
    /// Administrator profiles
    #[serde(default)]
    pub admins: Vec<AdminSeed>,
}

/// One category
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySeed {
    /// Unique category name
    pub name: String,
}

/// One food item
#[derive(Debug, Clone, Deserialize)]
pub struct FoodItemSeed {
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Price, e.g. `"5.99"`
    pub price: Decimal,
    /// Picture URL
    #[serde(default)]
    pub image_url: String,
    /// Name of a category from the same file
    pub category: String,
}

/// One combo
#[derive(Debug, Clone, Deserialize)]
pub struct ComboSeed {
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Bundle price
    pub price: Decimal,
    /// Picture URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Bundled food items
    #[serde(default)]
    pub items: Vec<ComboItemSeed>,
}

/// A food item inside a seeded combo
#[derive(Debug, Clone, Deserialize)]
pub struct ComboItemSeed {
    /// Food item name
    pub food: String,
    /// Quantity in the combo
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// An administrator profile
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    /// Identifier from the identity provider
    #[serde(default)]
    pub id: Option<String>,
    /// Login email
    pub email: String,
    /// Display name
    pub full_name: String,
}

/// Rows written by [`seed_database`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    /// Categories created
    pub categories: usize,
    /// Food items created
    pub food_items: usize,
    /// Combos created
    pub combos: usize,
    /// Administrator profiles created
    pub admins: usize,
}

/// Parses a seed document.
pub fn parse_seed(contents: &str) -> Result<CatalogSeed> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog seed: {e}"),
    })
}

/// Loads a seed file.
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<CatalogSeed> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!(
            "Failed to read seed file {}: {e}",
            path.as_ref().display()
        ),
    })?;
    parse_seed(&contents)
}

/// Loads a seed file, or `None` when it does not exist.
pub fn load_seed_if_present<P: AsRef<Path>>(path: P) -> Result<Option<CatalogSeed>> {
    if path.as_ref().exists() {
        load_seed(path).map(Some)
    } else {
        warn!(
            "Seed file {} not found, skipping seeding",
            path.as_ref().display()
        );
        Ok(None)
    }
}

fn reject_invalid(kind: &str, name: &str, errors: &FieldErrors) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Config {
            message: format!("seeded {kind} '{name}' is invalid: {errors}"),
        })
    }
}

/// Writes every seed section whose table is still empty.
///
/// Food items and combos go through the same validation as the admin
/// operations; the first invalid entry aborts the whole seed.
pub async fn seed_database(db: &DatabaseConnection, seed: &CatalogSeed) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let txn = db.begin().await?;

    if Category::find().count(&txn).await? == 0 {
        for entry in &seed.categories {
            category::ActiveModel {
                name: Set(entry.name.trim().to_string()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            report.categories += 1;
        }
    }

    if FoodItem::find().count(&txn).await? == 0 {
        let categories: HashMap<String, i64> = Category::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect();
        for entry in &seed.food_items {
            let category_id = *categories.get(entry.category.trim()).ok_or_else(|| Error::Config {
                message: format!(
                    "food item '{}' names unknown category '{}'",
                    entry.name, entry.category
                ),
            })?;
            let input = FoodItemInput {
                name: entry.name.trim().to_string(),
                description: entry.description.clone(),
                price: entry.price,
                image_url: entry.image_url.clone(),
                status: ItemStatus::Available,
                category_id,
            };
            reject_invalid("food item", &entry.name, &catalog::validate_food_item(&input))?;
            food_item::ActiveModel {
                name: Set(input.name),
                description: Set(input.description),
                price: Set(input.price),
                image_url: Set(input.image_url),
                status: Set(input.status),
                category_id: Set(input.category_id),
                is_deleted: Set(false),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            report.food_items += 1;
        }
    }

    if Combo::find().count(&txn).await? == 0 {
        for entry in &seed.combos {
            let mut items = Vec::with_capacity(entry.items.len());
            for item in &entry.items {
                let food = FoodItem::find()
                    .filter(food_item::Column::Name.eq(item.food.trim()))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| Error::Config {
                        message: format!(
                            "combo '{}' names unknown food item '{}'",
                            entry.name, item.food
                        ),
                    })?;
                items.push(ComboItemInput {
                    food_item_id: food.id,
                    quantity: item.quantity,
                });
            }
            let input = ComboInput {
                name: entry.name.trim().to_string(),
                description: entry.description.clone(),
                price: entry.price,
                image_url: entry.image_url.clone(),
                status: ComboStatus::Active,
                items,
            };
            reject_invalid("combo", &entry.name, &catalog::validate_combo(&input))?;

            let created = combo::ActiveModel {
                name: Set(input.name.clone()),
                description: Set(input.description.clone()),
                price: Set(input.price),
                image_url: Set(input.image_url.clone()),
                status: Set(input.status),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            catalog::write_combo_items(&txn, created.id, &input.items).await?;
            report.combos += 1;
        }
    }
    txn.commit().await?;

    for admin in &seed.admins {
        let exists = User::find()
            .filter(crate::entities::user::Column::Email.eq(admin.email.trim()))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        user::insert_user(
            db,
            user::NewUser {
                id: admin.id.clone(),
                email: admin.email.clone(),
                full_name: admin.full_name.clone(),
                roles: vec![Role::Admin],
                ..Default::default()
            },
        )
        .await?;
        report.admins += 1;
    }

    info!(
        "Seeded {} categories, {} food items, {} combos, {} admins",
        report.categories, report.food_items, report.combos, report.admins
    );
    Ok(report)
}
