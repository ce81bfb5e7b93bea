//! Catalog business logic - Menu queries and catalog administration.
//!
//! Read queries are filtered projections: soft-deleted food items never
//! appear, unavailable food items and inactive combos are hidden from the
//! menu. Administrative operations require the `Admin` role and apply the
//! delete rules explicitly: removing a category removes its food items, while
//! a food item or combo that appears in an order can never be removed.

use crate::{
    core::identity::Requester,
    entities::{
        CartItem, Category, Combo, ComboItem, ComboStatus, FoodItem, ItemStatus, OrderDetail,
        cart_item, category, combo, combo_item, food_item, order_detail,
    },
    errors::{Error, FieldErrors, Result, is_unique_violation},
};
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 250;
const MAX_COMBO_ITEM_QUANTITY: i32 = 100;

/// Menu filter for [`list_available_food_items`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodFilter {
    /// Substring of the name (case-insensitive for ASCII)
    pub name_contains: Option<String>,
    /// Restrict to one category
    pub category_id: Option<i64>,
    /// Inclusive lower price bound
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound
    pub max_price: Option<Decimal>,
}

/// One food item inside a combo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComboEntry {
    /// The bundled food item
    pub food_item: food_item::Model,
    /// How many of it the combo contains
    pub quantity: i32,
}

/// A combo together with its composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComboWithItems {
    /// The combo itself
    pub combo: combo::Model,
    /// Bundled food items, ordered by name
    pub items: Vec<ComboEntry>,
}

/// Admin listing row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoodItemWithCategory {
    /// The food item
    pub item: food_item::Model,
    /// Name of its category
    pub category_name: Option<String>,
}

/// Fields accepted when creating or editing a food item
#[derive(Debug, Clone, Deserialize)]
pub struct FoodItemInput {
    /// Name, required, at most 100 characters
    pub name: String,
    /// Description, at most 250 characters
    #[serde(default)]
    pub description: String,
    /// Price, strictly positive
    pub price: Decimal,
    /// Picture URL
    #[serde(default)]
    pub image_url: String,
    /// Availability
    #[serde(default = "default_item_status")]
    pub status: ItemStatus,
    /// Category the item is listed under
    pub category_id: i64,
}

const fn default_item_status() -> ItemStatus {
    ItemStatus::Available
}

/// One selected food item in a combo form
#[derive(Debug, Clone, Deserialize)]
pub struct ComboItemInput {
    /// Food item to include
    pub food_item_id: i64,
    /// Quantity in the combo; entries with quantity 0 are ignored
    pub quantity: i32,
}

/// Fields accepted when creating or editing a combo
#[derive(Debug, Clone, Deserialize)]
pub struct ComboInput {
    /// Name, required, at most 100 characters
    pub name: String,
    /// Description, at most 250 characters
    #[serde(default)]
    pub description: String,
    /// Price of the bundle, strictly positive
    pub price: Decimal,
    /// Optional picture URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Menu visibility
    #[serde(default = "default_combo_status")]
    pub status: ComboStatus,
    /// Composition
    #[serde(default)]
    pub items: Vec<ComboItemInput>,
}

const fn default_combo_status() -> ComboStatus {
    ComboStatus::Active
}

// ---------------------------------------------------------------------------
// Read model
// ---------------------------------------------------------------------------

/// Finds a food item by id, ignoring soft-deleted items.
pub async fn find_food_item<C>(db: &C, food_item_id: i64) -> Result<Option<food_item::Model>>
where
    C: ConnectionTrait,
{
    FoodItem::find_by_id(food_item_id)
        .filter(food_item::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a combo by id regardless of its status.
pub async fn find_combo<C>(db: &C, combo_id: i64) -> Result<Option<combo::Model>>
where
    C: ConnectionTrait,
{
    Combo::find_by_id(combo_id).one(db).await.map_err(Into::into)
}

/// Finds a combo by id only if it is active.
pub async fn find_active_combo<C>(db: &C, combo_id: i64) -> Result<Option<combo::Model>>
where
    C: ConnectionTrait,
{
    Combo::find_by_id(combo_id)
        .filter(combo::Column::Status.eq(ComboStatus::Active))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists orderable food items matching `filter`, ordered by name.
#[instrument(skip(db))]
pub async fn list_available_food_items(
    db: &DatabaseConnection,
    filter: &FoodFilter,
) -> Result<Vec<food_item::Model>> {
    let mut query = FoodItem::find()
        .filter(food_item::Column::IsDeleted.eq(false))
        .filter(food_item::Column::Status.eq(ItemStatus::Available));

    if let Some(needle) = filter.name_contains.as_deref().map(str::trim) {
        if !needle.is_empty() {
            query = query.filter(food_item::Column::Name.contains(needle));
        }
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(food_item::Column::CategoryId.eq(category_id));
    }
    if let Some(min) = filter.min_price {
        query = query.filter(food_item::Column::Price.gte(min));
    }
    if let Some(max) = filter.max_price {
        query = query.filter(food_item::Column::Price.lte(max));
    }

    let items = query
        .order_by_asc(food_item::Column::Name)
        .order_by_asc(food_item::Column::Id)
        .all(db)
        .await?;
    debug!("Menu query returned {} food items", items.len());
    Ok(items)
}

/// Lists active combos with their composition, ordered by name.
#[instrument(skip(db))]
pub async fn list_active_combos(db: &DatabaseConnection) -> Result<Vec<ComboWithItems>> {
    let combos = Combo::find()
        .filter(combo::Column::Status.eq(ComboStatus::Active))
        .order_by_asc(combo::Column::Name)
        .all(db)
        .await?;
    attach_combo_items(db, combos).await
}

/// Loads one combo (any status) with its composition.
pub async fn combo_with_items<C>(db: &C, combo_id: i64) -> Result<Option<ComboWithItems>>
where
    C: ConnectionTrait,
{
    let Some(combo) = find_combo(db, combo_id).await? else {
        return Ok(None);
    };
    Ok(attach_combo_items(db, vec![combo]).await?.pop())
}

/// Lists all categories ordered by name.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads food items by id, soft-deleted ones included.
pub(crate) async fn food_items_by_id<C>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, food_item::Model>>
where
    C: ConnectionTrait,
{
    let ids: HashSet<i64> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(FoodItem::find()
        .filter(food_item::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|f| (f.id, f))
        .collect())
}

/// Loads combos by id regardless of status.
pub(crate) async fn combos_by_id<C>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, combo::Model>>
where
    C: ConnectionTrait,
{
    let ids: HashSet<i64> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(Combo::find()
        .filter(combo::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect())
}

async fn attach_combo_items<C>(db: &C, combos: Vec<combo::Model>) -> Result<Vec<ComboWithItems>>
where
    C: ConnectionTrait,
{
    let ids: Vec<i64> = combos.iter().map(|c| c.id).collect();
    let rows = ComboItem::find()
        .filter(combo_item::Column::ComboId.is_in(ids))
        .find_also_related(FoodItem)
        .all(db)
        .await?;

    let mut by_combo: HashMap<i64, Vec<ComboEntry>> = HashMap::new();
    for (entry, food) in rows {
        if let Some(food_item) = food {
            by_combo.entry(entry.combo_id).or_default().push(ComboEntry {
                food_item,
                quantity: entry.quantity,
            });
        }
    }

    Ok(combos
        .into_iter()
        .map(|combo| {
            let mut items = by_combo.remove(&combo.id).unwrap_or_default();
            items.sort_by(|a, b| a.food_item.name.cmp(&b.food_item.name));
            ComboWithItems { combo, items }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

fn validate_name(errors: &mut FieldErrors, field: &str, name: &str) {
    if name.trim().is_empty() {
        errors.push(field, "Name is required");
    } else if name.trim().chars().count() > MAX_NAME_LEN {
        errors.push(field, format!("Name must be at most {MAX_NAME_LEN} characters"));
    }
}

/// Creates a category with a unique name.
#[instrument(skip(db, requester))]
pub async fn create_category(
    db: &DatabaseConnection,
    requester: &Requester,
    name: &str,
) -> Result<category::Model> {
    requester.require_admin()?;
    let mut errors = FieldErrors::new();
    validate_name(&mut errors, "name", name);
    errors.into_result()?;

    let model = category::ActiveModel {
        name: Set(name.trim().to_string()),
        ..Default::default()
    };
    let created = model.insert(db).await.map_err(|e| {
        if is_unique_violation(&e) {
            Error::conflict(format!("a category named '{}' already exists", name.trim()))
        } else {
            e.into()
        }
    })?;
    info!("Created category '{}' (ID: {})", created.name, created.id);
    Ok(created)
}

/// Renames a category.
#[instrument(skip(db, requester))]
pub async fn rename_category(
    db: &DatabaseConnection,
    requester: &Requester,
    category_id: i64,
    name: &str,
) -> Result<category::Model> {
    requester.require_admin()?;
    let mut errors = FieldErrors::new();
    validate_name(&mut errors, "name", name);
    errors.into_result()?;

    let mut category: category::ActiveModel = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("category", category_id))?
        .into();
    category.name = Set(name.trim().to_string());

    category.update(db).await.map_err(|e| {
        if is_unique_violation(&e) {
            Error::conflict(format!("a category named '{}' already exists", name.trim()))
        } else {
            e.into()
        }
    })
}

/// Deletes a category together with its food items.
///
/// Rejected with `Conflict` when any of those food items appears in an order,
/// directly or through an ordered combo. Combo entries and cart lines pointing
/// at the removed food items are removed as well.
#[instrument(skip(db, requester))]
pub async fn delete_category(
    db: &DatabaseConnection,
    requester: &Requester,
    category_id: i64,
) -> Result<()> {
    requester.require_admin()?;
    let txn = db.begin().await?;

    Category::find_by_id(category_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("category", category_id))?;

    let food_ids: Vec<i64> = FoodItem::find()
        .filter(food_item::Column::CategoryId.eq(category_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|f| f.id)
        .collect();

    ensure_not_ordered(&txn, &food_ids, &format!("category {category_id}")).await?;
    remove_food_items(&txn, &food_ids).await?;
    Category::delete_by_id(category_id).exec(&txn).await?;
    txn.commit().await?;

    info!(
        "Deleted category {} and {} food item(s)",
        category_id,
        food_ids.len()
    );
    Ok(())
}

/// Fails with `Conflict` when an order line points at one of `food_ids`, or at
/// a combo containing one of them. Removing those combo entries would change
/// what the historical order resolves to.
async fn ensure_not_ordered(
    txn: &DatabaseTransaction,
    food_ids: &[i64],
    subject: &str,
) -> Result<()> {
    if food_ids.is_empty() {
        return Ok(());
    }

    let direct = OrderDetail::find()
        .filter(order_detail::Column::FoodItemId.is_in(food_ids.to_vec()))
        .count(txn)
        .await?;
    if direct > 0 {
        return Err(Error::conflict(format!(
            "{subject} is referenced by {direct} order line(s)"
        )));
    }

    let combo_ids: HashSet<i64> = ComboItem::find()
        .filter(combo_item::Column::FoodItemId.is_in(food_ids.to_vec()))
        .all(txn)
        .await?
        .into_iter()
        .map(|entry| entry.combo_id)
        .collect();
    if combo_ids.is_empty() {
        return Ok(());
    }
    let via_combo = OrderDetail::find()
        .filter(order_detail::Column::ComboId.is_in(combo_ids))
        .count(txn)
        .await?;
    if via_combo > 0 {
        return Err(Error::conflict(format!(
            "{subject} is part of a combo referenced by {via_combo} order line(s)"
        )));
    }
    Ok(())
}

async fn remove_food_items(txn: &DatabaseTransaction, food_ids: &[i64]) -> Result<()> {
    if food_ids.is_empty() {
        return Ok(());
    }
    CartItem::delete_many()
        .filter(cart_item::Column::FoodItemId.is_in(food_ids.to_vec()))
        .exec(txn)
        .await?;
    ComboItem::delete_many()
        .filter(combo_item::Column::FoodItemId.is_in(food_ids.to_vec()))
        .exec(txn)
        .await?;
    FoodItem::delete_many()
        .filter(food_item::Column::Id.is_in(food_ids.to_vec()))
        .exec(txn)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Food items
// ---------------------------------------------------------------------------

pub(crate) fn validate_food_item(input: &FoodItemInput) -> FieldErrors {
    let mut errors = FieldErrors::new();
    validate_name(&mut errors, "name", &input.name);
    if input.description.chars().count() > MAX_DESCRIPTION_LEN {
        errors.push(
            "description",
            format!("Description must be at most {MAX_DESCRIPTION_LEN} characters"),
        );
    }
    if input.price <= Decimal::ZERO {
        errors.push("price", "Price must be greater than zero");
    }
    errors
}

async fn ensure_category_exists<C>(db: &C, category_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| Error::not_found("category", category_id))
}

/// Adds a food item to the catalog.
#[instrument(skip(db, requester, input), fields(name = %input.name))]
pub async fn create_food_item(
    db: &DatabaseConnection,
    requester: &Requester,
    input: FoodItemInput,
) -> Result<food_item::Model> {
    requester.require_admin()?;
    validate_food_item(&input).into_result()?;
    ensure_category_exists(db, input.category_id).await?;

    let model = food_item::ActiveModel {
        name: Set(input.name.trim().to_string()),
        description: Set(input.description),
        price: Set(input.price),
        image_url: Set(input.image_url),
        status: Set(input.status),
        category_id: Set(input.category_id),
        is_deleted: Set(false),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(
        "Added food item '{}' (ID: {}) priced {} in category {}",
        created.name, created.id, created.price, created.category_id
    );
    Ok(created)
}

/// Edits a food item. Cart lines keep the price they were added with.
#[instrument(skip(db, requester, input))]
pub async fn update_food_item(
    db: &DatabaseConnection,
    requester: &Requester,
    food_item_id: i64,
    input: FoodItemInput,
) -> Result<food_item::Model> {
    requester.require_admin()?;
    validate_food_item(&input).into_result()?;

    let mut item: food_item::ActiveModel = find_food_item(db, food_item_id)
        .await?
        .ok_or_else(|| Error::not_found("food item", food_item_id))?
        .into();
    ensure_category_exists(db, input.category_id).await?;

    item.name = Set(input.name.trim().to_string());
    item.description = Set(input.description);
    item.price = Set(input.price);
    item.image_url = Set(input.image_url);
    item.status = Set(input.status);
    item.category_id = Set(input.category_id);

    let updated = item.update(db).await?;
    info!("Updated food item {}", updated.id);
    Ok(updated)
}

/// Soft deletes a food item: hidden from the menu, kept for order history.
#[instrument(skip(db, requester))]
pub async fn delete_food_item(
    db: &DatabaseConnection,
    requester: &Requester,
    food_item_id: i64,
) -> Result<food_item::Model> {
    requester.require_admin()?;
    let mut item: food_item::ActiveModel = find_food_item(db, food_item_id)
        .await?
        .ok_or_else(|| Error::not_found("food item", food_item_id))?
        .into();
    item.is_deleted = Set(true);
    let deleted = item.update(db).await?;
    info!("Soft deleted food item {}", food_item_id);
    Ok(deleted)
}

/// Physically removes a food item that no order refers to.
///
/// Also removes it from combos and carts. Works on soft-deleted items too.
#[instrument(skip(db, requester))]
pub async fn purge_food_item(
    db: &DatabaseConnection,
    requester: &Requester,
    food_item_id: i64,
) -> Result<()> {
    requester.require_admin()?;
    let txn = db.begin().await?;

    FoodItem::find_by_id(food_item_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("food item", food_item_id))?;

    let subject = format!("food item {food_item_id}");
    ensure_not_ordered(&txn, &[food_item_id], &subject).await?;
    remove_food_items(&txn, &[food_item_id]).await?;
    txn.commit().await?;
    info!("Purged food item {}", food_item_id);
    Ok(())
}

/// Lists every food item that is not soft deleted, with its category name.
#[instrument(skip(db, requester))]
pub async fn list_food_items_admin(
    db: &DatabaseConnection,
    requester: &Requester,
) -> Result<Vec<FoodItemWithCategory>> {
    requester.require_admin()?;
    let rows = FoodItem::find()
        .filter(food_item::Column::IsDeleted.eq(false))
        .order_by_asc(food_item::Column::Name)
        .find_also_related(Category)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(item, category)| FoodItemWithCategory {
            item,
            category_name: category.map(|c| c.name),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Combos
// ---------------------------------------------------------------------------

pub(crate) fn validate_combo(input: &ComboInput) -> FieldErrors {
    let mut errors = FieldErrors::new();
    validate_name(&mut errors, "name", &input.name);
    if input.description.chars().count() > MAX_DESCRIPTION_LEN {
        errors.push(
            "description",
            format!("Description must be at most {MAX_DESCRIPTION_LEN} characters"),
        );
    }
    if input.price <= Decimal::ZERO {
        errors.push("price", "Price must be greater than zero");
    }

    let mut seen = HashSet::new();
    for entry in &input.items {
        if entry.quantity < 0 || entry.quantity > MAX_COMBO_ITEM_QUANTITY {
            errors.push(
                "items",
                format!(
                    "Quantity for food item {} must be between 1 and {MAX_COMBO_ITEM_QUANTITY}",
                    entry.food_item_id
                ),
            );
        }
        if entry.quantity > 0 && !seen.insert(entry.food_item_id) {
            errors.push(
                "items",
                format!("Food item {} is listed more than once", entry.food_item_id),
            );
        }
    }
    errors
}

pub(crate) async fn write_combo_items(
    txn: &DatabaseTransaction,
    combo_id: i64,
    items: &[ComboItemInput],
) -> Result<()> {
    for entry in items.iter().filter(|e| e.quantity > 0) {
        if find_food_item(txn, entry.food_item_id).await?.is_none() {
            let mut errors = FieldErrors::new();
            errors.push(
                "items",
                format!("Food item {} does not exist", entry.food_item_id),
            );
            return Err(Error::Validation(errors));
        }
        combo_item::ActiveModel {
            combo_id: Set(combo_id),
            food_item_id: Set(entry.food_item_id),
            quantity: Set(entry.quantity),
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

/// Creates a combo and its composition in one transaction.
#[instrument(skip(db, requester, input), fields(name = %input.name))]
pub async fn create_combo(
    db: &DatabaseConnection,
    requester: &Requester,
    input: ComboInput,
) -> Result<ComboWithItems> {
    requester.require_admin()?;
    validate_combo(&input).into_result()?;

    let txn = db.begin().await?;
    let combo = combo::ActiveModel {
        name: Set(input.name.trim().to_string()),
        description: Set(input.description.clone()),
        price: Set(input.price),
        image_url: Set(input.image_url.clone()),
        status: Set(input.status),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    write_combo_items(&txn, combo.id, &input.items).await?;
    let created = combo_with_items(&txn, combo.id)
        .await?
        .ok_or_else(|| Error::not_found("combo", combo.id))?;
    txn.commit().await?;

    info!(
        "Created combo '{}' (ID: {}) with {} item(s)",
        created.combo.name,
        created.combo.id,
        created.items.len()
    );
    Ok(created)
}

/// Replaces a combo's fields and composition.
#[instrument(skip(db, requester, input))]
pub async fn update_combo(
    db: &DatabaseConnection,
    requester: &Requester,
    combo_id: i64,
    input: ComboInput,
) -> Result<ComboWithItems> {
    requester.require_admin()?;
    validate_combo(&input).into_result()?;

    let txn = db.begin().await?;
    let mut combo: combo::ActiveModel = find_combo(&txn, combo_id)
        .await?
        .ok_or_else(|| Error::not_found("combo", combo_id))?
        .into();
    combo.name = Set(input.name.trim().to_string());
    combo.description = Set(input.description.clone());
    combo.price = Set(input.price);
    combo.image_url = Set(input.image_url.clone());
    combo.status = Set(input.status);
    combo.update(&txn).await?;

    ComboItem::delete_many()
        .filter(combo_item::Column::ComboId.eq(combo_id))
        .exec(&txn)
        .await?;
    write_combo_items(&txn, combo_id, &input.items).await?;

    let updated = combo_with_items(&txn, combo_id)
        .await?
        .ok_or_else(|| Error::not_found("combo", combo_id))?;
    txn.commit().await?;
    info!("Updated combo {}", combo_id);
    Ok(updated)
}

/// Deletes a combo that no order refers to, along with cart lines for it.
#[instrument(skip(db, requester))]
pub async fn delete_combo(
    db: &DatabaseConnection,
    requester: &Requester,
    combo_id: i64,
) -> Result<()> {
    requester.require_admin()?;
    let txn = db.begin().await?;

    find_combo(&txn, combo_id)
        .await?
        .ok_or_else(|| Error::not_found("combo", combo_id))?;

    let referenced = OrderDetail::find()
        .filter(order_detail::Column::ComboId.eq(combo_id))
        .count(&txn)
        .await?;
    if referenced > 0 {
        return Err(Error::conflict(format!(
            "combo {combo_id} appears in {referenced} order line(s)"
        )));
    }

    CartItem::delete_many()
        .filter(cart_item::Column::ComboId.eq(combo_id))
        .exec(&txn)
        .await?;
    ComboItem::delete_many()
        .filter(combo_item::Column::ComboId.eq(combo_id))
        .exec(&txn)
        .await?;
    Combo::delete_by_id(combo_id).exec(&txn).await?;
    txn.commit().await?;

    info!("Deleted combo {}", combo_id);
    Ok(())
}

/// Lists every combo regardless of status, ordered by name.
pub async fn list_combos_admin(
    db: &DatabaseConnection,
    requester: &Requester,
) -> Result<Vec<combo::Model>> {
    requester.require_admin()?;
    Combo::find()
        .order_by_asc(combo::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{cart, line_source::LineSource, order};
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_food_item_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let admin = Requester::admin("admin");

        let result = create_food_item(
            &db,
            &admin,
            FoodItemInput {
                name: "  ".to_string(),
                description: "x".repeat(251),
                price: dec!(0),
                image_url: String::new(),
                status: ItemStatus::Available,
                category_id: 1,
            },
        )
        .await;

        match result {
            Err(Error::Validation(errors)) => {
                assert!(errors.has("name"));
                assert!(errors.has("description"));
                assert!(errors.has("price"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_operations_require_admin() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let customer = Requester::customer("bob");

        assert!(matches!(
            create_category(&db, &customer, "Burger").await,
            Err(Error::Forbidden { .. })
        ));
        assert!(matches!(
            delete_food_item(&db, &customer, 1).await,
            Err(Error::Forbidden { .. })
        ));
        assert!(matches!(
            delete_combo(&db, &customer, 1).await,
            Err(Error::Forbidden { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_category_names_are_unique() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = Requester::admin("admin");

        create_category(&db, &admin, "Burger").await?;
        let duplicate = create_category(&db, &admin, " Burger ").await;
        assert!(matches!(duplicate, Err(Error::Conflict { .. })));

        let drinks = create_category(&db, &admin, "Drinks").await?;
        let renamed = rename_category(&db, &admin, drinks.id, "Drink").await?;
        assert_eq!(renamed.name, "Drink");
        assert!(matches!(
            rename_category(&db, &admin, drinks.id, "Burger").await,
            Err(Error::Conflict { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_menu_excludes_deleted_and_unavailable() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let admin = Requester::admin("admin");

        let burger = create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;
        let coke = create_test_food_item(&db, "Coke", dec!(1.99), category.id).await?;
        let fries = create_test_food_item(&db, "Fries", dec!(2.49), category.id).await?;

        delete_food_item(&db, &admin, coke.id).await?;
        update_food_item(
            &db,
            &admin,
            fries.id,
            FoodItemInput {
                name: "Fries".to_string(),
                description: String::new(),
                price: dec!(2.49),
                image_url: String::new(),
                status: ItemStatus::Unavailable,
                category_id: category.id,
            },
        )
        .await?;

        let menu = list_available_food_items(&db, &FoodFilter::default()).await?;
        assert_eq!(menu, vec![burger.clone()]);

        // Soft-deleted rows are still reachable by primary key for history.
        assert!(find_food_item(&db, coke.id).await?.is_none());
        assert!(FoodItem::find_by_id(coke.id).one(&db).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_menu_filters() -> Result<()> {
        let (db, burgers) = setup_with_category().await?;
        let admin = Requester::admin("admin");
        let drinks = create_category(&db, &admin, "Drinks").await?;

        create_test_food_item(&db, "Classic Burger", dec!(5.99), burgers.id).await?;
        create_test_food_item(&db, "Cheese Burger", dec!(6.99), burgers.id).await?;
        let coke = create_test_food_item(&db, "Coke", dec!(1.99), drinks.id).await?;

        let by_name = list_available_food_items(
            &db,
            &FoodFilter {
                name_contains: Some("burger".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_name.len(), 2);
        assert_eq!(by_name[0].name, "Cheese Burger");

        let by_category = list_available_food_items(
            &db,
            &FoodFilter {
                category_id: Some(drinks.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_category, vec![coke]);

        let by_price = list_available_food_items(
            &db,
            &FoodFilter {
                min_price: Some(dec!(2)),
                max_price: Some(dec!(6.50)),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_price.len(), 1);
        assert_eq!(by_price[0].name, "Classic Burger");
        Ok(())
    }

    #[tokio::test]
    async fn test_combo_composition_and_menu() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let admin = Requester::admin("admin");
        let burger = create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;
        let coke = create_test_food_item(&db, "Coke", dec!(1.99), category.id).await?;

        let created = create_test_combo(&db, "Burger + Coke", dec!(7.50), &[burger.id, coke.id])
            .await?;
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[0].food_item.name, "Classic Burger");

        let mut inactive_input = combo_input("Hidden", dec!(3), &[coke.id]);
        inactive_input.status = ComboStatus::Inactive;
        let hidden = create_combo(&db, &admin, inactive_input).await?;

        let menu = list_active_combos(&db).await?;
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].combo.id, created.combo.id);
        assert!(find_active_combo(&db, hidden.combo.id).await?.is_none());
        assert!(find_combo(&db, hidden.combo.id).await?.is_some());

        let updated = update_combo(
            &db,
            &admin,
            created.combo.id,
            combo_input("Burger Meal", dec!(7.00), &[burger.id]),
        )
        .await?;
        assert_eq!(updated.combo.name, "Burger Meal");
        assert_eq!(updated.items.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_combo_rejects_duplicates_and_missing_food() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let admin = Requester::admin("admin");
        let burger = create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;

        let duplicate = create_combo(
            &db,
            &admin,
            combo_input("Double", dec!(9), &[burger.id, burger.id]),
        )
        .await;
        assert!(matches!(duplicate, Err(Error::Validation(ref e)) if e.has("items")));

        let missing = create_combo(&db, &admin, combo_input("Ghost", dec!(9), &[999])).await;
        assert!(matches!(missing, Err(Error::Validation(ref e)) if e.has("items")));
        assert!(list_combos_admin(&db, &admin).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_category_cascades_to_food_items() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let admin = Requester::admin("admin");
        let burger = create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;
        cart::add_item(&db, "alice", LineSource::FoodItem(burger.id), 1).await?;

        delete_category(&db, &admin, category.id).await?;

        assert!(FoodItem::find_by_id(burger.id).one(&db).await?.is_none());
        assert!(list_categories(&db).await?.is_empty());
        assert!(cart::view_cart(&db, "alice").await?.items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_ordered_items_cannot_be_removed() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let admin = Requester::admin("admin");
        let burger = create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;
        let combo = create_test_combo(&db, "Solo", dec!(5), &[burger.id]).await?;

        cart::add_item(&db, "alice", LineSource::FoodItem(burger.id), 1).await?;
        cart::add_item(&db, "alice", LineSource::Combo(combo.combo.id), 1).await?;
        order::checkout(&db, "alice").await?;

        assert!(matches!(
            delete_category(&db, &admin, category.id).await,
            Err(Error::Conflict { .. })
        ));
        assert!(matches!(
            purge_food_item(&db, &admin, burger.id).await,
            Err(Error::Conflict { .. })
        ));
        assert!(matches!(
            delete_combo(&db, &admin, combo.combo.id).await,
            Err(Error::Conflict { .. })
        ));

        // Soft delete stays possible.
        let deleted = delete_food_item(&db, &admin, burger.id).await?;
        assert!(deleted.is_deleted);
        Ok(())
    }

    #[tokio::test]
    async fn test_food_in_ordered_combo_cannot_be_removed() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let admin = Requester::admin("admin");
        let burger = create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;
        let combo = create_test_combo(&db, "Solo", dec!(5), &[burger.id]).await?;

        cart::add_item(&db, "alice", LineSource::Combo(combo.combo.id), 1).await?;
        order::checkout(&db, "alice").await?;

        assert!(matches!(
            purge_food_item(&db, &admin, burger.id).await,
            Err(Error::Conflict { .. })
        ));
        assert!(matches!(
            delete_category(&db, &admin, category.id).await,
            Err(Error::Conflict { .. })
        ));

        // The ordered combo still resolves to its original composition.
        let kept = combo_with_items(&db, combo.combo.id).await?.unwrap();
        assert_eq!(kept.items.len(), 1);
        assert_eq!(kept.items[0].food_item.id, burger.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_purge_and_delete_unreferenced() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let admin = Requester::admin("admin");
        let burger = create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;
        let combo = create_test_combo(&db, "Solo", dec!(5), &[burger.id]).await?;
        cart::add_item(&db, "alice", LineSource::Combo(combo.combo.id), 1).await?;

        delete_combo(&db, &admin, combo.combo.id).await?;
        assert!(find_combo(&db, combo.combo.id).await?.is_none());
        assert!(cart::view_cart(&db, "alice").await?.items.is_empty());

        purge_food_item(&db, &admin, burger.id).await?;
        assert!(FoodItem::find_by_id(burger.id).one(&db).await?.is_none());
        assert!(matches!(
            purge_food_item(&db, &admin, burger.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_food_items_admin_includes_category_name() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let admin = Requester::admin("admin");
        create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;

        let rows = list_food_items_admin(&db, &admin).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category_name.as_deref(), Some(category.name.as_str()));

        let missing_category = create_food_item(
            &db,
            &admin,
            FoodItemInput {
                name: "Orphan".to_string(),
                description: String::new(),
                price: dec!(1),
                image_url: String::new(),
                status: ItemStatus::Available,
                category_id: 999,
            },
        )
        .await;
        assert!(matches!(missing_category, Err(Error::NotFound { .. })));
        Ok(())
    }
}
