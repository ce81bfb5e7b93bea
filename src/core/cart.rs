//! Cart business logic - Per-user pending selection of food items and combos.
//!
//! A cart is created lazily on the first add. Line prices are captured when a
//! line is created and never follow later catalog price changes.

use crate::{
    core::{catalog, line_source::LineSource},
    entities::{Cart, CartItem, ItemStatus, cart, cart_item, combo, food_item},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::OnConflict};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Outcome of [`update_quantity`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// The line now has the requested quantity
    Updated(cart_item::Model),
    /// The quantity was zero or less, so the line was deleted
    Removed,
    /// No such line in the user's cart; nothing changed
    Missing,
}

/// A cart line with the catalog entry it refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    /// The stored line
    pub item: cart_item::Model,
    /// Food item, when the line is one
    pub food_item: Option<food_item::Model>,
    /// Combo, when the line is one
    pub combo: Option<combo::Model>,
    /// `price × quantity`
    pub line_total: Decimal,
}

/// Everything the cart page shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    /// Cart id, `None` until the user adds something
    pub cart_id: Option<i64>,
    /// Lines in insertion order
    pub items: Vec<CartLine>,
    /// Sum of all line totals
    pub total: Decimal,
}

async fn find_cart<C>(db: &C, user_id: &str) -> Result<Option<cart::Model>>
where
    C: ConnectionTrait,
{
    Cart::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the user's cart, creating an empty one if needed.
///
/// Safe against concurrent first calls: the insert is ignored when another
/// caller already created the row, and the row is then read back.
pub async fn get_or_create_cart<C>(db: &C, user_id: &str) -> Result<cart::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_cart(db, user_id).await? {
        return Ok(existing);
    }

    let new_cart = cart::ActiveModel {
        user_id: Set(user_id.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let inserted = Cart::insert(new_cart)
        .on_conflict(
            OnConflict::column(cart::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    if inserted > 0 {
        debug!("Created cart for user {}", user_id);
    }

    find_cart(db, user_id)
        .await?
        .ok_or_else(|| Error::conflict(format!("cart for user {user_id} could not be created")))
}

/// Current catalog price for `source`, or `NotFound` when it cannot be ordered.
async fn orderable_price<C>(db: &C, source: LineSource) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    match source {
        LineSource::FoodItem(id) => catalog::find_food_item(db, id)
            .await?
            .filter(|f| f.status == ItemStatus::Available)
            .map(|f| f.price)
            .ok_or_else(|| Error::not_found("food item", id)),
        LineSource::Combo(id) => catalog::find_active_combo(db, id)
            .await?
            .map(|c| c.price)
            .ok_or_else(|| Error::not_found("combo", id)),
    }
}

/// Adds `quantity` units of `source` to the user's cart.
///
/// A food item already in the cart has its quantity increased and keeps its
/// original price. Every combo add creates a new line.
#[instrument(skip(db))]
pub async fn add_item(
    db: &DatabaseConnection,
    user_id: &str,
    source: LineSource,
    quantity: i32,
) -> Result<cart_item::Model> {
    if quantity < 1 {
        return Err(Error::invalid(format!(
            "quantity must be at least 1, got {quantity}"
        )));
    }

    let txn = db.begin().await?;
    let price = orderable_price(&txn, source).await?;
    let cart = get_or_create_cart(&txn, user_id).await?;

    if let LineSource::FoodItem(food_item_id) = source {
        let existing = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::FoodItemId.eq(food_item_id))
            .one(&txn)
            .await?;
        if let Some(existing) = existing {
            let new_quantity = existing.quantity.checked_add(quantity).ok_or_else(|| {
                Error::invalid(format!(
                    "quantity of cart line {} would overflow",
                    existing.id
                ))
            })?;
            let mut line: cart_item::ActiveModel = existing.into();
            line.quantity = Set(new_quantity);
            let updated = line.update(&txn).await?;
            txn.commit().await?;
            debug!(
                "Merged {} into cart line {} (quantity {})",
                source, updated.id, updated.quantity
            );
            return Ok(updated);
        }
    }

    let (food_item_id, combo_id) = source.to_columns();
    let created = cart_item::ActiveModel {
        cart_id: Set(cart.id),
        food_item_id: Set(food_item_id),
        combo_id: Set(combo_id),
        quantity: Set(quantity),
        price: Set(price),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(
        "Added {} x{} at {} to cart {} (user {})",
        source, quantity, price, cart.id, user_id
    );
    Ok(created)
}

async fn find_owned_item<C>(db: &C, user_id: &str, item_id: i64) -> Result<Option<cart_item::Model>>
where
    C: ConnectionTrait,
{
    CartItem::find_by_id(item_id)
        .inner_join(Cart)
        .filter(cart::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Sets a line's quantity, deleting the line when `quantity <= 0`.
///
/// Only lines in `user_id`'s cart are considered.
#[instrument(skip(db))]
pub async fn update_quantity(
    db: &DatabaseConnection,
    user_id: &str,
    item_id: i64,
    quantity: i32,
) -> Result<QuantityUpdate> {
    let txn = db.begin().await?;
    let Some(item) = find_owned_item(&txn, user_id, item_id).await? else {
        debug!("Cart line {} not found for user {}", item_id, user_id);
        return Ok(QuantityUpdate::Missing);
    };

    let outcome = if quantity <= 0 {
        CartItem::delete_by_id(item.id).exec(&txn).await?;
        QuantityUpdate::Removed
    } else {
        let mut line: cart_item::ActiveModel = item.into();
        line.quantity = Set(quantity);
        QuantityUpdate::Updated(line.update(&txn).await?)
    };
    txn.commit().await?;
    Ok(outcome)
}

/// Deletes one line from the user's cart. Returns whether a line was removed.
#[instrument(skip(db))]
pub async fn remove_item(db: &DatabaseConnection, user_id: &str, item_id: i64) -> Result<bool> {
    let txn = db.begin().await?;
    let removed = match find_owned_item(&txn, user_id, item_id).await? {
        Some(item) => CartItem::delete_by_id(item.id).exec(&txn).await?.rows_affected > 0,
        None => false,
    };
    txn.commit().await?;
    Ok(removed)
}

/// Empties the user's cart and returns how many lines were deleted.
#[instrument(skip(db))]
pub async fn clear(db: &DatabaseConnection, user_id: &str) -> Result<u64> {
    let txn = db.begin().await?;
    let Some(cart) = find_cart(&txn, user_id).await? else {
        return Ok(0);
    };
    let removed = CartItem::delete_many()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .exec(&txn)
        .await?
        .rows_affected;
    txn.commit().await?;
    info!("Cleared {} line(s) from cart {}", removed, cart.id);
    Ok(removed)
}

/// Sum of `price × quantity`, zero for no items.
#[must_use]
pub fn compute_total(items: &[cart_item::Model]) -> Decimal {
    items.iter().map(cart_item::Model::line_total).sum()
}

/// Lines of a cart in insertion order.
pub(crate) async fn cart_items<C>(db: &C, cart_id: i64) -> Result<Vec<cart_item::Model>>
where
    C: ConnectionTrait,
{
    CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .order_by_asc(cart_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The user's cart with every line resolved and the total.
///
/// Does not create a cart.
#[instrument(skip(db))]
pub async fn view_cart(db: &DatabaseConnection, user_id: &str) -> Result<CartView> {
    let Some(cart) = find_cart(db, user_id).await? else {
        return Ok(CartView {
            cart_id: None,
            items: Vec::new(),
            total: Decimal::ZERO,
        });
    };

    let items = cart_items(db, cart.id).await?;
    let total = compute_total(&items);
    let foods = catalog::food_items_by_id(db, items.iter().filter_map(|i| i.food_item_id)).await?;
    let combos = catalog::combos_by_id(db, items.iter().filter_map(|i| i.combo_id)).await?;

    let lines = items
        .into_iter()
        .map(|item| {
            let (food_item, combo) = match item.source() {
                Some(LineSource::FoodItem(id)) => (foods.get(&id).cloned(), None),
                Some(LineSource::Combo(id)) => (None, combos.get(&id).cloned()),
                None => (None, None),
            };
            CartLine {
                line_total: item.line_total(),
                item,
                food_item,
                combo,
            }
        })
        .collect();

    Ok(CartView {
        cart_id: Some(cart.id),
        items: lines,
        total,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::catalog::{FoodItemInput, update_food_item};
    use crate::core::identity::Requester;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    #[tokio::test]
    async fn test_add_item_rejects_non_positive_quantity() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = add_item(&db, "alice", LineSource::FoodItem(1), 0).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create_yields_one_cart() -> Result<()> {
        let db = setup_test_db().await?;

        let (first, second) = tokio::join!(
            get_or_create_cart(&db, "alice"),
            get_or_create_cart(&db, "alice")
        );
        assert_eq!(first?.id, second?.id);
        assert_eq!(Cart::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_adding_same_food_twice_merges_lines() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let food = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;

        add_item(&db, "alice", LineSource::FoodItem(food.id), 1).await?;
        add_item(&db, "alice", LineSource::FoodItem(food.id), 1).await?;

        let view = view_cart(&db, "alice").await?;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].item.quantity, 2);
        assert_eq!(view.total, dec!(100));
        assert_eq!(view.items[0].food_item.as_ref().map(|f| f.id), Some(food.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_line_price_survives_catalog_change() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let food = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;

        add_item(&db, "alice", LineSource::FoodItem(food.id), 1).await?;
        update_food_item(
            &db,
            &Requester::admin("admin"),
            food.id,
            FoodItemInput {
                name: "Pizza".to_string(),
                description: String::new(),
                price: dec!(60),
                image_url: String::new(),
                status: ItemStatus::Available,
                category_id: category.id,
            },
        )
        .await?;
        let merged = add_item(&db, "alice", LineSource::FoodItem(food.id), 1).await?;

        assert_eq!(merged.quantity, 2);
        assert_eq!(merged.price, dec!(50));
        Ok(())
    }

    #[tokio::test]
    async fn test_merge_overflow_is_rejected() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let food = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;

        add_item(&db, "alice", LineSource::FoodItem(food.id), i32::MAX).await?;
        let result = add_item(&db, "alice", LineSource::FoodItem(food.id), 1).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));

        let view = view_cart(&db, "alice").await?;
        assert_eq!(view.items[0].item.quantity, i32::MAX);
        Ok(())
    }

    #[tokio::test]
    async fn test_combos_always_append() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let burger = create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;
        let combo = create_test_combo(&db, "Burger Meal", dec!(7.50), &[burger.id]).await?;

        add_item(&db, "alice", LineSource::Combo(combo.combo.id), 1).await?;
        add_item(&db, "alice", LineSource::Combo(combo.combo.id), 2).await?;

        let view = view_cart(&db, "alice").await?;
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.total, dec!(22.50));
        assert!(view.items.iter().all(|l| l.combo.is_some()));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_unknown_or_hidden_source_is_not_found() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let food = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;
        catalog::delete_food_item(&db, &Requester::admin("admin"), food.id).await?;

        let deleted = add_item(&db, "alice", LineSource::FoodItem(food.id), 1).await;
        assert!(matches!(deleted, Err(Error::NotFound { .. })));

        let missing = add_item(&db, "alice", LineSource::Combo(42), 1).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        // A failed add must not leave an empty cart behind.
        assert_eq!(Cart::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_quantity_outcomes() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let food = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;
        let line = add_item(&db, "alice", LineSource::FoodItem(food.id), 1).await?;

        match update_quantity(&db, "alice", line.id, 5).await? {
            QuantityUpdate::Updated(updated) => assert_eq!(updated.quantity, 5),
            other => panic!("expected update, got {other:?}"),
        }

        // Other users cannot touch the line.
        assert_eq!(
            update_quantity(&db, "mallory", line.id, 1).await?,
            QuantityUpdate::Missing
        );

        assert_eq!(
            update_quantity(&db, "alice", line.id, 0).await?,
            QuantityUpdate::Removed
        );
        assert!(CartItem::find_by_id(line.id).one(&db).await?.is_none());
        assert_eq!(
            update_quantity(&db, "alice", line.id, 3).await?,
            QuantityUpdate::Missing
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_and_clear() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let pizza = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;
        let coke = create_test_food_item(&db, "Coke", dec!(1.99), category.id).await?;

        let line = add_item(&db, "alice", LineSource::FoodItem(pizza.id), 1).await?;
        add_item(&db, "alice", LineSource::FoodItem(coke.id), 3).await?;

        assert!(!remove_item(&db, "mallory", line.id).await?);
        assert!(remove_item(&db, "alice", line.id).await?);
        assert!(!remove_item(&db, "alice", line.id).await?);

        assert_eq!(clear(&db, "alice").await?, 1);
        let view = view_cart(&db, "alice").await?;
        assert!(view.items.is_empty());
        assert_eq!(view.total, Decimal::ZERO);
        assert!(view.cart_id.is_some());

        assert_eq!(clear(&db, "nobody").await?, 0);
        Ok(())
    }

    #[test]
    fn test_compute_total() {
        assert_eq!(compute_total(&[]), Decimal::ZERO);

        let line = |id, quantity, price| cart_item::Model {
            id,
            cart_id: 1,
            food_item_id: Some(id),
            combo_id: None,
            quantity,
            price,
        };
        let items = vec![line(1, 2, dec!(50)), line(2, 3, dec!(1.99))];
        assert_eq!(compute_total(&items), dec!(105.97));
    }
}
