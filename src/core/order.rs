//! Order business logic - Placing orders, checkout and order history.
//!
//! Orders are priced once when they are written: `total_price` is always
//! computed here from the detail lines and never taken from the caller.
//! After creation only the status changes, and only an administrator may
//! change it.

use crate::{
    core::{cart, catalog, identity::Requester, line_source::LineSource},
    entities::{
        Cart, CartItem, Combo, FoodItem, Order, OrderDetail, OrderStatus, cart as cart_entity,
        cart_item, combo, food_item, order, order_detail,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryOrder, Select, Set, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

const MAX_NOTE_LEN: usize = 250;

/// One line of a directly placed order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewOrderLine {
    /// What is ordered
    pub source: LineSource,
    /// Units, at least 1
    pub quantity: i32,
    /// Price per unit, not negative
    pub unit_price: Decimal,
    /// Optional note for the kitchen
    #[serde(default)]
    pub note: Option<String>,
}

/// An order detail with the catalog entry it refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    /// The stored line
    pub detail: order_detail::Model,
    /// Food item, when the line is one (soft-deleted items included)
    pub food_item: Option<food_item::Model>,
    /// Combo, when the line is one
    pub combo: Option<combo::Model>,
}

/// An order with all of its lines resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    /// The order itself
    pub order: order::Model,
    /// Lines in insertion order
    pub lines: Vec<OrderLine>,
}

fn validate_lines(lines: &[NewOrderLine]) -> Result<()> {
    if lines.is_empty() {
        return Err(Error::invalid("an order needs at least one line"));
    }
    for line in lines {
        if line.quantity < 1 {
            return Err(Error::invalid(format!(
                "quantity for {} must be at least 1, got {}",
                line.source, line.quantity
            )));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(Error::invalid(format!(
                "unit price for {} cannot be negative",
                line.source
            )));
        }
        if line
            .note
            .as_deref()
            .is_some_and(|n| n.chars().count() > MAX_NOTE_LEN)
        {
            return Err(Error::invalid(format!(
                "note must be at most {MAX_NOTE_LEN} characters"
            )));
        }
    }
    Ok(())
}

async fn ensure_source_exists(txn: &DatabaseTransaction, source: LineSource) -> Result<()> {
    let exists = match source {
        LineSource::FoodItem(id) => FoodItem::find_by_id(id).one(txn).await?.is_some(),
        LineSource::Combo(id) => Combo::find_by_id(id).one(txn).await?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(match source {
            LineSource::FoodItem(id) => Error::not_found("food item", id),
            LineSource::Combo(id) => Error::not_found("combo", id),
        })
    }
}

/// Writes an order and its lines. Must run inside a transaction.
async fn write_order(
    txn: &DatabaseTransaction,
    user_id: &str,
    lines: &[NewOrderLine],
) -> Result<order::Model> {
    let now = Utc::now();
    let total: Decimal = lines
        .iter()
        .map(|l| l.unit_price * Decimal::from(l.quantity))
        .sum();

    let order = order::ActiveModel {
        user_id: Set(user_id.to_string()),
        order_date: Set(now),
        status: Set(OrderStatus::Pending),
        total_price: Set(total),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    for line in lines {
        let (food_item_id, combo_id) = line.source.to_columns();
        order_detail::ActiveModel {
            order_id: Set(order.id),
            food_item_id: Set(food_item_id),
            combo_id: Set(combo_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            note: Set(line.note.clone()),
            order_date: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(order)
}

/// Creates a pending order from explicit lines.
#[instrument(skip(db, lines), fields(lines = lines.len()))]
pub async fn place_order(
    db: &DatabaseConnection,
    user_id: &str,
    lines: Vec<NewOrderLine>,
) -> Result<order::Model> {
    validate_lines(&lines)?;

    let txn = db.begin().await?;
    for line in &lines {
        ensure_source_exists(&txn, line.source).await?;
    }
    let order = write_order(&txn, user_id, &lines).await?;
    txn.commit().await?;

    info!(
        "Placed order {} for user {} with {} line(s), total {}",
        order.id,
        user_id,
        lines.len(),
        order.total_price
    );
    Ok(order)
}

/// Turns the user's cart into a pending order and empties the cart.
///
/// Everything happens in one transaction. `EmptyCart` when there is nothing
/// to order; no order is written in that case.
#[instrument(skip(db))]
pub async fn checkout(db: &DatabaseConnection, user_id: &str) -> Result<order::Model> {
    let txn = db.begin().await?;

    let user_cart = Cart::find()
        .filter(cart_entity::Column::UserId.eq(user_id))
        .one(&txn)
        .await?;
    let items = match user_cart {
        Some(ref c) => cart::cart_items(&txn, c.id).await?,
        None => Vec::new(),
    };
    let Some(user_cart) = user_cart.filter(|_| !items.is_empty()) else {
        debug!("Checkout requested with an empty cart for user {}", user_id);
        return Err(Error::EmptyCart {
            user_id: user_id.to_string(),
        });
    };

    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        let Some(source) = item.source() else {
            warn!("Cart line {} has no food item or combo", item.id);
            return Err(Error::invalid(format!(
                "cart line {} does not refer to a food item or combo",
                item.id
            )));
        };
        lines.push(NewOrderLine {
            source,
            quantity: item.quantity,
            unit_price: item.price,
            note: None,
        });
    }

    let order = write_order(&txn, user_id, &lines).await?;

    CartItem::delete_many()
        .filter(cart_item::Column::CartId.eq(user_cart.id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    info!(
        "Checked out cart {} into order {} for user {} (total {})",
        user_cart.id, order.id, user_id, order.total_price
    );
    Ok(order)
}

async fn resolve_orders<C>(db: &C, orders: Vec<order::Model>) -> Result<Vec<OrderDetails>>
where
    C: ConnectionTrait,
{
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let details = OrderDetail::find()
        .filter(order_detail::Column::OrderId.is_in(ids))
        .order_by_asc(order_detail::Column::Id)
        .all(db)
        .await?;

    let foods = catalog::food_items_by_id(db, details.iter().filter_map(|d| d.food_item_id)).await?;
    let combos = catalog::combos_by_id(db, details.iter().filter_map(|d| d.combo_id)).await?;

    let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for detail in details {
        let (food_item, combo) = match detail.source() {
            Some(LineSource::FoodItem(id)) => (foods.get(&id).cloned(), None),
            Some(LineSource::Combo(id)) => (None, combos.get(&id).cloned()),
            None => (None, None),
        };
        by_order.entry(detail.order_id).or_default().push(OrderLine {
            detail,
            food_item,
            combo,
        });
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderDetails {
            lines: by_order.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}

fn newest_first(query: Select<Order>) -> Select<Order> {
    query
        .order_by_desc(order::Column::OrderDate)
        .order_by_desc(order::Column::Id)
}

/// One order with its lines. Visible to its owner and to administrators.
#[instrument(skip(db, requester), fields(requester = %requester.user_id))]
pub async fn get_details(
    db: &DatabaseConnection,
    order_id: i64,
    requester: &Requester,
) -> Result<OrderDetails> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?;
    requester.require_owner_or_admin(&order.user_id)?;

    resolve_orders(db, vec![order])
        .await?
        .pop()
        .ok_or_else(|| Error::not_found("order", order_id))
}

/// The user's orders, newest first.
#[instrument(skip(db))]
pub async fn list_mine(db: &DatabaseConnection, user_id: &str) -> Result<Vec<OrderDetails>> {
    let orders = newest_first(Order::find().filter(order::Column::UserId.eq(user_id)))
        .all(db)
        .await?;
    resolve_orders(db, orders).await
}

/// Every order, optionally restricted to one status, newest first.
#[instrument(skip(db, requester), fields(requester = %requester.user_id))]
pub async fn list_all(
    db: &DatabaseConnection,
    requester: &Requester,
    status: Option<OrderStatus>,
) -> Result<Vec<OrderDetails>> {
    requester.require_admin()?;
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    let orders = newest_first(query).all(db).await?;
    resolve_orders(db, orders).await
}

/// Number of orders, optionally restricted to one status.
pub async fn count_orders(
    db: &DatabaseConnection,
    requester: &Requester,
    status: Option<OrderStatus>,
) -> Result<u64> {
    requester.require_admin()?;
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query.count(db).await.map_err(Into::into)
}

/// Overwrites an order's status. Any status may follow any other.
#[instrument(skip(db, requester), fields(requester = %requester.user_id))]
pub async fn update_status(
    db: &DatabaseConnection,
    order_id: i64,
    status: OrderStatus,
    requester: &Requester,
) -> Result<order::Model> {
    requester.require_admin()?;

    let mut order: order::ActiveModel = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?
        .into();
    order.status = Set(status);
    let updated = order.update(db).await?;

    info!("Order {} is now {:?}", updated.id, updated.status);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::ItemStatus;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, Iterable, MockDatabase};

    fn line(source: LineSource, quantity: i32, unit_price: Decimal) -> NewOrderLine {
        NewOrderLine {
            source,
            quantity,
            unit_price,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_place_order_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let empty = place_order(&db, "alice", vec![]).await;
        assert!(matches!(empty, Err(Error::InvalidArgument { .. })));

        let zero = place_order(&db, "alice", vec![line(LineSource::FoodItem(1), 0, dec!(1))]).await;
        assert!(matches!(zero, Err(Error::InvalidArgument { .. })));

        let negative =
            place_order(&db, "alice", vec![line(LineSource::FoodItem(1), 1, dec!(-1))]).await;
        assert!(matches!(negative, Err(Error::InvalidArgument { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_place_order_writes_nothing() -> Result<()> {
        let db = setup_test_db().await?;

        let result = place_order(&db, "alice", vec![]).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        assert_eq!(Order::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_computes_total() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let burger = create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;
        let combo = create_test_combo(&db, "Burger + Coke", dec!(7.50), &[burger.id]).await?;

        let order = place_order(
            &db,
            "alice",
            vec![
                line(LineSource::FoodItem(burger.id), 2, dec!(5.99)),
                NewOrderLine {
                    note: Some("no ice".to_string()),
                    ..line(LineSource::Combo(combo.combo.id), 1, dec!(7.50))
                },
            ],
        )
        .await?;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_price, dec!(19.48));

        let details = get_details(&db, order.id, &Requester::customer("alice")).await?;
        assert_eq!(details.lines.len(), 2);
        let sum: Decimal = details.lines.iter().map(|l| l.detail.calculated_total()).sum();
        assert_eq!(sum, order.total_price);
        assert_eq!(details.lines[1].detail.note.as_deref(), Some("no ice"));
        assert!(details.lines[1].combo.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_unknown_source_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = place_order(&db, "alice", vec![line(LineSource::Combo(9), 1, dec!(1))]).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(Order::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_scenario() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let pizza = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;

        cart::add_item(&db, "alice", LineSource::FoodItem(pizza.id), 1).await?;
        cart::add_item(&db, "alice", LineSource::FoodItem(pizza.id), 1).await?;
        assert_eq!(cart::view_cart(&db, "alice").await?.total, dec!(100));

        let order = checkout(&db, "alice").await?;
        assert_eq!(order.total_price, dec!(100));
        assert_eq!(order.user_id, "alice");

        let details = get_details(&db, order.id, &Requester::customer("alice")).await?;
        assert_eq!(details.lines.len(), 1);
        assert_eq!(details.lines[0].detail.quantity, 2);
        assert_eq!(details.lines[0].detail.unit_price, dec!(50));
        assert_eq!(details.lines[0].food_item.as_ref().map(|f| f.id), Some(pizza.id));

        assert!(cart::view_cart(&db, "alice").await?.items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_creates_no_order() -> Result<()> {
        let (db, category) = setup_with_category().await?;

        // No cart at all
        assert!(matches!(
            checkout(&db, "alice").await,
            Err(Error::EmptyCart { .. })
        ));

        // A cart that has been emptied
        let pizza = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;
        cart::add_item(&db, "alice", LineSource::FoodItem(pizza.id), 1).await?;
        cart::clear(&db, "alice").await?;
        assert!(matches!(
            checkout(&db, "alice").await,
            Err(Error::EmptyCart { .. })
        ));

        assert_eq!(Order::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_history_resolves_soft_deleted_food() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let pizza = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;
        cart::add_item(&db, "alice", LineSource::FoodItem(pizza.id), 1).await?;
        let order = checkout(&db, "alice").await?;

        catalog::delete_food_item(&db, &Requester::admin("admin"), pizza.id).await?;

        let mine = list_mine(&db, "alice").await?;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].order.id, order.id);
        let food = mine[0].lines[0].food_item.as_ref().unwrap();
        assert!(food.is_deleted);
        assert_eq!(food.status, ItemStatus::Available);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_details_access() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let pizza = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;
        let order = place_order(&db, "alice", vec![line(LineSource::FoodItem(pizza.id), 1, dec!(50))])
            .await?;

        assert!(matches!(
            get_details(&db, order.id, &Requester::customer("mallory")).await,
            Err(Error::Forbidden { .. })
        ));
        assert!(get_details(&db, order.id, &Requester::admin("root")).await.is_ok());
        assert!(matches!(
            get_details(&db, order.id + 100, &Requester::customer("alice")).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_requires_admin_for_every_status() -> Result<()> {
        // No query results are configured: the role check must fail first.
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let customer = Requester::customer("alice");

        for status in OrderStatus::iter() {
            assert!(matches!(
                update_status(&db, 1, status, &customer).await,
                Err(Error::Forbidden { .. })
            ));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_listing_and_status_changes() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let admin = Requester::admin("root");
        let pizza = create_test_food_item(&db, "Pizza", dec!(50), category.id).await?;

        let first = place_order(&db, "alice", vec![line(LineSource::FoodItem(pizza.id), 1, dec!(50))])
            .await?;
        let second = place_order(&db, "bob", vec![line(LineSource::FoodItem(pizza.id), 2, dec!(50))])
            .await?;

        let all = list_all(&db, &admin, None).await?;
        assert_eq!(
            all.iter().map(|o| o.order.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        // Transitions are not restricted, even out of Delivered.
        update_status(&db, first.id, OrderStatus::Delivered, &admin).await?;
        let reopened = update_status(&db, first.id, OrderStatus::Preparing, &admin).await?;
        assert_eq!(reopened.status, OrderStatus::Preparing);

        let preparing = list_all(&db, &admin, Some(OrderStatus::Preparing)).await?;
        assert_eq!(preparing.len(), 1);
        assert_eq!(preparing[0].order.id, first.id);
        assert_eq!(count_orders(&db, &admin, None).await?, 2);
        assert_eq!(count_orders(&db, &admin, Some(OrderStatus::Pending)).await?, 1);

        assert!(matches!(
            update_status(&db, 999, OrderStatus::Cancelled, &admin).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            list_all(&db, &Requester::customer("alice"), None).await,
            Err(Error::Forbidden { .. })
        ));
        Ok(())
    }
}
