//! Dashboard reporting.
//!
//! Plain counts over the store, returned as structured data for the admin
//! dashboard to render.

use crate::{
    core::identity::Requester,
    entities::{Combo, FoodItem, Order, User, food_item},
    errors::Result,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;

/// Headline numbers for the admin dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Stored user profiles
    pub users: u64,
    /// Food items that are not soft deleted
    pub food_items: u64,
    /// Combos of any status
    pub combos: u64,
    /// Orders of any status
    pub orders: u64,
}

/// Counts users, live food items, combos and orders. Administrators only.
#[instrument(skip(db, requester))]
pub async fn dashboard_stats(
    db: &DatabaseConnection,
    requester: &Requester,
) -> Result<DashboardStats> {
    requester.require_admin()?;

    Ok(DashboardStats {
        users: User::find().count(db).await?,
        food_items: FoodItem::find()
            .filter(food_item::Column::IsDeleted.eq(false))
            .count(db)
            .await?,
        combos: Combo::find().count(db).await?,
        orders: Order::find().count(db).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{cart, catalog, line_source::LineSource, order, user};
    use crate::errors::Error;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_dashboard_counts_skip_deleted_food() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let admin = test_admin();

        let burger = create_test_food_item(&db, "Classic Burger", dec!(5.99), category.id).await?;
        let retired = create_test_food_item(&db, "Old Burger", dec!(4.99), category.id).await?;
        catalog::delete_food_item(&db, &admin, retired.id).await?;
        create_test_combo(&db, "Solo", dec!(5), &[burger.id]).await?;

        user::create_user(
            &db,
            &admin,
            user::NewUser {
                email: "bob@example.com".to_string(),
                full_name: "Bob".to_string(),
                ..Default::default()
            },
        )
        .await?;
        cart::add_item(&db, "bob", LineSource::FoodItem(burger.id), 1).await?;
        order::checkout(&db, "bob").await?;

        let stats = dashboard_stats(&db, &admin).await?;
        assert_eq!(
            stats,
            DashboardStats {
                users: 1,
                food_items: 1,
                combos: 1,
                orders: 1,
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_dashboard_requires_admin() -> Result<()> {
        let db = setup_test_db().await?;
        let result = dashboard_stats(&db, &Requester::customer("alice")).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        Ok(())
    }
}
