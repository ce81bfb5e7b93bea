//! Food item entity - A single dish or drink that can be ordered on its own
//! or as part of a combo.
//!
//! Food items are soft deleted: `is_deleted` hides them from the menu while
//! historical order details keep pointing at the row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a food item can currently be ordered
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ItemStatus {
    /// Shown on the menu and orderable
    #[sea_orm(string_value = "available")]
    Available,
    /// Temporarily off the menu
    #[sea_orm(string_value = "unavailable")]
    Unavailable,
}

/// Food item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "food_items")]
pub struct Model {
    /// Unique identifier for the food item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown on the menu
    #[sea_orm(indexed)]
    pub name: String,
    /// Short description
    pub description: String,
    /// Current catalog price, always positive
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub price: Decimal,
    /// Picture shown next to the item
    pub image_url: String,
    /// Availability on the menu
    pub status: ItemStatus,
    /// Category this item is listed under
    #[sea_orm(indexed)]
    pub category_id: i64,
    /// Soft delete flag
    pub is_deleted: bool,
}

/// Defines relationships between `FoodItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each food item belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Cascade"
    )]
    Category,
    /// A food item can be part of many combos
    #[sea_orm(has_many = "super::combo_item::Entity")]
    ComboItems,
    /// A food item can appear in many order details
    #[sea_orm(has_many = "super::order_detail::Entity")]
    OrderDetails,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::combo_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ComboItems.def()
    }
}

impl Related<super::order_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
