//! Cart item entity - One line of a cart.
//!
//! The row stores `food_item_id` and `combo_id` as two nullable columns.
//! Code never reads them directly; use [`Model::source`] which yields a
//! [`LineSource`](crate::core::line_source::LineSource).

use crate::core::line_source::LineSource;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cart item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    /// Unique identifier for the cart item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Cart this line belongs to
    pub cart_id: i64,
    /// Set when the line is a single food item
    pub food_item_id: Option<i64>,
    /// Set when the line is a combo
    pub combo_id: Option<i64>,
    /// Number of units, at least 1
    pub quantity: i32,
    /// Unit price captured when the line was added
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub price: Decimal,
}

impl Model {
    /// What this line refers to.
    #[must_use]
    pub fn source(&self) -> Option<LineSource> {
        LineSource::from_columns(self.food_item_id, self.combo_id)
    }

    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Defines relationships between `CartItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one cart
    #[sea_orm(
        belongs_to = "super::cart::Entity",
        from = "Column::CartId",
        to = "super::cart::Column::Id",
        on_delete = "Cascade"
    )]
    Cart,
    /// Food item referenced by the line, if any
    #[sea_orm(
        belongs_to = "super::food_item::Entity",
        from = "Column::FoodItemId",
        to = "super::food_item::Column::Id"
    )]
    FoodItem,
    /// Combo referenced by the line, if any
    #[sea_orm(
        belongs_to = "super::combo::Entity",
        from = "Column::ComboId",
        to = "super::combo::Column::Id"
    )]
    Combo,
}

impl Related<super::cart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cart.def()
    }
}

impl Related<super::food_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodItem.def()
    }
}

impl Related<super::combo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Combo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
