//! Order detail entity - One priced, quantified line of an order.
//!
//! Like cart items, the referenced food item or combo is stored in two
//! nullable columns and read back through [`Model::source`]. Both references
//! are `RESTRICT` so catalog rows that appear in an order cannot be removed.

use crate::core::line_source::LineSource;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order detail database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_details")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order this line belongs to
    #[sea_orm(indexed)]
    pub order_id: i64,
    /// Set when the line is a single food item
    pub food_item_id: Option<i64>,
    /// Set when the line is a combo
    pub combo_id: Option<i64>,
    /// Number of units, at least 1
    pub quantity: i32,
    /// Price per unit at the time of ordering
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub unit_price: Decimal,
    /// Free-form note, at most 250 characters
    pub note: Option<String>,
    /// When the line was recorded
    pub order_date: DateTimeUtc,
}

impl Model {
    /// What this line refers to.
    #[must_use]
    pub fn source(&self) -> Option<LineSource> {
        LineSource::from_columns(self.food_item_id, self.combo_id)
    }

    /// `quantity × unit_price` for this line.
    #[must_use]
    pub fn calculated_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Defines relationships between `OrderDetail` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
    /// Food item referenced by the line, if any
    #[sea_orm(
        belongs_to = "super::food_item::Entity",
        from = "Column::FoodItemId",
        to = "super::food_item::Column::Id",
        on_delete = "Restrict"
    )]
    FoodItem,
    /// Combo referenced by the line, if any
    #[sea_orm(
        belongs_to = "super::combo::Entity",
        from = "Column::ComboId",
        to = "super::combo::Column::Id",
        on_delete = "Restrict"
    )]
    Combo,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
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
