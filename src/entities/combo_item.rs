//! Combo item entity - Junction between a combo and the food items it bundles.
//!
//! The composite key `(combo_id, food_item_id)` keeps a food item from
//! appearing twice in the same combo.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Combo item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "combo_items")]
pub struct Model {
    /// Combo this entry belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub combo_id: i64,
    /// Food item included in the combo
    #[sea_orm(primary_key, auto_increment = false)]
    pub food_item_id: i64,
    /// How many of the food item the combo contains (1..=100)
    pub quantity: i32,
}

/// Defines relationships between `ComboItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one combo
    #[sea_orm(
        belongs_to = "super::combo::Entity",
        from = "Column::ComboId",
        to = "super::combo::Column::Id",
        on_delete = "Cascade"
    )]
    Combo,
    /// Each entry references one food item
    #[sea_orm(
        belongs_to = "super::food_item::Entity",
        from = "Column::FoodItemId",
        to = "super::food_item::Column::Id"
    )]
    FoodItem,
}

impl Related<super::combo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Combo.def()
    }
}

impl Related<super::food_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
