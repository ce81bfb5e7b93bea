//! Combo entity - A named bundle of food items sold at one fixed price.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a combo is offered on the menu
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ComboStatus {
    /// Offered on the menu
    #[sea_orm(string_value = "active")]
    Active,
    /// Hidden from the menu
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

/// Combo database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "combos")]
pub struct Model {
    /// Unique identifier for the combo
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown on the menu
    pub name: String,
    /// Short description
    pub description: String,
    /// Price of the whole bundle
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub price: Decimal,
    /// Optional picture
    pub image_url: Option<String>,
    /// Menu visibility
    pub status: ComboStatus,
}

/// Defines relationships between Combo and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One combo is composed of many combo items
    #[sea_orm(has_many = "super::combo_item::Entity")]
    ComboItems,
    /// A combo can appear in many order details
    #[sea_orm(has_many = "super::order_detail::Entity")]
    OrderDetails,
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
