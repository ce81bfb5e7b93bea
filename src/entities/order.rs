//! Order entity - An immutable, priced record of what a user ordered.
//!
//! Only `status` changes after creation. `total_price` always equals the sum
//! of `quantity × unit_price` over the order's details.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Progress of an order. Any status may follow any other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderStatus {
    /// Just placed
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted by the restaurant
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// In the kitchen
    #[sea_orm(string_value = "preparing")]
    Preparing,
    /// On its way
    #[sea_orm(string_value = "delivering")]
    Delivering,
    /// Handed over to the customer
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Cancelled by the customer or the restaurant
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner, as reported by the identity provider
    #[sea_orm(indexed)]
    pub user_id: String,
    /// When the order was placed
    pub order_date: DateTimeUtc,
    /// Current status
    pub status: OrderStatus,
    /// Sum of all detail lines
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_price: Decimal,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many detail lines
    #[sea_orm(has_many = "super::order_detail::Entity")]
    OrderDetails,
}

impl Related<super::order_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
