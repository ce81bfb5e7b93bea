//! User entity - Profile data for an account managed by the identity provider.
//!
//! Credentials are not stored here. Roles live in the `user_roles` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Stable identifier shared with the identity provider
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Login email, unique
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Contact phone number
    pub phone: Option<String>,
    /// Delivery address
    pub address: Option<String>,
    /// Date of birth
    pub date_of_birth: Option<Date>,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user holds many roles
    #[sea_orm(has_many = "super::user_role::Entity")]
    Roles,
}

impl Related<super::user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
