//! Caller identity handed over by the external identity provider.
//!
//! Every service operation that depends on who is calling takes a
//! [`Requester`] argument explicitly.

use crate::errors::{Error, Result};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Capability granted to a user
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    /// Manages the catalog, orders and users
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Orders food
    #[sea_orm(string_value = "customer")]
    Customer,
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            other => Err(Error::invalid(format!("unknown role '{other}'"))),
        }
    }
}

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    /// Stable user identifier
    pub user_id: String,
    /// Roles held by the caller
    pub roles: Vec<Role>,
}

impl Requester {
    /// Creates a requester with the given roles.
    pub fn new(user_id: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        let roles = roles.into_iter().fold(Vec::new(), |mut acc, role| {
            if !acc.contains(&role) {
                acc.push(role);
            }
            acc
        });
        Self {
            user_id: user_id.into(),
            roles,
        }
    }

    /// A caller holding only the customer role.
    pub fn customer(user_id: impl Into<String>) -> Self {
        Self::new(user_id, [Role::Customer])
    }

    /// A caller holding the administrator role.
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, [Role::Admin])
    }

    /// Parses a comma-separated role list such as `"Admin,Customer"`.
    /// Unknown names are skipped.
    pub fn with_role_list(user_id: impl Into<String>, roles: &str) -> Self {
        Self::new(
            user_id,
            roles
                .split(',')
                .filter(|r| !r.trim().is_empty())
                .filter_map(|r| r.parse().ok()),
        )
    }

    /// Whether the caller holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Whether the caller is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// `Forbidden` unless the caller is an administrator.
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden {
                reason: format!("user {} is not an administrator", self.user_id),
            })
        }
    }

    /// `Forbidden` unless the caller owns the resource or is an administrator.
    pub fn require_owner_or_admin(&self, owner_id: &str) -> Result<()> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden {
                reason: format!("user {} does not own this resource", self.user_id),
            })
        }
    }
}
