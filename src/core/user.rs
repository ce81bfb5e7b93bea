//! User profile management for administrators and for users editing their
//! own profile.
//!
//! Accounts and credentials belong to the identity provider; this module keeps
//! the profile data and role set the application needs.

use crate::{
    core::identity::{Requester, Role},
    entities::{
        Cart, CartItem, Order, OrderDetail, User, UserRole, cart, cart_item, order, order_detail,
        user, user_role,
    },
    errors::{Error, FieldErrors, Result, is_unique_violation},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const MAX_FULL_NAME_LEN: usize = 100;
const MAX_ADDRESS_LEN: usize = 250;

/// Profile data for a new user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    /// Identifier from the identity provider; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Login email
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Delivery address
    #[serde(default)]
    pub address: Option<String>,
    /// Date of birth
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    /// Roles to grant; `Customer` when empty
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// Editable profile fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    /// Login email
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Delivery address
    #[serde(default)]
    pub address: Option<String>,
    /// Date of birth
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    /// Replacement role set; roles are left alone when `None`
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

/// Fields a user may change on their own profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    /// Login email
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Delivery address
    #[serde(default)]
    pub address: Option<String>,
    /// Date of birth
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// A profile with its roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithRoles {
    /// Stored profile
    pub user: user::Model,
    /// Granted roles
    pub roles: Vec<Role>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_profile(
    email: &str,
    full_name: &str,
    phone: Option<&str>,
    address: Option<&str>,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let full_name = full_name.trim();
    if full_name.is_empty() {
        errors.push("full_name", "Full name is required");
    } else if full_name.chars().count() > MAX_FULL_NAME_LEN {
        errors.push(
            "full_name",
            format!("Full name must be at most {MAX_FULL_NAME_LEN} characters"),
        );
    }

    let email = email.trim();
    if email.is_empty() {
        errors.push("email", "Email is required");
    } else if !email.contains('@') {
        errors.push("email", "Email address is not valid");
    }

    if let Some(phone) = phone {
        let valid = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-'));
        if !valid {
            errors.push("phone", "Phone number is not valid");
        }
    }

    if address.is_some_and(|a| a.chars().count() > MAX_ADDRESS_LEN) {
        errors.push(
            "address",
            format!("Address must be at most {MAX_ADDRESS_LEN} characters"),
        );
    }
    errors
}

fn email_conflict(err: DbErr, email: &str) -> Error {
    if is_unique_violation(&err) {
        Error::conflict(format!("a user with email {email} already exists"))
    } else {
        err.into()
    }
}

async fn replace_roles<C>(db: &C, user_id: &str, roles: &[Role]) -> Result<()>
where
    C: ConnectionTrait,
{
    UserRole::delete_many()
        .filter(user_role::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    let mut granted: Vec<Role> = Vec::new();
    for role in roles {
        if granted.contains(role) {
            continue;
        }
        user_role::ActiveModel {
            user_id: Set(user_id.to_string()),
            role: Set(*role),
            ..Default::default()
        }
        .insert(db)
        .await?;
        granted.push(*role);
    }
    Ok(())
}

/// Validates and stores a profile without an access check.
///
/// Used by [`create_user`] and by database seeding.
pub(crate) async fn insert_user<C>(db: &C, new_user: NewUser) -> Result<UserWithRoles>
where
    C: TransactionTrait + ConnectionTrait,
{
    let phone = non_blank(new_user.phone);
    let address = non_blank(new_user.address);
    validate_profile(
        &new_user.email,
        &new_user.full_name,
        phone.as_deref(),
        address.as_deref(),
    )
    .into_result()?;

    let email = new_user.email.trim().to_string();
    let id = non_blank(new_user.id).unwrap_or_else(|| Uuid::new_v4().to_string());
    let roles = if new_user.roles.is_empty() {
        vec![Role::Customer]
    } else {
        new_user.roles
    };

    let txn = db.begin().await?;
    let created = user::ActiveModel {
        id: Set(id),
        email: Set(email.clone()),
        full_name: Set(new_user.full_name.trim().to_string()),
        phone: Set(phone),
        address: Set(address),
        date_of_birth: Set(new_user.date_of_birth),
    }
    .insert(&txn)
    .await
    .map_err(|e| email_conflict(e, &email))?;
    replace_roles(&txn, &created.id, &roles).await?;
    txn.commit().await?;

    info!("Created user {} ({}) with roles {:?}", created.id, created.email, roles);
    Ok(UserWithRoles {
        user: created,
        roles: normalize_roles(roles),
    })
}

/// Deduplicated, administrators first.
fn normalize_roles(roles: Vec<Role>) -> Vec<Role> {
    let mut roles = roles.into_iter().fold(Vec::new(), |mut acc, role| {
        if !acc.contains(&role) {
            acc.push(role);
        }
        acc
    });
    roles.sort_by_key(|r| *r != Role::Admin);
    roles
}

/// Creates a user profile. Administrators only.
#[instrument(skip(db, requester, new_user), fields(email = %new_user.email))]
pub async fn create_user(
    db: &DatabaseConnection,
    requester: &Requester,
    new_user: NewUser,
) -> Result<UserWithRoles> {
    requester.require_admin()?;
    insert_user(db, new_user).await
}

/// Roles stored for `user_id`.
pub async fn roles_of<C>(db: &C, user_id: &str) -> Result<Vec<Role>>
where
    C: ConnectionTrait,
{
    let roles = UserRole::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .order_by_asc(user_role::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.role)
        .collect();
    Ok(normalize_roles(roles))
}

/// One profile. Visible to the user themself and to administrators.
#[instrument(skip(db, requester))]
pub async fn get_user(
    db: &DatabaseConnection,
    requester: &Requester,
    user_id: &str,
) -> Result<UserWithRoles> {
    requester.require_owner_or_admin(user_id)?;
    let user = User::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;
    let roles = roles_of(db, user_id).await?;
    Ok(UserWithRoles { user, roles })
}

/// Every profile with its roles, ordered by email.
#[instrument(skip(db, requester))]
pub async fn list_users(
    db: &DatabaseConnection,
    requester: &Requester,
) -> Result<Vec<UserWithRoles>> {
    requester.require_admin()?;
    let users = User::find()
        .order_by_asc(user::Column::Email)
        .all(db)
        .await?;

    let mut roles: HashMap<String, Vec<Role>> = HashMap::new();
    for assignment in UserRole::find()
        .order_by_asc(user_role::Column::Id)
        .all(db)
        .await?
    {
        roles.entry(assignment.user_id).or_default().push(assignment.role);
    }

    Ok(users
        .into_iter()
        .map(|user| {
            let user_roles = roles.remove(&user.id).unwrap_or_default();
            UserWithRoles {
                roles: normalize_roles(user_roles),
                user,
            }
        })
        .collect())
}

/// Edits a non-administrator profile.
#[instrument(skip(db, requester, update))]
pub async fn update_user(
    db: &DatabaseConnection,
    requester: &Requester,
    user_id: &str,
    update: UserUpdate,
) -> Result<UserWithRoles> {
    requester.require_admin()?;

    let phone = non_blank(update.phone);
    let address = non_blank(update.address);
    validate_profile(
        &update.email,
        &update.full_name,
        phone.as_deref(),
        address.as_deref(),
    )
    .into_result()?;

    let txn = db.begin().await?;
    let existing = User::find_by_id(user_id.to_string())
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;
    if roles_of(&txn, user_id).await?.contains(&Role::Admin) {
        warn!(
            "User {} attempted to edit administrator {}",
            requester.user_id, user_id
        );
        return Err(Error::Forbidden {
            reason: "administrator profiles cannot be edited".to_string(),
        });
    }

    let email = update.email.trim().to_string();
    let mut profile: user::ActiveModel = existing.into();
    profile.email = Set(email.clone());
    profile.full_name = Set(update.full_name.trim().to_string());
    profile.phone = Set(phone);
    profile.address = Set(address);
    profile.date_of_birth = Set(update.date_of_birth);
    let updated = profile
        .update(&txn)
        .await
        .map_err(|e| email_conflict(e, &email))?;

    if let Some(roles) = update.roles {
        let roles = if roles.is_empty() {
            vec![Role::Customer]
        } else {
            roles
        };
        replace_roles(&txn, user_id, &roles).await?;
    }
    let roles = roles_of(&txn, user_id).await?;
    txn.commit().await?;

    info!("Updated user {}", user_id);
    Ok(UserWithRoles {
        user: updated,
        roles,
    })
}

/// Edits the requester's own profile. Roles are never changed here.
#[instrument(skip(db, requester, update), fields(user_id = %requester.user_id))]
pub async fn update_own_profile(
    db: &DatabaseConnection,
    requester: &Requester,
    update: ProfileUpdate,
) -> Result<UserWithRoles> {
    let phone = non_blank(update.phone);
    let address = non_blank(update.address);
    validate_profile(
        &update.email,
        &update.full_name,
        phone.as_deref(),
        address.as_deref(),
    )
    .into_result()?;

    let user_id = requester.user_id.as_str();
    let existing = User::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    let email = update.email.trim().to_string();
    let mut profile: user::ActiveModel = existing.into();
    profile.email = Set(email.clone());
    profile.full_name = Set(update.full_name.trim().to_string());
    profile.phone = Set(phone);
    profile.address = Set(address);
    profile.date_of_birth = Set(update.date_of_birth);
    let updated = profile
        .update(db)
        .await
        .map_err(|e| email_conflict(e, &email))?;

    info!("User {} updated their profile", user_id);
    Ok(UserWithRoles {
        user: updated,
        roles: roles_of(db, user_id).await?,
    })
}

/// Deletes a profile together with its cart and order history.
#[instrument(skip(db, requester))]
pub async fn delete_user(
    db: &DatabaseConnection,
    requester: &Requester,
    user_id: &str,
) -> Result<()> {
    requester.require_admin()?;
    if requester.user_id == user_id {
        return Err(Error::conflict("administrators cannot delete their own account"));
    }

    let txn = db.begin().await?;
    User::find_by_id(user_id.to_string())
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    let cart_ids: Vec<i64> = Cart::find()
        .filter(cart::Column::UserId.eq(user_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    CartItem::delete_many()
        .filter(cart_item::Column::CartId.is_in(cart_ids))
        .exec(&txn)
        .await?;
    Cart::delete_many()
        .filter(cart::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    let order_ids: Vec<i64> = Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|o| o.id)
        .collect();
    OrderDetail::delete_many()
        .filter(order_detail::Column::OrderId.is_in(order_ids.clone()))
        .exec(&txn)
        .await?;
    Order::delete_many()
        .filter(order::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    UserRole::delete_many()
        .filter(user_role::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    User::delete_by_id(user_id.to_string()).exec(&txn).await?;
    txn.commit().await?;

    info!(
        "Deleted user {} and {} order(s)",
        user_id,
        order_ids.len()
    );
    Ok(())
}
