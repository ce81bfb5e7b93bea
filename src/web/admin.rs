//! Administration routes: orders, catalog and user profiles.
//!
//! Every handler needs the `Admin` role; the services enforce it.

use crate::{
    core::{
        catalog::{self, ComboInput, ComboWithItems, FoodItemInput, FoodItemWithCategory},
        identity::Requester,
        order::{self, OrderDetails},
        report::{self, DashboardStats},
        user::{self, NewUser, UserUpdate, UserWithRoles},
    },
    entities::{OrderStatus, category, combo, food_item},
    errors::{Error, Result},
    web::AppState,
};
use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Query string of `GET /admin/orders`
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    /// Only orders with this status, e.g. `Pending`
    pub status: Option<OrderStatus>,
}

/// Admin order listing
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    /// Orders, newest first
    pub orders: Vec<OrderDetails>,
    /// Number of orders matching the filter
    pub total_count: u64,
}

/// Form for `POST /admin/orders/{id}/status`
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    /// New status, e.g. `Delivered`
    pub status: OrderStatus,
}

/// Body for creating or renaming a category
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    /// Category name
    pub name: String,
}

/// Admin routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/:id/status", post(update_order_status))
        .route("/admin/categories", get(list_categories).post(create_category))
        .route(
            "/admin/categories/:id",
            put(rename_category).delete(delete_category),
        )
        .route("/admin/food-items", get(list_food_items).post(create_food_item))
        .route(
            "/admin/food-items/:id",
            put(update_food_item).delete(delete_food_item),
        )
        .route("/admin/food-items/:id/purge", delete(purge_food_item))
        .route("/admin/combos", get(list_combos).post(create_combo))
        .route(
            "/admin/combos/:id",
            get(combo_details).put(update_combo).delete(delete_combo),
        )
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/:id",
            get(user_details).put(update_user).delete(delete_user),
        )
}

// Dashboard

#[instrument(skip(state, requester), fields(admin = %requester.user_id))]
async fn dashboard(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<DashboardStats>> {
    report::dashboard_stats(state.db(), &requester).await.map(Json)
}

// Orders

#[instrument(skip(state, requester), fields(admin = %requester.user_id))]
async fn list_orders(
    State(state): State<AppState>,
    requester: Requester,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrdersResponse>> {
    let orders = order::list_all(state.db(), &requester, query.status).await?;
    let total_count = order::count_orders(state.db(), &requester, query.status).await?;
    Ok(Json(OrdersResponse {
        orders,
        total_count,
    }))
}

#[instrument(skip(state, requester), fields(admin = %requester.user_id))]
async fn update_order_status(
    State(state): State<AppState>,
    requester: Requester,
    Path(order_id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    order::update_status(state.db(), order_id, form.status, &requester).await?;
    Ok(Redirect::to("/admin/orders"))
}

// Categories

async fn list_categories(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<Vec<category::Model>>> {
    requester.require_admin()?;
    catalog::list_categories(state.db()).await.map(Json)
}

async fn create_category(
    State(state): State<AppState>,
    requester: Requester,
    Json(request): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<category::Model>)> {
    let created = catalog::create_category(state.db(), &requester, &request.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn rename_category(
    State(state): State<AppState>,
    requester: Requester,
    Path(category_id): Path<i64>,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<category::Model>> {
    catalog::rename_category(state.db(), &requester, category_id, &request.name)
        .await
        .map(Json)
}

async fn delete_category(
    State(state): State<AppState>,
    requester: Requester,
    Path(category_id): Path<i64>,
) -> Result<StatusCode> {
    catalog::delete_category(state.db(), &requester, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Food items

async fn list_food_items(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<Vec<FoodItemWithCategory>>> {
    catalog::list_food_items_admin(state.db(), &requester)
        .await
        .map(Json)
}

async fn create_food_item(
    State(state): State<AppState>,
    requester: Requester,
    Json(input): Json<FoodItemInput>,
) -> Result<(StatusCode, Json<food_item::Model>)> {
    let created = catalog::create_food_item(state.db(), &requester, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_food_item(
    State(state): State<AppState>,
    requester: Requester,
    Path(food_item_id): Path<i64>,
    Json(input): Json<FoodItemInput>,
) -> Result<Json<food_item::Model>> {
    catalog::update_food_item(state.db(), &requester, food_item_id, input)
        .await
        .map(Json)
}

async fn delete_food_item(
    State(state): State<AppState>,
    requester: Requester,
    Path(food_item_id): Path<i64>,
) -> Result<StatusCode> {
    catalog::delete_food_item(state.db(), &requester, food_item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn purge_food_item(
    State(state): State<AppState>,
    requester: Requester,
    Path(food_item_id): Path<i64>,
) -> Result<StatusCode> {
    catalog::purge_food_item(state.db(), &requester, food_item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Combos

async fn list_combos(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<Vec<combo::Model>>> {
    catalog::list_combos_admin(state.db(), &requester)
        .await
        .map(Json)
}

async fn combo_details(
    State(state): State<AppState>,
    requester: Requester,
    Path(combo_id): Path<i64>,
) -> Result<Json<ComboWithItems>> {
    requester.require_admin()?;
    catalog::combo_with_items(state.db(), combo_id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("combo", combo_id))
}

async fn create_combo(
    State(state): State<AppState>,
    requester: Requester,
    Json(input): Json<ComboInput>,
) -> Result<(StatusCode, Json<ComboWithItems>)> {
    let created = catalog::create_combo(state.db(), &requester, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_combo(
    State(state): State<AppState>,
    requester: Requester,
    Path(combo_id): Path<i64>,
    Json(input): Json<ComboInput>,
) -> Result<Json<ComboWithItems>> {
    catalog::update_combo(state.db(), &requester, combo_id, input)
        .await
        .map(Json)
}

async fn delete_combo(
    State(state): State<AppState>,
    requester: Requester,
    Path(combo_id): Path<i64>,
) -> Result<StatusCode> {
    catalog::delete_combo(state.db(), &requester, combo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Users

async fn list_users(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<Vec<UserWithRoles>>> {
    user::list_users(state.db(), &requester).await.map(Json)
}

async fn create_user(
    State(state): State<AppState>,
    requester: Requester,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<UserWithRoles>)> {
    let created = user::create_user(state.db(), &requester, new_user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn user_details(
    State(state): State<AppState>,
    requester: Requester,
    Path(user_id): Path<String>,
) -> Result<Json<UserWithRoles>> {
    requester.require_admin()?;
    user::get_user(state.db(), &requester, &user_id)
        .await
        .map(Json)
}

async fn update_user(
    State(state): State<AppState>,
    requester: Requester,
    Path(user_id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserWithRoles>> {
    user::update_user(state.db(), &requester, &user_id, update)
        .await
        .map(Json)
}

async fn delete_user(
    State(state): State<AppState>,
    requester: Requester,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    user::delete_user(state.db(), &requester, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
