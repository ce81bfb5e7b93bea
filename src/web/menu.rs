//! Public menu: food items and combos customers can order.

use crate::{
    core::catalog::{self, ComboWithItems, FoodFilter},
    entities::{category, food_item},
    errors::{Error, Result},
    web::AppState,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Query string of `GET /menu/foods`
#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery {
    /// Name substring
    pub search: Option<String>,
    /// Category id
    pub category_id: Option<i64>,
    /// Inclusive lower price bound
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound
    pub max_price: Option<Decimal>,
}

impl From<MenuQuery> for FoodFilter {
    fn from(query: MenuQuery) -> Self {
        Self {
            name_contains: query.search,
            category_id: query.category_id,
            min_price: query.min_price,
            max_price: query.max_price,
        }
    }
}

/// Menu page payload
#[derive(Debug, Serialize)]
pub struct MenuResponse {
    /// Matching food items
    pub items: Vec<food_item::Model>,
    /// All categories, for the filter
    pub categories: Vec<category::Model>,
}

/// Menu routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/menu/foods", get(list_foods))
        .route("/menu/foods/:id", get(food_details))
        .route("/menu/combos", get(list_combos))
        .route("/menu/combos/:id", get(combo_details))
}

async fn list_foods(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<MenuResponse>> {
    let filter = FoodFilter::from(query);
    let items = catalog::list_available_food_items(state.db(), &filter).await?;
    let categories = catalog::list_categories(state.db()).await?;
    Ok(Json(MenuResponse { items, categories }))
}

async fn food_details(
    State(state): State<AppState>,
    Path(food_item_id): Path<i64>,
) -> Result<Json<food_item::Model>> {
    catalog::find_food_item(state.db(), food_item_id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("food item", food_item_id))
}

async fn list_combos(State(state): State<AppState>) -> Result<Json<Vec<ComboWithItems>>> {
    catalog::list_active_combos(state.db()).await.map(Json)
}

async fn combo_details(
    State(state): State<AppState>,
    Path(combo_id): Path<i64>,
) -> Result<Json<ComboWithItems>> {
    catalog::combo_with_items(state.db(), combo_id)
        .await?
        .filter(|c| c.combo.status == crate::entities::ComboStatus::Active)
        .map(Json)
        .ok_or_else(|| Error::not_found("combo", combo_id))
}
