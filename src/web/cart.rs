//! Cart pages: view, add, update, remove, clear and checkout.

use crate::{
    core::{cart, identity::Requester, line_source::LineSource, order},
    errors::{Error, Result},
    web::AppState,
};
use axum::{
    Form, Json, Router,
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{info, instrument};

/// Form for adding a line; exactly one of the ids must be set
#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    /// Food item to add
    pub food_item_id: Option<i64>,
    /// Combo to add
    pub combo_id: Option<i64>,
    /// Units to add, 1 when omitted
    pub quantity: Option<i32>,
}

/// Form for changing a line's quantity
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    /// New quantity; zero or less removes the line
    pub quantity: i32,
}

/// Cart routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(view_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:id", post(update_quantity))
        .route("/cart/items/:id/remove", post(remove_item))
        .route("/cart/clear", post(clear_cart))
        .route("/cart/checkout", post(checkout))
}

fn to_cart() -> Redirect {
    Redirect::to("/cart")
}

#[instrument(skip(state, requester), fields(user = %requester.user_id))]
async fn view_cart(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<cart::CartView>> {
    cart::view_cart(state.db(), &requester.user_id).await.map(Json)
}

#[instrument(skip(state, requester), fields(user = %requester.user_id))]
async fn add_item(
    State(state): State<AppState>,
    requester: Requester,
    Form(form): Form<AddItemForm>,
) -> Result<Redirect> {
    let source = LineSource::from_exclusive(form.food_item_id, form.combo_id)?;
    cart::add_item(
        state.db(),
        &requester.user_id,
        source,
        form.quantity.unwrap_or(1),
    )
    .await?;
    Ok(to_cart())
}

#[instrument(skip(state, requester), fields(user = %requester.user_id))]
async fn update_quantity(
    State(state): State<AppState>,
    requester: Requester,
    Path(item_id): Path<i64>,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect> {
    cart::update_quantity(state.db(), &requester.user_id, item_id, form.quantity).await?;
    Ok(to_cart())
}

#[instrument(skip(state, requester), fields(user = %requester.user_id))]
async fn remove_item(
    State(state): State<AppState>,
    requester: Requester,
    Path(item_id): Path<i64>,
) -> Result<Redirect> {
    cart::remove_item(state.db(), &requester.user_id, item_id).await?;
    Ok(to_cart())
}

#[instrument(skip(state, requester), fields(user = %requester.user_id))]
async fn clear_cart(State(state): State<AppState>, requester: Requester) -> Result<Redirect> {
    cart::clear(state.db(), &requester.user_id).await?;
    Ok(to_cart())
}

#[instrument(skip(state, requester), fields(user = %requester.user_id))]
async fn checkout(State(state): State<AppState>, requester: Requester) -> Result<Redirect> {
    match order::checkout(state.db(), &requester.user_id).await {
        Ok(placed) => Ok(Redirect::to(&format!("/orders/{}", placed.id))),
        Err(Error::EmptyCart { .. }) => {
            info!("Nothing to check out, back to the cart");
            Ok(to_cart())
        }
        Err(e) => Err(e),
    }
}
