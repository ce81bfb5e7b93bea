//! Order routes for customers.

use crate::{
    core::{
        identity::Requester,
        order::{self, NewOrderLine, OrderDetails},
    },
    errors::Result,
    web::AppState,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::Redirect,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

/// Body of `POST /orders`
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    /// Lines to order
    #[serde(default)]
    pub lines: Vec<NewOrderLine>,
}

/// Order routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_mine).post(place_order))
        .route("/orders/:id", get(details))
}

#[instrument(skip(state, requester, request), fields(user = %requester.user_id))]
async fn place_order(
    State(state): State<AppState>,
    requester: Requester,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Redirect> {
    let placed = order::place_order(state.db(), &requester.user_id, request.lines).await?;
    Ok(Redirect::to(&format!("/orders/{}", placed.id)))
}

#[instrument(skip(state, requester), fields(user = %requester.user_id))]
async fn list_mine(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<Vec<OrderDetails>>> {
    order::list_mine(state.db(), &requester.user_id).await.map(Json)
}

#[instrument(skip(state, requester), fields(user = %requester.user_id))]
async fn details(
    State(state): State<AppState>,
    requester: Requester,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDetails>> {
    order::get_details(state.db(), order_id, &requester).await.map(Json)
}
