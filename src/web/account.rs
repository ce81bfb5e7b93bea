//! Self-service profile routes.

use crate::{
    core::{
        identity::Requester,
        user::{self, ProfileUpdate, UserWithRoles},
    },
    errors::Result,
    web::AppState,
};
use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use tracing::instrument;

/// Account routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/account/profile", get(profile).put(update_profile))
}

#[instrument(skip(state, requester), fields(user = %requester.user_id))]
async fn profile(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<UserWithRoles>> {
    user::get_user(state.db(), &requester, &requester.user_id)
        .await
        .map(Json)
}

#[instrument(skip(state, requester, update), fields(user = %requester.user_id))]
async fn update_profile(
    State(state): State<AppState>,
    requester: Requester,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserWithRoles>> {
    user::update_own_profile(state.db(), &requester, update)
        .await
        .map(Json)
}
