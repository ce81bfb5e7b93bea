//! HTTP interface - axum routes over the core services.
//!
//! Identity comes from the upstream identity provider through request headers
//! (see [`identity`]). Form posts answer with `303 See Other` redirects, reads
//! answer with JSON.

pub mod account;
pub mod admin;
pub mod cart;
pub mod error;
pub mod identity;
pub mod menu;
pub mod order;

use axum::{Json, Router, routing::get};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    db: Arc<DatabaseConnection>,
}

impl AppState {
    /// Wraps a connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db: Arc::new(db) }
    }

    /// The shared connection pool.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Builds the application router with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(cart::routes())
        .merge(order::routes())
        .merge(menu::routes())
        .merge(account::routes())
        .merge(admin::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}


#[cfg(test)]
mod tests {
    use super::AppState;
    use super::test_support::*;
    use crate::errors::Result;
    use crate::test_utils::setup_test_db;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let db = setup_test_db().await?;
        let response = send(&app(db), empty("GET", "/health", None)).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_state_clones_share_one_connection() -> Result<()> {
        let state = AppState::new(setup_test_db().await?);
        let handler_copy = state.clone();
        assert!(std::ptr::eq(state.db(), handler_copy.db()));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() -> Result<()> {
        let db = setup_test_db().await?;
        let response = send(&app(db), empty("GET", "/nope", None)).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        Ok(())
    }
}
