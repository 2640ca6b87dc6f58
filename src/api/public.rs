//! Public catalog endpoints backing the marketing pages.

use axum::{extract::State, Json};

use crate::catalog::PublicEntry;
use crate::AppState;

/// GET /api/catalog/products
pub async fn public_products(State(state): State<AppState>) -> Json<Vec<PublicEntry>> {
    Json(state.catalog.products.clone())
}

/// GET /api/catalog/services
pub async fn public_services(State(state): State<AppState>) -> Json<Vec<PublicEntry>> {
    Json(state.catalog.services.clone())
}
