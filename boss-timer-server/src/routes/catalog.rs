//! Read-only view of the boss catalog for the front-end's kill form.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::schemas::bosses::CatalogEntryResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_catalog), components(schemas(CatalogEntryResponse)))]
pub struct CatalogApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/catalog", get(list_catalog))
}

/// Bosses accepted by `POST /bosses`, sorted by name.
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "Boss catalog", body = Vec<CatalogEntryResponse>),
    )
)]
pub async fn list_catalog(State(state): State<Arc<AppState>>) -> Json<Vec<CatalogEntryResponse>> {
    Json(
        state
            .catalog
            .iter()
            .map(|(name, entry)| CatalogEntryResponse::new(name, entry))
            .collect(),
    )
}
