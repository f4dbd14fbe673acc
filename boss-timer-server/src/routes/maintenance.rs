//! Post-maintenance re-baselining.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::bosses::{MaintenanceResetResponse, STATUS_SUCCESS, SeededCount};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(maintenance_reset),
    components(schemas(MaintenanceResetResponse, SeededCount))
)]
pub struct MaintenanceApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/maintenance/reset", post(maintenance_reset))
}

/// Replace every record with one channel `-1` record per catalog boss,
/// all killed now. Destructive.
#[utoipa::path(
    post,
    path = "/maintenance/reset",
    tag = "maintenance",
    responses(
        (status = 200, description = "All timers re-baselined", body = MaintenanceResetResponse),
        (status = 500, description = "Store error"),
    )
)]
pub async fn maintenance_reset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MaintenanceResetResponse>, ServerError> {
    let seeded = state.timers.maintenance_reset(Utc::now()).await?;
    Ok(Json(MaintenanceResetResponse {
        status: STATUS_SUCCESS.to_owned(),
        message: "maintenance reset complete".to_owned(),
        data: SeededCount { seeded },
    }))
}
