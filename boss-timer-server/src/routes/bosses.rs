//! Kill reports and the timer board.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use chrono::Utc;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::bosses::{
    ActionResponse, BossRecordResponse, BossTimerResponse, CreateBossRequest, CreateBossResponse,
    ResetBossResponse, STATUS_SUCCESS,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(create_boss_record, list_boss_timers, delete_boss_record, reset_boss_record),
    components(schemas(
        CreateBossRequest,
        CreateBossResponse,
        BossRecordResponse,
        BossTimerResponse,
        ActionResponse,
        ResetBossResponse
    ))
)]
pub struct BossesApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bosses", post(create_boss_record).get(list_boss_timers))
        .route("/bosses/{id}", delete(delete_boss_record))
        .route("/bosses/{id}/reset", put(reset_boss_record))
}

#[utoipa::path(
    post,
    path = "/bosses",
    tag = "bosses",
    request_body = CreateBossRequest,
    responses(
        (status = 200, description = "Kill recorded", body = CreateBossResponse),
        (status = 400, description = "Unknown boss name"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn create_boss_record(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBossRequest>,
) -> Result<Json<CreateBossResponse>, ServerError> {
    let record = state
        .timers
        .create(&req.boss_name, req.channel, req.note, Utc::now())
        .await?;
    Ok(Json(CreateBossResponse {
        status: STATUS_SUCCESS.to_owned(),
        data: record.to_response(),
    }))
}

/// Timer board, sorted by minutes until the guaranteed spawn.
///
/// Records overdue by the configured expiry (180 minutes by default) are
/// deleted while building the response.
#[utoipa::path(
    get,
    path = "/bosses",
    tag = "bosses",
    responses(
        (status = 200, description = "Timer board", body = Vec<BossTimerResponse>),
        (status = 500, description = "Store error"),
    )
)]
pub async fn list_boss_timers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BossTimerResponse>>, ServerError> {
    let views = state.timers.list(Utc::now()).await?;
    Ok(Json(views.iter().map(|v| v.to_response()).collect()))
}

#[utoipa::path(
    delete,
    path = "/bosses/{id}",
    tag = "bosses",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record deleted", body = ActionResponse),
        (status = 404, description = "No record with this id"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn delete_boss_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>, ServerError> {
    state.timers.delete(id).await?;
    Ok(Json(ActionResponse {
        status: STATUS_SUCCESS.to_owned(),
        message: "record deleted".to_owned(),
    }))
}

#[utoipa::path(
    put,
    path = "/bosses/{id}/reset",
    tag = "bosses",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "Kill time set to now", body = ResetBossResponse),
        (status = 404, description = "No record with this id"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn reset_boss_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ResetBossResponse>, ServerError> {
    let record = state.timers.reset_kill_time(id, Utc::now()).await?;
    Ok(Json(ResetBossResponse {
        status: STATUS_SUCCESS.to_owned(),
        message: "kill time reset".to_owned(),
        data: record.to_response(),
    }))
}
