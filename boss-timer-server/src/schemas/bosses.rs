//! Request / response types for the timer API (`/bosses`, `/maintenance`, `/catalog`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::BossEntry;
use crate::db::BossRecord;
use crate::services::TimerView;

/// Request body for `POST /bosses`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateBossRequest {
    /// Must match a catalog entry exactly.
    pub boss_name: String,
    pub channel: i64,
    /// Optional sub-channel qualifier, e.g. `"7-1"`.
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BossRecordResponse {
    pub id: i64,
    pub boss_name: String,
    pub channel: i64,
    pub note: Option<String>,
    pub kill_time: String,
    pub created_at: String,
}

/// One entry of `GET /bosses`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BossTimerResponse {
    pub id: i64,
    pub boss_name: String,
    pub img: String,
    pub channel: i64,
    pub note: Option<String>,
    /// Human-readable status with the minute count embedded.
    pub status: String,
    /// `blue`, `orange` or `red`.
    pub color: String,
    /// `gestating`, `possibly_spawned` or `spawned`.
    pub state: String,
    /// The minute count embedded in `status`.
    pub minutes: i64,
    pub kill_time: String,
    pub min_mins: u32,
    pub max_mins: u32,
    /// Minutes until the guaranteed spawn; negative once overdue. The list is
    /// sorted ascending by this value.
    pub sort_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogEntryResponse {
    pub boss_name: String,
    pub min_mins: u32,
    pub max_mins: u32,
    pub img: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateBossResponse {
    pub status: String,
    pub data: BossRecordResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetBossResponse {
    pub status: String,
    pub message: String,
    pub data: BossRecordResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SeededCount {
    pub seeded: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceResetResponse {
    pub status: String,
    pub message: String,
    pub data: SeededCount,
}

pub const STATUS_SUCCESS: &str = "success";

impl BossRecord {
    pub fn to_response(&self) -> BossRecordResponse {
        BossRecordResponse {
            id: self.id,
            boss_name: self.boss_name.clone(),
            channel: self.channel,
            note: self.note.clone(),
            kill_time: self.kill_time.to_rfc3339(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

impl TimerView {
    pub fn to_response(&self) -> BossTimerResponse {
        BossTimerResponse {
            id: self.record.id,
            boss_name: self.record.boss_name.clone(),
            img: self.entry.img.clone(),
            channel: self.record.channel,
            note: self.record.note.clone(),
            status: self.status.label(),
            color: self.status.color().to_owned(),
            state: self.status.state().to_owned(),
            minutes: self.status.minutes(),
            kill_time: self.record.kill_time.to_rfc3339(),
            min_mins: self.entry.min_mins,
            max_mins: self.entry.max_mins,
            sort_score: self.sort_score,
        }
    }
}

impl CatalogEntryResponse {
    pub fn new(boss_name: &str, entry: &BossEntry) -> Self {
        Self {
            boss_name: boss_name.to_owned(),
            min_mins: entry.min_mins,
            max_mins: entry.max_mins,
            img: entry.img.clone(),
        }
    }
}
