//! Respawn timer operations.
//!
//! [`TimerService`] owns the business rules: kill reports are validated
//! against the [`BossCatalog`], listings derive a [`SpawnStatus`] from the
//! minutes elapsed since the kill, and maintenance resets re-seed one record
//! per catalog entry.  Every operation takes `now` from the caller; handlers
//! pass `Utc::now()`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::catalog::{BossCatalog, BossEntry};
use crate::db::{BossRecord, MAINTENANCE_CHANNEL, NewBossRecord, RecordStore};
use crate::error::ServerError;

/// Where a boss stands in its respawn window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnStatus {
    /// Earliest possible respawn has not been reached.
    Gestating { mins_until_min: f64 },
    /// Inside the window; respawn may already have happened.
    PossiblySpawned { mins_until_max: f64 },
    /// Guaranteed respawn time has passed.
    Spawned { overdue_mins: f64 },
}

impl SpawnStatus {
    pub fn derive(elapsed_mins: f64, entry: &BossEntry) -> Self {
        let min = f64::from(entry.min_mins);
        let max = f64::from(entry.max_mins);
        if elapsed_mins < min {
            SpawnStatus::Gestating { mins_until_min: min - elapsed_mins }
        } else if elapsed_mins < max {
            SpawnStatus::PossiblySpawned { mins_until_max: max - elapsed_mins }
        } else {
            SpawnStatus::Spawned { overdue_mins: elapsed_mins - max }
        }
    }

    /// Whole minutes shown to players, truncated toward zero.
    pub fn minutes(&self) -> i64 {
        let value = match *self {
            SpawnStatus::Gestating { mins_until_min } => mins_until_min,
            SpawnStatus::PossiblySpawned { mins_until_max } => mins_until_max,
            SpawnStatus::Spawned { overdue_mins } => overdue_mins,
        };
        value.trunc() as i64
    }

    pub fn label(&self) -> String {
        let n = self.minutes();
        match self {
            SpawnStatus::Gestating { .. } => format!("Respawning ({n} min until earliest spawn)"),
            SpawnStatus::PossiblySpawned { .. } => {
                format!("May have spawned ({n} min until guaranteed spawn)")
            }
            SpawnStatus::Spawned { .. } => format!("Spawned ({n} min overdue)"),
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SpawnStatus::Gestating { .. } => "blue",
            SpawnStatus::PossiblySpawned { .. } => "orange",
            SpawnStatus::Spawned { .. } => "red",
        }
    }

    pub fn state(&self) -> &'static str {
        match self {
            SpawnStatus::Gestating { .. } => "gestating",
            SpawnStatus::PossiblySpawned { .. } => "possibly_spawned",
            SpawnStatus::Spawned { .. } => "spawned",
        }
    }
}

/// One row of the timer board.
#[derive(Debug, Clone)]
pub struct TimerView {
    pub record: BossRecord,
    pub entry: BossEntry,
    pub status: SpawnStatus,
    /// `max_mins - elapsed_mins`; negative once overdue.
    pub sort_score: f64,
}

/// Minutes between `kill_time` and `now`, millisecond resolution.
pub fn elapsed_mins(kill_time: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - kill_time).num_milliseconds() as f64 / 60_000.0
}

#[derive(Debug)]
pub struct TimerService<S> {
    store: Arc<S>,
    catalog: Arc<BossCatalog>,
    expire_after_mins: f64,
}

impl<S: RecordStore> TimerService<S> {
    pub fn new(store: Arc<S>, catalog: Arc<BossCatalog>, expire_after_mins: u32) -> Self {
        Self {
            store,
            catalog,
            expire_after_mins: f64::from(expire_after_mins),
        }
    }

    /// Record a kill of `boss_name` on `channel` at `now`.
    pub async fn create(
        &self,
        boss_name: &str,
        channel: i64,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<BossRecord, ServerError> {
        if !self.catalog.contains(boss_name) {
            return Err(ServerError::Validation(format!("unknown boss: {boss_name}")));
        }
        let note = note
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());

        let record = self
            .store
            .insert_record(NewBossRecord {
                boss_name: boss_name.to_owned(),
                channel,
                note,
                kill_time: now,
                created_at: now,
            })
            .await?;
        info!(id = record.id, boss = %record.boss_name, channel, "kill recorded");
        Ok(record)
    }

    /// Current timer board, soonest guaranteed spawn (or most overdue) first.
    ///
    /// Records with a boss name missing from the catalog are skipped but kept.
    /// Records overdue by `expire_after_mins` or more are **deleted** from the
    /// store as part of the listing. This write-on-read is existing product
    /// behavior and is pending review; do not change it silently.
    pub async fn list(&self, now: DateTime<Utc>) -> Result<Vec<TimerView>, ServerError> {
        let records = self.store.list_records().await?;
        let mut views = Vec::with_capacity(records.len());

        for record in records {
            let Some(entry) = self.catalog.get(&record.boss_name) else {
                debug!(id = record.id, boss = %record.boss_name, "boss not in catalog; skipping");
                continue;
            };

            let elapsed = elapsed_mins(record.kill_time, now);
            let status = SpawnStatus::derive(elapsed, entry);

            if let SpawnStatus::Spawned { overdue_mins } = status {
                if overdue_mins >= self.expire_after_mins {
                    self.store.delete_record(record.id).await?;
                    info!(
                        id = record.id,
                        boss = %record.boss_name,
                        overdue_mins = overdue_mins as i64,
                        "expired stale timer"
                    );
                    continue;
                }
            }

            views.push(TimerView {
                sort_score: f64::from(entry.max_mins) - elapsed,
                entry: entry.clone(),
                status,
                record,
            });
        }

        views.sort_by(|a, b| a.sort_score.total_cmp(&b.sort_score));
        Ok(views)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServerError> {
        if !self.store.delete_record(id).await? {
            return Err(not_found(id));
        }
        info!(id, "timer deleted");
        Ok(())
    }

    /// Restart the countdown of record `id` from `now`.
    pub async fn reset_kill_time(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<BossRecord, ServerError> {
        let record = self
            .store
            .update_kill_time(id, now)
            .await?
            .ok_or_else(|| not_found(id))?;
        info!(id, boss = %record.boss_name, "kill time reset");
        Ok(record)
    }

    /// Drop every record and seed one maintenance record per catalog boss,
    /// all killed at `now`. Returns the number of seeded records.
    pub async fn maintenance_reset(&self, now: DateTime<Utc>) -> Result<u64, ServerError> {
        let seeds = self
            .catalog
            .names()
            .map(|name| NewBossRecord {
                boss_name: name.to_owned(),
                channel: MAINTENANCE_CHANNEL,
                note: None,
                kill_time: now,
                created_at: now,
            })
            .collect();
        let seeded = self.store.replace_all(seeds).await?;
        info!(seeded, "maintenance reset complete");
        Ok(seeded)
    }
}

fn not_found(id: i64) -> ServerError {
    ServerError::NotFound(format!("boss record {id} not found"))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::sqlite::SqliteStore;
    use chrono::{Duration, TimeZone};

    fn entry(min_mins: u32, max_mins: u32) -> BossEntry {
        BossEntry { min_mins, max_mins, img: "a.png".into() }
    }

    fn catalog() -> Arc<BossCatalog> {
        Arc::new(
            BossCatalog::from_entries([
                ("Boss A".to_owned(), entry(60, 90)),
                ("Boss B".to_owned(), entry(10, 20)),
                ("Boss C".to_owned(), entry(300, 360)),
            ])
            .unwrap(),
        )
    }

    async fn service() -> TimerService<SqliteStore> {
        TimerService::new(Arc::new(SqliteStore::in_memory().await), catalog(), 180)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn mins(n: i64) -> Duration {
        Duration::minutes(n)
    }

    #[test]
    fn derive_covers_three_states() {
        let e = entry(60, 90);
        assert_eq!(
            SpawnStatus::derive(30.0, &e),
            SpawnStatus::Gestating { mins_until_min: 30.0 }
        );
        assert_eq!(
            SpawnStatus::derive(60.0, &e),
            SpawnStatus::PossiblySpawned { mins_until_max: 30.0 }
        );
        assert_eq!(
            SpawnStatus::derive(90.0, &e),
            SpawnStatus::Spawned { overdue_mins: 0.0 }
        );
    }

    #[test]
    fn zero_width_window_skips_possibly_spawned() {
        let e = entry(45, 45);
        assert!(matches!(SpawnStatus::derive(44.9, &e), SpawnStatus::Gestating { .. }));
        assert!(matches!(SpawnStatus::derive(45.0, &e), SpawnStatus::Spawned { .. }));
    }

    #[test]
    fn labels_embed_truncated_minutes() {
        let e = entry(60, 90);
        let status = SpawnStatus::derive(30.6, &e);
        assert_eq!(status.minutes(), 29);
        assert_eq!(status.label(), "Respawning (29 min until earliest spawn)");
        assert_eq!(status.color(), "blue");

        let status = SpawnStatus::derive(75.0, &e);
        assert_eq!(status.label(), "May have spawned (15 min until guaranteed spawn)");
        assert_eq!(status.color(), "orange");
        assert_eq!(status.state(), "possibly_spawned");

        let status = SpawnStatus::derive(95.5, &e);
        assert_eq!(status.label(), "Spawned (5 min overdue)");
        assert_eq!(status.color(), "red");
    }

    #[test]
    fn elapsed_uses_fractional_minutes() {
        let now = t0() + Duration::seconds(90);
        assert_eq!(elapsed_mins(t0(), now), 1.5);
    }

    #[tokio::test]
    async fn create_rejects_unknown_boss_without_persisting() {
        let svc = service().await;
        let err = svc.create("Nobody", 1, None, t0()).await.unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
        assert!(svc.store.list_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_sets_kill_time_and_normalises_note() {
        let svc = service().await;
        let record = svc
            .create("Boss A", 3, Some("  7-1 ".into()), t0())
            .await
            .unwrap();
        assert_eq!(record.kill_time, t0());
        assert_eq!(record.created_at, t0());
        assert_eq!(record.note.as_deref(), Some("7-1"));

        let blank = svc.create("Boss A", 3, Some("   ".into()), t0()).await.unwrap();
        assert_eq!(blank.note, None);
    }

    #[tokio::test]
    async fn countdown_scenario() {
        let svc = service().await;
        let record = svc.create("Boss A", 3, None, t0()).await.unwrap();

        let views = svc.list(t0() + mins(30)).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, SpawnStatus::Gestating { mins_until_min: 30.0 });
        assert_eq!(views[0].sort_score, 60.0);

        let views = svc.list(t0() + mins(75)).await.unwrap();
        assert_eq!(views[0].status, SpawnStatus::PossiblySpawned { mins_until_max: 15.0 });
        assert_eq!(views[0].sort_score, 15.0);

        let views = svc.list(t0() + mins(95)).await.unwrap();
        assert_eq!(views[0].status, SpawnStatus::Spawned { overdue_mins: 5.0 });
        assert_eq!(views[0].sort_score, -5.0);

        assert!(svc.list(t0() + mins(271)).await.unwrap().is_empty());
        assert!(svc.store.get_record(record.id).await.unwrap().is_none());
        assert!(svc.list(t0() + mins(272)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expiry_boundary_is_inclusive() {
        let svc = service().await;
        svc.create("Boss B", 1, None, t0()).await.unwrap();

        // max 20 + 179 overdue: kept
        let views = svc.list(t0() + mins(199)).await.unwrap();
        assert_eq!(views.len(), 1);
        // max 20 + 180 overdue: expired
        assert!(svc.list(t0() + mins(200)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expiry_threshold_is_configurable() {
        let svc = TimerService::new(Arc::new(SqliteStore::in_memory().await), catalog(), 10);
        svc.create("Boss B", 1, None, t0()).await.unwrap();
        assert_eq!(svc.list(t0() + mins(29)).await.unwrap().len(), 1);
        assert!(svc.list(t0() + mins(30)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_boss_is_skipped_not_deleted() {
        let svc = service().await;
        let orphan = svc
            .store
            .insert_record(NewBossRecord {
                boss_name: "Retired Boss".into(),
                channel: 2,
                note: None,
                kill_time: t0(),
                created_at: t0(),
            })
            .await
            .unwrap();

        // Long past any expiry threshold.
        assert!(svc.list(t0() + mins(10_000)).await.unwrap().is_empty());
        assert!(svc.store.get_record(orphan.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_sorts_by_minutes_until_guaranteed_spawn() {
        let svc = service().await;
        // At t0+40: A sort 50, B sort -20, C sort 320.
        svc.create("Boss C", 1, None, t0()).await.unwrap();
        svc.create("Boss A", 2, None, t0()).await.unwrap();
        svc.create("Boss B", 3, None, t0()).await.unwrap();

        let views = svc.list(t0() + mins(40)).await.unwrap();
        let names: Vec<_> = views.iter().map(|v| v.record.boss_name.as_str()).collect();
        assert_eq!(names, vec!["Boss B", "Boss A", "Boss C"]);
        assert!(views.windows(2).all(|w| w[0].sort_score <= w[1].sort_score));
    }

    #[tokio::test]
    async fn equal_scores_keep_insertion_order() {
        let svc = service().await;
        let first = svc.create("Boss A", 1, None, t0()).await.unwrap();
        let second = svc.create("Boss A", 2, None, t0()).await.unwrap();
        let views = svc.list(t0() + mins(5)).await.unwrap();
        assert_eq!(views[0].record.id, first.id);
        assert_eq!(views[1].record.id, second.id);
    }

    #[tokio::test]
    async fn gestating_score_exceeds_window_width() {
        let svc = service().await;
        svc.create("Boss A", 1, None, t0()).await.unwrap();
        for m in [0, 1, 30, 59] {
            let views = svc.list(t0() + mins(m)).await.unwrap();
            assert!(matches!(views[0].status, SpawnStatus::Gestating { .. }));
            assert!(views[0].sort_score > 30.0);
        }
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let svc = service().await;
        let record = svc.create("Boss A", 1, None, t0()).await.unwrap();
        svc.delete(record.id).await.unwrap();
        assert!(matches!(svc.delete(record.id).await, Err(ServerError::NotFound(_))));
    }

    #[tokio::test]
    async fn reset_restarts_countdown() {
        let svc = service().await;
        let record = svc.create("Boss A", 3, Some("3-2".into()), t0()).await.unwrap();

        let later = t0() + mins(80);
        let reset = svc.reset_kill_time(record.id, later).await.unwrap();
        assert_eq!(reset.kill_time, later);
        assert_eq!(reset.boss_name, "Boss A");
        assert_eq!(reset.channel, 3);
        assert_eq!(reset.note.as_deref(), Some("3-2"));

        let views = svc.list(later + mins(10)).await.unwrap();
        assert_eq!(views[0].status, SpawnStatus::Gestating { mins_until_min: 50.0 });

        assert!(matches!(
            svc.reset_kill_time(record.id + 1, later).await,
            Err(ServerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn maintenance_reset_seeds_one_record_per_boss() {
        let svc = service().await;
        svc.create("Boss A", 4, None, t0()).await.unwrap();
        svc.create("Boss A", 5, None, t0()).await.unwrap();

        let now = t0() + mins(500);
        let seeded = svc.maintenance_reset(now).await.unwrap();
        assert_eq!(seeded, 3);

        let records = svc.store.list_records().await.unwrap();
        let mut names: Vec<_> = records.iter().map(|r| r.boss_name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Boss A", "Boss B", "Boss C"]);
        assert!(records.iter().all(|r| r.channel == MAINTENANCE_CHANNEL));
        assert!(records.iter().all(|r| r.kill_time == now && r.note.is_none()));
    }
}
