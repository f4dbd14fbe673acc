//! PostgreSQL implementation of [`RecordStore`].
//!
//! Used when the configured URL has a `postgres://` or `postgresql://`
//! scheme, which is what hosting platforms inject through `DATABASE_URL`.
//! Migrations from `./migrations/postgres` run on connect.
//!
//! Timestamps live in `TIMESTAMP` (no zone) columns holding UTC, the layout
//! earlier deployments created, so an existing `boss_timers` table is adopted
//! without rewriting it.  Ids and channels are `INTEGER` there and are widened
//! to `BIGINT` in every projection.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

use super::{BossRecord, NewBossRecord, RecordStore};

type BossRow = (i64, String, i64, Option<String>, NaiveDateTime, NaiveDateTime);

const COLUMNS: &str = "id::BIGINT, boss_name, channel::BIGINT, note, kill_time, created_at";

/// PostgreSQL-backed boss record store.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to `url` and run pending migrations.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = PgConnectOptions::from_str(url)?.disable_statement_logging();
        let pool = PgPoolOptions::new().connect_with(options).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> Result<Self, sqlx::Error> {
        sqlx::migrate!("./migrations/postgres").run(&pool).await?;
        Ok(Self { pool })
    }
}

fn row_to_record(
    (id, boss_name, channel, note, kill_time, created_at): BossRow,
) -> BossRecord {
    BossRecord {
        id,
        boss_name,
        channel,
        note,
        kill_time: kill_time.and_utc(),
        created_at: created_at.and_utc(),
    }
}

impl RecordStore for PgStore {
    async fn insert_record(&self, record: NewBossRecord) -> Result<BossRecord, sqlx::Error> {
        let row: BossRow = sqlx::query_as(&format!(
            "INSERT INTO boss_timers (boss_name, channel, note, kill_time, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        ))
        .bind(&record.boss_name)
        .bind(record.channel)
        .bind(&record.note)
        .bind(record.kill_time.naive_utc())
        .bind(record.created_at.naive_utc())
        .fetch_one(&self.pool)
        .await?;
        Ok(row_to_record(row))
    }

    async fn list_records(&self) -> Result<Vec<BossRecord>, sqlx::Error> {
        let rows: Vec<BossRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM boss_timers ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn get_record(&self, id: i64) -> Result<Option<BossRecord>, sqlx::Error> {
        let row: Option<BossRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM boss_timers WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(row_to_record))
    }

    async fn delete_record(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boss_timers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_kill_time(
        &self,
        id: i64,
        kill_time: DateTime<Utc>,
    ) -> Result<Option<BossRecord>, sqlx::Error> {
        let row: Option<BossRow> = sqlx::query_as(&format!(
            "UPDATE boss_timers SET kill_time = $1 WHERE id = $2 RETURNING {COLUMNS}"
        ))
        .bind(kill_time.naive_utc())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_record))
    }

    async fn replace_all(&self, records: Vec<NewBossRecord>) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM boss_timers")
            .execute(&mut *tx)
            .await?;

        let mut inserted = 0;
        for record in &records {
            let result = sqlx::query(
                "INSERT INTO boss_timers (boss_name, channel, note, kill_time, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&record.boss_name)
            .bind(record.channel)
            .bind(&record.note)
            .bind(record.kill_time.naive_utc())
            .bind(record.created_at.naive_utc())
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
