//! SQLite implementation of [`RecordStore`].
//!
//! Uses [`sqlx`] with the `sqlite` feature.  Migrations are run automatically
//! on startup via [`SqliteStore::connect`].
//!
//! # Migrations path
//!
//! `sqlx::migrate!("./migrations/sqlite")` resolves the path **at compile time**
//! relative to `CARGO_MANIFEST_DIR` (the crate root), so the directory is
//! embedded into the binary.
//!
//! # Legacy tables
//!
//! Deployments that predate this server already have a `boss_timers` table,
//! possibly without the `note` column and with timestamps written as naive
//! `YYYY-MM-DD HH:MM:SS.ffffff` text.  The create migration adopts such a
//! table untouched, [`SqliteStore::from_pool`] adds the missing column, and
//! [`parse_timestamp`] reads both timestamp spellings.
//!
//! # Queries
//!
//! The `sqlx::query` (runtime-verified) form is used so that no
//! `DATABASE_URL` environment variable is needed at compile time.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use super::{BossRecord, NewBossRecord, RecordStore};

type BossRow = (i64, String, i64, Option<String>, String, String);

const SELECT_COLUMNS: &str = "SELECT id, boss_name, channel, note, kill_time, created_at FROM boss_timers";

/// SQLite-backed boss record store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://boss_timer.db"`.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::from_pool(pool).await
    }

    /// Run migrations on an already-open pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations/sqlite").run(&pool).await?;
        ensure_note_column(&pool).await?;
        Ok(Self { pool })
    }

    /// Fresh in-memory database on a single connection.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::from_pool(test_pool().await).await.unwrap()
    }
}

/// Single connection so every query sees the same `:memory:` database.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

async fn ensure_note_column(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let (present,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM pragma_table_info('boss_timers') WHERE name = 'note'",
    )
    .fetch_one(pool)
    .await?;
    if present == 0 {
        info!("boss_timers has no note column; adding it");
        sqlx::query("ALTER TABLE boss_timers ADD COLUMN note TEXT")
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Parse a stored timestamp: RFC 3339 first, then the naive UTC text older
/// deployments wrote.
fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_owned(),
            source: Box::new(e),
        })
}

fn row_to_record(
    (id, boss_name, channel, note, kill_time, created_at): BossRow,
) -> Result<BossRecord, sqlx::Error> {
    Ok(BossRecord {
        id,
        boss_name,
        channel,
        note,
        kill_time: parse_timestamp("kill_time", &kill_time)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

impl RecordStore for SqliteStore {
    async fn insert_record(&self, record: NewBossRecord) -> Result<BossRecord, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO boss_timers (boss_name, channel, note, kill_time, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&record.boss_name)
        .bind(record.channel)
        .bind(&record.note)
        .bind(record.kill_time.to_rfc3339())
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(BossRecord {
            id: result.last_insert_rowid(),
            boss_name: record.boss_name,
            channel: record.channel,
            note: record.note,
            kill_time: record.kill_time,
            created_at: record.created_at,
        })
    }

    async fn list_records(&self) -> Result<Vec<BossRecord>, sqlx::Error> {
        let rows: Vec<BossRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_record).collect()
    }

    async fn get_record(&self, id: i64) -> Result<Option<BossRecord>, sqlx::Error> {
        let row: Option<BossRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_record).transpose()
    }

    async fn delete_record(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boss_timers WHERE id = ?1")
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
        let result = sqlx::query("UPDATE boss_timers SET kill_time = ?1 WHERE id = ?2")
            .bind(kill_time.to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_record(id).await
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
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&record.boss_name)
            .bind(record.channel)
            .bind(&record.note)
            .bind(record.kill_time.to_rfc3339())
            .bind(record.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
