//! Database abstraction layer.
//!
//! [`RecordStore`] defines the interface for persisting boss kill records.
//! [`sqlite::SqliteStore`] and [`postgres::PgStore`] implement it, and
//! [`DbStore::connect`] picks one from the scheme of the database URL.
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required.

pub mod postgres;
pub mod sqlite;

use std::borrow::Cow;
use std::future::Future;

use chrono::{DateTime, Utc};

/// Channel value of records seeded by a maintenance reset.
pub const MAINTENANCE_CHANNEL: i64 = -1;

/// A single row in the `boss_timers` table.
#[derive(Debug, Clone, PartialEq)]
pub struct BossRecord {
    pub id: i64,
    pub boss_name: String,
    /// Game channel; [`MAINTENANCE_CHANNEL`] for maintenance-seeded rows.
    pub channel: i64,
    /// Free-form qualifier, e.g. a sub-channel like `"7-1"`.
    pub note: Option<String>,
    /// Basis for all countdown arithmetic.
    pub kill_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A record that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewBossRecord {
    pub boss_name: String,
    pub channel: i64,
    pub note: Option<String>,
    pub kill_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Trait for persisting boss kill records.
///
/// Implement this trait to swap SQLite for another database backend without
/// touching the timer service or any handler code.
pub trait RecordStore: Send + Sync + 'static {
    /// Persist a new record and return it with its generated id.
    fn insert_record(
        &self,
        record: NewBossRecord,
    ) -> impl Future<Output = Result<BossRecord, sqlx::Error>> + Send;

    /// All records, ascending by id.
    fn list_records(&self) -> impl Future<Output = Result<Vec<BossRecord>, sqlx::Error>> + Send;

    fn get_record(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<BossRecord>, sqlx::Error>> + Send;

    /// Returns `false` when no record with `id` existed.
    fn delete_record(&self, id: i64) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;

    /// Overwrite `kill_time`; `None` when no record with `id` exists.
    fn update_kill_time(
        &self,
        id: i64,
        kill_time: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<BossRecord>, sqlx::Error>> + Send;

    /// Atomically delete every record and insert `records` in their place.
    /// Returns the number of inserted rows.
    fn replace_all(
        &self,
        records: Vec<NewBossRecord>,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

/// Database engine selected by a URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    /// `sqlite:` URLs select SQLite; `postgres://` and `postgresql://` select
    /// PostgreSQL.  Anything else, including a bare file path, is rejected.
    pub fn from_url(url: &str) -> Result<Self, sqlx::Error> {
        if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Backend::Postgres)
        } else {
            // Only the scheme is reported; the rest may carry credentials.
            let scheme = url.split_once(':').map_or("<none>", |(scheme, _)| scheme);
            Err(sqlx::Error::Configuration(
                format!(
                    "unsupported database URL scheme `{scheme}`; \
                     expected `sqlite:`, `postgres://` or `postgresql://`"
                )
                .into(),
            ))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
        }
    }
}

/// Rewrite the short `postgres://` scheme some platforms hand out to the
/// canonical `postgresql://`.
pub fn normalize_database_url(url: &str) -> Cow<'_, str> {
    match url.strip_prefix("postgres://") {
        Some(rest) => Cow::Owned(format!("postgresql://{rest}")),
        None => Cow::Borrowed(url),
    }
}

/// The record store chosen at startup.
#[derive(Clone, Debug)]
pub enum DbStore {
    Sqlite(sqlite::SqliteStore),
    Postgres(postgres::PgStore),
}

impl DbStore {
    /// Connect to `url` with the backend its scheme names and run that
    /// backend's migrations.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let url = normalize_database_url(url.trim());
        match Backend::from_url(&url)? {
            Backend::Sqlite => sqlite::SqliteStore::connect(&url).await.map(DbStore::Sqlite),
            Backend::Postgres => postgres::PgStore::connect(&url).await.map(DbStore::Postgres),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            DbStore::Sqlite(_) => Backend::Sqlite,
            DbStore::Postgres(_) => Backend::Postgres,
        }
    }
}

impl RecordStore for DbStore {
    async fn insert_record(&self, record: NewBossRecord) -> Result<BossRecord, sqlx::Error> {
        match self {
            DbStore::Sqlite(s) => s.insert_record(record).await,
            DbStore::Postgres(s) => s.insert_record(record).await,
        }
    }

    async fn list_records(&self) -> Result<Vec<BossRecord>, sqlx::Error> {
        match self {
            DbStore::Sqlite(s) => s.list_records().await,
            DbStore::Postgres(s) => s.list_records().await,
        }
    }

    async fn get_record(&self, id: i64) -> Result<Option<BossRecord>, sqlx::Error> {
        match self {
            DbStore::Sqlite(s) => s.get_record(id).await,
            DbStore::Postgres(s) => s.get_record(id).await,
        }
    }

    async fn delete_record(&self, id: i64) -> Result<bool, sqlx::Error> {
        match self {
            DbStore::Sqlite(s) => s.delete_record(id).await,
            DbStore::Postgres(s) => s.delete_record(id).await,
        }
    }

    async fn update_kill_time(
        &self,
        id: i64,
        kill_time: DateTime<Utc>,
    ) -> Result<Option<BossRecord>, sqlx::Error> {
        match self {
            DbStore::Sqlite(s) => s.update_kill_time(id, kill_time).await,
            DbStore::Postgres(s) => s.update_kill_time(id, kill_time).await,
        }
    }

    async fn replace_all(&self, records: Vec<NewBossRecord>) -> Result<u64, sqlx::Error> {
        match self {
            DbStore::Sqlite(s) => s.replace_all(records).await,
            DbStore::Postgres(s) => s.replace_all(records).await,
        }
    }
}
