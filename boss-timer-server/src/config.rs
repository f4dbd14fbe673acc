//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;

/// Runtime configuration for boss-timer-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// Database URL (default: `"sqlite://boss_timer.db"`).
    /// `sqlite:` URLs create the file on first start; `postgres://` and
    /// `postgresql://` URLs connect to PostgreSQL.
    pub database_url: String,

    /// Boss catalog TOML file. `None` uses the catalog compiled into the binary.
    pub catalog_path: Option<PathBuf>,

    /// Minutes past the guaranteed spawn after which a listing pass drops the
    /// record from the store.
    pub expire_after_mins: u32,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// When set, logs go to a daily-rolling file in this directory instead of stdout.
    pub log_dir: Option<PathBuf>,

    /// Serve Swagger UI at `/swagger-ui` and the document at `/api-docs/openapi.json`.
    pub enable_swagger: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_owned(),
            database_url: "sqlite://boss_timer.db".to_owned(),
            catalog_path: None,
            expire_after_mins: 180,
            log_level: "info".to_owned(),
            log_json: false,
            log_dir: None,
            enable_swagger: true,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env_or("BOSS_TIMER_BIND", &defaults.bind_address),
            // Hosting platforms commonly inject a bare DATABASE_URL.
            database_url: std::env::var("BOSS_TIMER_DATABASE_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .unwrap_or(defaults.database_url),
            catalog_path: std::env::var_os("BOSS_TIMER_CATALOG").map(PathBuf::from),
            expire_after_mins: parse_env("BOSS_TIMER_EXPIRE_AFTER_MINS", defaults.expire_after_mins),
            log_level: env_or("BOSS_TIMER_LOG", &defaults.log_level),
            log_json: parse_flag("BOSS_TIMER_LOG_JSON", defaults.log_json),
            log_dir: std::env::var_os("BOSS_TIMER_LOG_DIR").map(PathBuf::from),
            enable_swagger: parse_flag("BOSS_TIMER_ENABLE_SWAGGER", defaults.enable_swagger),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| flag_value(&v))
        .unwrap_or(default)
}

fn flag_value(raw: &str) -> bool {
    let v = raw.trim();
    v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
}
