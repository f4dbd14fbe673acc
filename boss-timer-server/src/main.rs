//! boss-timer-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON or pretty, stdout or rolling file).
//! 3. Load the boss catalog.
//! 4. Open the SQLite or PostgreSQL database and run pending migrations.
//! 5. Build the Axum router and start the HTTP server with graceful shutdown.

mod catalog;
mod config;
mod db;
mod error;
mod middleware;
mod routes;
mod schemas;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::catalog::BossCatalog;
use crate::config::Config;
use crate::db::DbStore;
use crate::state::AppState;

const LOG_FILE_PREFIX: &str = "boss-timer-server.log";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    // Held until exit so buffered file output is flushed.
    let _log_guard = init_tracing(&cfg);
    info!(version = env!("CARGO_PKG_VERSION"), "boss-timer-server starting");

    // ── 3. Boss catalog ────────────────────────────────────────────────────────
    let catalog = BossCatalog::load(cfg.catalog_path.as_deref())?;
    info!(
        bosses = catalog.len(),
        source = %cfg.catalog_path.as_ref().map_or_else(|| String::from("embedded"), |p| p.display().to_string()),
        "boss catalog loaded"
    );

    // ── 4. Database ────────────────────────────────────────────────────────────
    // The URL may carry credentials, so only the backend is logged.
    let store = DbStore::connect(&cfg.database_url).await?;
    info!(backend = store.backend().as_str(), "database ready");

    // ── 5. HTTP server with graceful shutdown ──────────────────────────────────
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let state = Arc::new(AppState::new(cfg, catalog, store));
    let app = routes::build(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("boss-timer-server stopped");
    Ok(())
}

/// Install the global subscriber. Returns the file writer's guard when
/// logging to `cfg.log_dir`.
fn init_tracing(cfg: &Config) -> Option<WorkerGuard> {
    // Build the log-level filter, warning loudly if the configured value is
    // not a valid tracing filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: BOSS_TIMER_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    match &cfg.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let subscriber = subscriber.with_writer(writer).with_ansi(false);
            if cfg.log_json {
                subscriber.json().init();
            } else {
                subscriber.init();
            }
            Some(guard)
        }
        None => {
            if cfg.log_json {
                subscriber.json().init();
            } else {
                subscriber.init();
            }
            None
        }
    }
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => { s.recv().await; }
            Err(e)    => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c   => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
