//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::catalog::BossCatalog;
use crate::config::Config;
use crate::db::DbStore;
use crate::services::TimerService;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Boss catalog loaded at startup.
    pub catalog: Arc<BossCatalog>,
    /// Timer operations over the persistent record store.
    pub timers: Arc<TimerService<DbStore>>,
}

impl AppState {
    pub fn new(config: Config, catalog: BossCatalog, store: DbStore) -> Self {
        let catalog = Arc::new(catalog);
        let timers = TimerService::new(Arc::new(store), Arc::clone(&catalog), config.expire_after_mins);
        Self {
            config: Arc::new(config),
            catalog,
            timers: Arc::new(timers),
        }
    }
}
