// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use cogtrain_core::{SessionStore, SummaryRepository};
use cogtrain_db::Database;

use crate::auth::Authenticator;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Database handle for session writes and the records API.
    pub db: Database,
    /// Session reads used by aggregation.
    pub sessions: Arc<dyn SessionStore>,
    /// Summary rows used by aggregation and the read API.
    pub summaries: Arc<dyn SummaryRepository>,
    pub auth: Authenticator,
}

impl AppState {
    /// State with aggregation backed by `db`.
    pub fn new(db: Database, auth: Authenticator) -> Arc<Self> {
        let store = Arc::new(db.clone());
        Self::with_stores(db, auth, store.clone(), store)
    }

    /// State with aggregation backed by explicit stores.
    pub fn with_stores(
        db: Database,
        auth: Authenticator,
        sessions: Arc<dyn SessionStore>,
        summaries: Arc<dyn SummaryRepository>,
    ) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            sessions,
            summaries,
            auth,
        })
    }

    /// Seconds since the server started.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
