// crates/db/src/store.rs
// Core storage traits backed by the SQLite database.

use async_trait::async_trait;
use cogtrain_core::{
    Domain, DomainPerformance, GameSession, NewGameSession, Period, SessionSink, SessionStore,
    StoreError, SummaryKey, SummaryRepository,
};

use crate::{Database, DbError};

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        StoreError::backend(err)
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn sessions_in_window(
        &self,
        user_id: &str,
        domain: Domain,
        period: &Period,
    ) -> Result<Vec<GameSession>, StoreError> {
        Ok(Database::sessions_in_window(self, user_id, domain, period).await?)
    }
}

#[async_trait]
impl SummaryRepository for Database {
    async fn get_summary(
        &self,
        key: &SummaryKey,
    ) -> Result<Option<DomainPerformance>, StoreError> {
        Ok(self.get_domain_performance(key).await?)
    }

    async fn upsert_summary(
        &self,
        summary: &DomainPerformance,
    ) -> Result<DomainPerformance, StoreError> {
        Ok(self.upsert_domain_performance(summary).await?)
    }
}

#[async_trait]
impl SessionSink for Database {
    async fn record_round(&self, session: NewGameSession) -> Result<GameSession, StoreError> {
        Ok(self.insert_game_session(&session).await?)
    }
}
