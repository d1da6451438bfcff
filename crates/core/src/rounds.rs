// crates/core/src/rounds.rs
//! Typed "round completed" events from a game engine to the session log.
//!
//! The engine side holds a cloneable [`RoundEmitter`]; the page or session
//! scope that mounted the game owns the matching [`RoundListener`] and runs it
//! against a [`SessionSink`]. Nothing here is process-wide: each mounted view
//! gets its own channel, and the listener stops once every emitter is gone.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{GameSession, NewGameSession};

/// Emitted once by the engine when a round ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundCompleted {
    /// Engine-assigned id; repeated ids are forwarded only once.
    pub round_id: Uuid,
    pub session: NewGameSession,
}

impl RoundCompleted {
    pub fn new(session: NewGameSession) -> Self {
        Self {
            round_id: Uuid::new_v4(),
            session,
        }
    }
}

/// Destination for completed rounds, usually the session table.
#[async_trait]
pub trait SessionSink: Send + Sync {
    async fn record_round(&self, session: NewGameSession) -> Result<GameSession, StoreError>;
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("round listener has shut down")]
    Closed(RoundCompleted),

    #[error("round queue is full")]
    Full(RoundCompleted),
}

/// Engine-side handle.
#[derive(Debug, Clone)]
pub struct RoundEmitter {
    tx: mpsc::Sender<RoundCompleted>,
}

impl RoundEmitter {
    /// Queue a round, waiting for space if the listener is behind.
    pub async fn emit(&self, event: RoundCompleted) -> Result<(), EmitError> {
        self.tx
            .send(event)
            .await
            .map_err(|mpsc::error::SendError(ev)| EmitError::Closed(ev))
    }

    /// Queue a round without waiting; for callers on a render loop.
    pub fn try_emit(&self, event: RoundCompleted) -> Result<(), EmitError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(ev) => EmitError::Full(ev),
            mpsc::error::TrySendError::Closed(ev) => EmitError::Closed(ev),
        })
    }
}

/// Counts reported when a listener finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenerReport {
    pub forwarded: u64,
    pub duplicates: u64,
    pub failed: u64,
}

/// Round ids remembered for duplicate detection. Duplicates come from
/// engines racing on the same round, so only recent ids matter.
pub const DEDUP_WINDOW: usize = 1024;

/// The last `capacity` distinct round ids, oldest evicted first.
#[derive(Debug)]
struct RecentIds {
    capacity: usize,
    ids: HashSet<Uuid>,
    order: VecDeque<Uuid>,
}

impl RecentIds {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            ids: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// `false` if `id` is still in the window.
    fn insert(&mut self, id: Uuid) -> bool {
        if !self.ids.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        true
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Scope-owned receiving end.
#[derive(Debug)]
pub struct RoundListener {
    rx: mpsc::Receiver<RoundCompleted>,
    seen: RecentIds,
}

impl RoundListener {
    /// Forward rounds to `sink` until every emitter is dropped or
    /// [`RoundListener::close`] is called and the queue drains.
    pub async fn run<S>(mut self, sink: &S) -> ListenerReport
    where
        S: SessionSink + ?Sized,
    {
        let mut report = ListenerReport::default();

        while let Some(event) = self.rx.recv().await {
            if !self.seen.insert(event.round_id) {
                report.duplicates += 1;
                tracing::debug!(round_id = %event.round_id, "Dropping duplicate round");
                continue;
            }

            let user_id = event.session.user_id.clone();
            let domain = event.session.domain;
            match sink.record_round(event.session).await {
                Ok(stored) => {
                    report.forwarded += 1;
                    tracing::debug!(
                        round_id = %event.round_id,
                        session_id = %stored.id,
                        user_id = %user_id,
                        domain = %domain,
                        "Round recorded"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        round_id = %event.round_id,
                        user_id = %user_id,
                        domain = %domain,
                        error = %e,
                        "Failed to record round"
                    );
                }
            }
        }

        report
    }

    /// Stop accepting new rounds; already-queued rounds are still forwarded.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Create a bounded emitter/listener pair for one mounted game view.
pub fn round_channel(capacity: usize) -> (RoundEmitter, RoundListener) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        RoundEmitter { tx },
        RoundListener {
            rx,
            seen: RecentIds::new(DEDUP_WINDOW),
        },
    )
}
