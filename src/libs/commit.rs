//! Commit pipeline: sends a pending move and settles the store.
//!
//! The store lock is taken only before the request (to re-apply on retry) and
//! after the response (to settle), never across the network call. While a
//! commit is in flight the user can keep dragging; a newer drop of the same
//! task makes this commit's response stale.

use super::board::BoardSnapshot;
use super::error::CommitError;
use super::move_task::{MoveRequest, MoveResponse};
use super::optimistic::{PendingCommit, Settlement, SharedStore};
use super::task::{BoardId, MoveIntent, Task, TaskId};
use std::sync::Arc;

/// Network side of the pipeline.
#[allow(async_fn_in_trait)]
pub trait MoveTransport {
    /// Sends one move; resolves to the committed task (with any renumbered
    /// siblings) or a classified error.
    async fn send_move(&self, request: &MoveRequest) -> Result<MoveResponse, CommitError>;

    /// Reads the authoritative state of a board.
    async fn fetch_board(&self, board_id: BoardId) -> Result<BoardSnapshot, CommitError>;
}

/// Result of one commit, from the user's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitReport {
    Committed { task: Task },
    /// The task snapped back to its last committed place.
    RolledBack { intent: MoveIntent, error: CommitError },
    /// Superseded by a newer drop; nothing was changed.
    Stale { task_id: TaskId, version: u64 },
}

impl CommitReport {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitReport::Committed { .. })
    }

    pub fn error(&self) -> Option<&CommitError> {
        match self {
            CommitReport::RolledBack { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The intent can be offered again as-is.
    pub fn retryable_intent(&self) -> Option<&MoveIntent> {
        match self {
            CommitReport::RolledBack { intent, error } if error.is_retryable() => Some(intent),
            _ => None,
        }
    }

    /// The local board is likely out of date and should be refetched.
    pub fn recommends_refetch(&self) -> bool {
        match self {
            CommitReport::RolledBack { error, .. } => error.recommends_refetch(),
            CommitReport::Stale { .. } => true,
            CommitReport::Committed { .. } => false,
        }
    }
}

pub struct CommitPipeline<T> {
    transport: Arc<T>,
    store: SharedStore,
}

impl<T> Clone for CommitPipeline<T> {
    fn clone(&self) -> Self {
        CommitPipeline {
            transport: Arc::clone(&self.transport),
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: MoveTransport> CommitPipeline<T> {
    pub fn new(transport: Arc<T>, store: SharedStore) -> Self {
        CommitPipeline { transport, store }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn commit(&self, pending: PendingCommit) -> CommitReport {
        let request = MoveRequest::from(&pending.intent);
        tracing::debug!(task_id = pending.task_id(), version = pending.version, "sending move");

        let outcome = self.transport.send_move(&request).await;
        let settlement = self.store.lock().settle(&pending, &outcome);

        match (settlement, outcome) {
            (Settlement::Committed(_), Ok(MoveResponse { task, renumbered })) => {
                tracing::info!(
                    task_id = task.id,
                    container = %task.container(),
                    position = task.position,
                    renumbered = renumbered.len(),
                    "move committed"
                );
                CommitReport::Committed { task }
            }
            (Settlement::RolledBack(update), Err(error)) => {
                tracing::warn!(task_id = update.task_id, error = %error, "move rolled back");
                CommitReport::RolledBack {
                    intent: update.intent,
                    error,
                }
            }
            (Settlement::Stale { task_id, version }, _) => {
                tracing::debug!(task_id, version, "stale response discarded");
                CommitReport::Stale { task_id, version }
            }
            // settle() only commits on Ok and only rolls back on Err.
            (_, _) => CommitReport::Stale {
                task_id: pending.task_id(),
                version: pending.version,
            },
        }
    }

    /// Applies `intent` again and commits it. `None` when the task is no
    /// longer on the board.
    pub async fn retry(&self, intent: MoveIntent) -> Option<CommitReport> {
        let pending = self.store.lock().apply_move_immediate(intent)?;
        Some(self.commit(pending).await)
    }

    /// Replaces the store's base with a fresh snapshot; returns the task count.
    pub async fn refresh(&self, board_id: BoardId) -> Result<usize, CommitError> {
        let snapshot = self.transport.fetch_board(board_id).await?;
        let count = snapshot.tasks.len();
        self.store.lock().replace_base(snapshot);
        tracing::debug!(board_id, tasks = count, "board refreshed");
        Ok(count)
    }
}
