//! A board session: everything the client needs while one board is open.
//!
//! The session owns the optimistic store for that board and shares it with
//! its drag controller and commit pipeline. It is created when the board view
//! opens and dropped when the view closes; nothing outlives it.

use super::board::{BoardInvalidation, BoardSnapshot};
use super::commit::{CommitPipeline, CommitReport, MoveTransport};
use super::drag::{DragData, DragError, DragSessionController, DragSource, Prospect};
use super::error::CommitError;
use super::optimistic::{OptimisticStore, PendingCommit, SharedStore};
use super::move_task::MoveSettings;
use super::task::{BoardId, MoveIntent, Task};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct BoardSession<T> {
    board_id: BoardId,
    store: SharedStore,
    drag: DragSessionController,
    pipeline: CommitPipeline<T>,
}

impl<T: MoveTransport> BoardSession<T> {
    /// Fetches the board and opens a session on it. `settings` should match
    /// the server's so that projected positions and nesting hints agree.
    pub async fn open(transport: T, board_id: BoardId, settings: MoveSettings) -> Result<Self, CommitError> {
        let snapshot = transport.fetch_board(board_id).await?;
        Ok(Self::from_snapshot(transport, snapshot, settings))
    }

    pub fn from_snapshot(transport: T, snapshot: BoardSnapshot, settings: MoveSettings) -> Self {
        let board_id = snapshot.board_id;
        let store = OptimisticStore::new(snapshot, settings.allocator).with_guard(settings.guard);
        let store: SharedStore = Arc::new(Mutex::new(store));
        tracing::debug!(board_id, "board session opened");

        BoardSession {
            board_id,
            drag: DragSessionController::new(Arc::clone(&store)),
            pipeline: CommitPipeline::new(Arc::new(transport), Arc::clone(&store)),
            store,
        }
    }

    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// A handle for committing moves while the session keeps handling drags.
    pub fn pipeline(&self) -> CommitPipeline<T> {
        self.pipeline.clone()
    }

    pub fn projected_tasks(&self) -> Vec<Task> {
        self.store.lock().projected_tasks()
    }

    pub fn drag_start(&mut self, source: &DragData) -> Result<DragSource, DragError> {
        self.drag.start(source)
    }

    pub fn drag_over(&self, target: &DragData, index: Option<usize>) -> Result<Prospect, DragError> {
        self.drag.over(target, index)
    }

    /// Ends the drag. See [`DragSessionController::drop`].
    pub fn drop_at(&mut self, target: Option<&DragData>, index: Option<usize>) -> Result<Option<PendingCommit>, DragError> {
        self.drag.drop(target, index)
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel()
    }

    pub async fn commit(&self, pending: PendingCommit) -> CommitReport {
        self.pipeline.commit(pending).await
    }

    pub async fn retry(&self, intent: MoveIntent) -> Option<CommitReport> {
        self.pipeline.retry(intent).await
    }

    pub async fn refresh(&self) -> Result<usize, CommitError> {
        self.pipeline.refresh(self.board_id).await
    }

    /// Reacts to a server-side change. Returns whether the board was reloaded.
    pub async fn on_invalidation(&self, invalidation: &BoardInvalidation) -> Result<bool, CommitError> {
        if invalidation.board_id != self.board_id {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }
}

impl<T> Drop for BoardSession<T> {
    fn drop(&mut self) {
        let pending = self.store.lock().pending_count();
        if pending > 0 {
            tracing::debug!(board_id = self.board_id, pending, "board session closed with moves in flight");
        } else {
            tracing::debug!(board_id = self.board_id, "board session closed");
        }
    }
}
