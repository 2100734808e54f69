//! Drag session controller: turns a pointer gesture into one move.
//!
//! ```text
//! Idle ──start──▶ Dragging ──drop(target)──▶ Dropped ──▶ Idle
//!                    │  ▲
//!                    │  └── over(target): preview only
//!                    └──── cancel / drop(outside) ──▶ Idle
//! ```
//!
//! Drag payloads arrive as JSON from the UI layer and are parsed once into
//! [`DragData`]. Only a drop touches the store; hovering never does.

use super::container::{clamp_index, ContainerRef};
use super::messages::Message;
use super::optimistic::{PendingCommit, SharedStore};
use super::task::{ColumnId, MoveIntent, ParentChange, SprintColumnId, SprintId, TaskId};
use crate::msg_debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload attached to a draggable item or a drop zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum DragData {
    /// A task card. As a drop target it means "nest under this task".
    Task {
        task_id: TaskId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sprint_id: Option<SprintId>,
    },
    SprintColumn { sprint_id: SprintId, column_id: SprintColumnId },
    /// The board backlog.
    Backlog,
    /// A sprint header; dropping here lands in the sprint backlog.
    Sprint { sprint_id: SprintId },
    Column { column_id: ColumnId },
}

impl DragData {
    pub fn parse(payload: &str) -> Result<DragData, DragError> {
        serde_json::from_str(payload).map_err(|e| DragError::InvalidPayload(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    #[error("Invalid drag payload: {0}")]
    InvalidPayload(String),

    #[error("Only tasks can be dragged")]
    NotATask,

    #[error("Task {0} is not on this board")]
    UnknownTask(TaskId),

    #[error("No drag in progress")]
    NotDragging,

    #[error("A task cannot be nested under itself")]
    SelfNesting,
}

/// What is being dragged and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSource {
    pub task_id: TaskId,
    pub from: ContainerRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Dragging(DragSource),
    Dropped(MoveIntent),
}

/// Preview of a drop at the hovered target.
#[derive(Debug, Clone, PartialEq)]
pub struct Prospect {
    pub container: ContainerRef,
    pub index: usize,
    pub wip_limit: Option<u32>,
    /// Client-side hint only; the server re-checks on commit.
    pub can_accept: bool,
    pub nest_under: Option<TaskId>,
    /// Client-side hint only.
    pub would_create_cycle: bool,
}

pub struct DragSessionController {
    store: SharedStore,
    state: DragState,
}

impl DragSessionController {
    pub fn new(store: SharedStore) -> Self {
        DragSessionController {
            store,
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Captures the dragged task. Does not touch the store.
    pub fn start(&mut self, source: &DragData) -> Result<DragSource, DragError> {
        let task_id = match source {
            DragData::Task { task_id, .. } => *task_id,
            _ => return Err(DragError::NotATask),
        };
        let from = self
            .store
            .lock()
            .projected_task(task_id)
            .map(|task| task.container())
            .ok_or(DragError::UnknownTask(task_id))?;

        let source = DragSource { task_id, from };
        self.state = DragState::Dragging(source);
        msg_debug!(Message::DragStarted(task_id));
        Ok(source)
    }

    /// Previews a drop on `target` at `index`.
    pub fn over(&self, target: &DragData, index: Option<usize>) -> Result<Prospect, DragError> {
        let source = self.source()?;
        let (intent, _) = self.intent_for(source, target, index)?;

        let store = self.store.lock();
        let container = store.container(&intent.to);
        let siblings = container.siblings_excluding(source.task_id).len();
        let nest_under = match intent.parent {
            ParentChange::Set(parent_id) => Some(parent_id),
            _ => None,
        };

        Ok(Prospect {
            container: intent.to,
            index: clamp_index(intent.requested_index, siblings),
            wip_limit: container.wip_limit,
            can_accept: !intent.changes_container() || container.can_accept(source.task_id),
            nest_under,
            would_create_cycle: nest_under.is_some_and(|parent_id| store.would_create_cycle(source.task_id, parent_id)),
        })
    }

    /// Ends the gesture. With a valid target the move is applied to the store
    /// right away and the pending commit is returned for the pipeline.
    ///
    /// `None` as target means the pointer was released outside every drop
    /// zone: the drag ends without any effect.
    pub fn drop(&mut self, target: Option<&DragData>, index: Option<usize>) -> Result<Option<PendingCommit>, DragError> {
        let source = self.source()?;

        let target = match target {
            Some(target) => target,
            None => {
                msg_debug!(Message::DropOutsideTargets(source.task_id));
                self.state = DragState::Idle;
                return Ok(None);
            }
        };

        let (intent, unchanged) = match self.intent_for(source, target, index) {
            Ok(resolved) => resolved,
            Err(e) => {
                msg_debug!(Message::DropTargetInvalid(e.to_string()));
                self.state = DragState::Idle;
                return Err(e);
            }
        };
        if unchanged {
            self.state = DragState::Idle;
            return Ok(None);
        }

        self.state = DragState::Dropped(intent.clone());
        let pending = self.store.lock().apply_move_immediate(intent);
        self.state = DragState::Idle;

        match &pending {
            Some(pending) => tracing::debug!(task_id = pending.task_id(), version = pending.version, "drop applied"),
            None => msg_debug!(Message::TaskNotOnBoard(source.task_id)),
        }
        Ok(pending)
    }

    /// Abandons the drag without any effect.
    pub fn cancel(&mut self) {
        if let DragState::Dragging(source) = self.state {
            msg_debug!(Message::DragCancelled(source.task_id));
        }
        self.state = DragState::Idle;
    }

    fn source(&self) -> Result<DragSource, DragError> {
        match self.state {
            DragState::Dragging(source) => Ok(source),
            _ => Err(DragError::NotDragging),
        }
    }

    /// Builds the intent for a drop on `target`, and whether it would leave
    /// the task exactly where it is.
    fn intent_for(&self, source: DragSource, target: &DragData, index: Option<usize>) -> Result<(MoveIntent, bool), DragError> {
        let store = self.store.lock();
        let current = store
            .projected_task(source.task_id)
            .ok_or(DragError::UnknownTask(source.task_id))?;
        let from = current.container();
        let board_id = store.board_id();

        let intent = match *target {
            DragData::Task { task_id, .. } => {
                if task_id == source.task_id {
                    return Err(DragError::SelfNesting);
                }
                if store.projected_task(task_id).is_none() {
                    return Err(DragError::UnknownTask(task_id));
                }
                // Nesting keeps the task where it is.
                MoveIntent::new(source.task_id, from, from, store.index_of(source.task_id)).with_parent(ParentChange::Set(task_id))
            }
            DragData::SprintColumn { sprint_id, column_id } => MoveIntent::new(
                source.task_id,
                from,
                ContainerRef::SprintColumn {
                    sprint_id,
                    sprint_column_id: column_id,
                },
                index,
            ),
            DragData::Backlog => MoveIntent::new(source.task_id, from, ContainerRef::Backlog { board_id }, index),
            DragData::Sprint { sprint_id } => MoveIntent::new(source.task_id, from, ContainerRef::SprintBacklog { sprint_id }, index),
            DragData::Column { column_id } => MoveIntent::new(source.task_id, from, ContainerRef::Column { board_id, column_id }, index),
        };

        let unchanged = match intent.parent {
            ParentChange::Set(parent_id) => current.parent_id == Some(parent_id),
            _ => {
                let siblings = store.container(&intent.to).siblings_excluding(source.task_id).len();
                !intent.changes_container() && store.index_of(source.task_id) == Some(clamp_index(intent.requested_index, siblings))
            }
        };
        Ok((intent, unchanged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::board::{BoardSnapshot, ContainerLimit};
    use crate::libs::optimistic::OptimisticStore;
    use crate::libs::position::PositionAllocator;
    use crate::libs::task::Task;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn task(id: TaskId, column_id: ColumnId, position: f64) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            board_id: 1,
            column_id: Some(column_id),
            sprint_id: None,
            sprint_column_id: None,
            parent_id: None,
            position,
            created_at: format!("2026-01-01 00:00:00.{:03}", id),
            updated_at: String::new(),
        }
    }

    fn controller() -> (SharedStore, DragSessionController) {
        let snapshot = BoardSnapshot {
            board_id: 1,
            tasks: vec![task(1, 10, 1.0), task(2, 20, 1.0), task(3, 20, 2.0)],
            limits: vec![ContainerLimit {
                container: ContainerRef::Column { board_id: 1, column_id: 20 },
                wip_limit: 2,
            }],
        };
        let store = Arc::new(Mutex::new(OptimisticStore::new(snapshot, PositionAllocator::default())));
        (store.clone(), DragSessionController::new(store))
    }

    #[test]
    fn payloads_parse_from_tagged_json() {
        assert_eq!(
            DragData::parse(r#"{"type":"sprint-column","sprintId":4,"columnId":9}"#).unwrap(),
            DragData::SprintColumn { sprint_id: 4, column_id: 9 }
        );
        assert_eq!(DragData::parse(r#"{"type":"backlog"}"#).unwrap(), DragData::Backlog);
        assert!(matches!(DragData::parse(r#"{"type":"lane"}"#), Err(DragError::InvalidPayload(_))));
    }

    #[test]
    fn only_tasks_start_a_drag() {
        let (_, mut drag) = controller();
        assert_eq!(drag.start(&DragData::Backlog), Err(DragError::NotATask));
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn hovering_never_mutates_the_store() {
        let (store, mut drag) = controller();
        drag.start(&DragData::Task { task_id: 1, sprint_id: None }).unwrap();

        let prospect = drag.over(&DragData::Column { column_id: 20 }, Some(0)).unwrap();
        assert!(!prospect.can_accept);
        assert_eq!(prospect.wip_limit, Some(2));
        assert_eq!(store.lock().pending_count(), 0);
        assert_eq!(store.lock().version(), 0);
    }

    #[test]
    fn drop_applies_and_returns_to_idle() {
        let (store, mut drag) = controller();
        drag.start(&DragData::Task { task_id: 1, sprint_id: None }).unwrap();

        let pending = drag.drop(Some(&DragData::Column { column_id: 20 }), Some(1)).unwrap().unwrap();
        assert_eq!(pending.intent.to, ContainerRef::Column { board_id: 1, column_id: 20 });
        assert_eq!(drag.state(), &DragState::Idle);

        let members: Vec<TaskId> = store
            .lock()
            .container_members(&ContainerRef::Column { board_id: 1, column_id: 20 })
            .iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(members, vec![2, 1, 3]);
    }

    #[test]
    fn drop_outside_targets_has_no_effect() {
        let (store, mut drag) = controller();
        drag.start(&DragData::Task { task_id: 1, sprint_id: None }).unwrap();
        assert_eq!(drag.drop(None, None).unwrap(), None);
        assert_eq!(store.lock().pending_count(), 0);
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn cancel_discards_the_drag() {
        let (store, mut drag) = controller();
        drag.start(&DragData::Task { task_id: 1, sprint_id: None }).unwrap();
        drag.cancel();
        assert_eq!(drag.drop(Some(&DragData::Backlog), None), Err(DragError::NotDragging));
        assert_eq!(store.lock().pending_count(), 0);
    }

    #[test]
    fn nesting_keeps_container_and_sets_parent() {
        let (store, mut drag) = controller();
        drag.start(&DragData::Task { task_id: 3, sprint_id: None }).unwrap();

        let pending = drag.drop(Some(&DragData::Task { task_id: 1, sprint_id: None }), None).unwrap().unwrap();
        assert_eq!(pending.intent.parent, ParentChange::Set(1));
        assert!(!pending.intent.changes_container());
        assert_eq!(store.lock().projected_task(3).unwrap().parent_id, Some(1));
    }

    #[test]
    fn nesting_under_itself_is_rejected() {
        let (_, mut drag) = controller();
        drag.start(&DragData::Task { task_id: 3, sprint_id: None }).unwrap();
        assert_eq!(
            drag.drop(Some(&DragData::Task { task_id: 3, sprint_id: None }), None),
            Err(DragError::SelfNesting)
        );
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn dropping_in_place_creates_no_record() {
        let (store, mut drag) = controller();
        drag.start(&DragData::Task { task_id: 3, sprint_id: None }).unwrap();
        assert_eq!(drag.drop(Some(&DragData::Column { column_id: 20 }), None).unwrap(), None);
        assert_eq!(store.lock().pending_count(), 0);
    }
}
