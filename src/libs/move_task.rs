//! Server side of a move: validate and apply one relocation atomically.
//!
//! ```text
//! Received ──parse/shape──▶ Validated ──allocate/write──▶ Applied ──▶ Committed
//!                               │
//!                               └──any failure──▶ Rejected (transaction dropped)
//! ```
//!
//! Validation and the write share one `BEGIN IMMEDIATE` transaction. SQLite
//! takes the write lock when the transaction starts, so two moves into the
//! same WIP-limited container are serialized and the second one sees the
//! first one's row when it counts members.

use super::config::BoardConfig;
use super::container::{clamp_index, ContainerRef};
use super::cycle_guard::{CycleCheck, CycleGuard};
use super::error::MoveError;
use super::position::PositionAllocator;
use super::task::{ColumnId, MoveIntent, ParentChange, Placement, SiblingPosition, SprintColumnId, SprintId, Task, TaskId, UserId};
use crate::db::boards::Boards;
use crate::db::containers::Containers;
use crate::db::tasks::Tasks;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Body of `POST /api/tasks/move`.
///
/// No target at all means the board backlog; only `target_sprint_id` means
/// that sprint's backlog. `position` is the requested index among the target
/// container's other members. `parent_id` distinguishes absent (keep the
/// current parent) from `null` (detach).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_column_id: Option<ColumnId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sprint_column_id: Option<SprintColumnId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sprint_id: Option<SprintId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub parent_id: Option<Option<TaskId>>,
}

/// Maps a present field (even `null`) to `Some`; absence stays `None` via `default`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<TaskId>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<TaskId>::deserialize(deserializer).map(Some)
}

impl MoveRequest {
    pub fn parse(body: &[u8]) -> Result<MoveRequest, MoveError> {
        let request: MoveRequest =
            serde_json::from_slice(body).map_err(|e| MoveError::validation(format!("Invalid request body: {}", e)))?;
        request.validate_shape()?;
        Ok(request)
    }

    /// Checks that need no database: positive ids, a single target and a
    /// usable index.
    pub fn validate_shape(&self) -> Result<(), MoveError> {
        if self.task_id <= 0 {
            return Err(MoveError::validation("taskId must be a positive integer"));
        }
        let ids = [
            ("targetColumnId", self.target_column_id),
            ("targetSprintColumnId", self.target_sprint_column_id),
            ("targetSprintId", self.target_sprint_id),
            ("parentId", self.parent_id.flatten()),
        ];
        if let Some((name, _)) = ids.iter().find(|(_, id)| matches!(id, Some(id) if *id <= 0)) {
            return Err(MoveError::validation(format!("{} must be a positive integer", name)));
        }
        if self.target_column_id.is_some() && self.target_sprint_column_id.is_some() {
            return Err(MoveError::validation("Specify either targetColumnId or targetSprintColumnId, not both"));
        }
        if self.target_column_id.is_some() && self.target_sprint_id.is_some() {
            return Err(MoveError::validation("A board column cannot be combined with targetSprintId"));
        }
        if matches!(self.position, Some(position) if position < 0) {
            return Err(MoveError::validation("position must be a non-negative index"));
        }
        Ok(())
    }

    pub fn requested_index(&self) -> Option<usize> {
        self.position.and_then(|position| usize::try_from(position).ok())
    }

    pub fn parent_change(&self) -> ParentChange {
        ParentChange::from_wire(self.parent_id)
    }
}

impl From<&MoveIntent> for MoveRequest {
    fn from(intent: &MoveIntent) -> Self {
        let mut request = MoveRequest {
            task_id: intent.task_id,
            position: intent.requested_index.map(|index| index as i64),
            parent_id: intent.parent.to_wire(),
            ..MoveRequest::default()
        };
        match intent.to {
            ContainerRef::Column { column_id, .. } => request.target_column_id = Some(column_id),
            ContainerRef::SprintColumn {
                sprint_id,
                sprint_column_id,
            } => {
                request.target_sprint_column_id = Some(sprint_column_id);
                request.target_sprint_id = Some(sprint_id);
            }
            ContainerRef::SprintBacklog { sprint_id } => request.target_sprint_id = Some(sprint_id),
            ContainerRef::Backlog { .. } => {}
        }
        request
    }
}

/// Body of a successful move.
///
/// The committed task's fields sit at the top level; `renumbered` lists the
/// siblings a renumbering pass rewrote and is left out when there are none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renumbered: Vec<SiblingPosition>,
}

impl From<Task> for MoveResponse {
    fn from(task: Task) -> Self {
        MoveResponse {
            task,
            renumbered: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStage {
    Received,
    Validated,
    Applied,
    Committed,
    Rejected,
}

impl fmt::Display for MoveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoveStage::Received => "received",
            MoveStage::Validated => "validated",
            MoveStage::Applied => "applied",
            MoveStage::Committed => "committed",
            MoveStage::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Tuning for the move operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveSettings {
    pub allocator: PositionAllocator,
    pub guard: CycleGuard,
}

impl From<&BoardConfig> for MoveSettings {
    fn from(config: &BoardConfig) -> Self {
        MoveSettings {
            allocator: PositionAllocator::new(config.position_step),
            guard: CycleGuard::new(config.max_parent_depth),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// The task as committed.
    pub task: Task,
    /// Container the task left.
    pub previous: ContainerRef,
    /// Siblings rewritten by a renumbering pass, in display order.
    pub renumbered: Vec<SiblingPosition>,
}

impl MoveOutcome {
    pub fn response(&self) -> MoveResponse {
        MoveResponse {
            task: self.task.clone(),
            renumbered: self.renumbered.clone(),
        }
    }
}

/// Runs one move to completion or rejection.
pub fn execute_move(
    conn: &mut Connection,
    actor: UserId,
    request: &MoveRequest,
    settings: &MoveSettings,
) -> Result<MoveOutcome, MoveError> {
    tracing::debug!(task_id = request.task_id, actor, stage = %MoveStage::Received);
    let result = request
        .validate_shape()
        .and_then(|()| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let outcome = validate_and_apply(&tx, actor, request, settings)?;
            tx.commit()?;
            Ok(outcome)
        });

    match &result {
        Ok(outcome) => tracing::info!(
            task_id = outcome.task.id,
            container = %outcome.task.container(),
            position = outcome.task.position,
            stage = %MoveStage::Committed
        ),
        Err(e) => tracing::warn!(task_id = request.task_id, error = %e, stage = %MoveStage::Rejected),
    }
    result
}

fn validate_and_apply(conn: &Connection, actor: UserId, request: &MoveRequest, settings: &MoveSettings) -> Result<MoveOutcome, MoveError> {
    let tasks = Tasks::new(conn);
    let task = tasks.get(request.task_id)?.ok_or_else(|| MoveError::not_found("Task", request.task_id))?;

    let boards = Boards::new(conn);
    let board = boards.get(task.board_id)?.ok_or_else(|| MoveError::not_found("Board", task.board_id))?;
    if !boards.is_member(board.organization_id, actor)? {
        return Err(MoveError::Authorization);
    }

    let containers = Containers::new(conn);
    let target = resolve_target(&containers, &task, request)?;
    let parent_id = resolve_parent(&tasks, &task, request.parent_change(), &settings.guard)?;

    let previous = task.container();
    let container = containers.load(&target)?;
    // A reorder inside the same container never changes its occupancy.
    if previous != target {
        container.check_capacity(task.id)?;
    }
    tracing::debug!(task_id = task.id, container = %target, stage = %MoveStage::Validated);

    let siblings: Vec<Task> = tasks.members(&target)?.into_iter().filter(|member| member.id != task.id).collect();
    let index = clamp_index(request.requested_index(), siblings.len());
    let current_index = container.members.iter().position(|&id| id == task.id);

    let mut renumbered = Vec::new();
    let position = if previous == target && current_index == Some(index) {
        // Already in place: a re-sent move leaves the position untouched.
        task.position
    } else {
        let positions: Vec<f64> = siblings.iter().map(|sibling| sibling.position).collect();
        let placed = settings.allocator.place(&positions, Some(index));
        if let Some(fresh) = placed.renumbered {
            let updates: Vec<(TaskId, f64)> = siblings.iter().map(|sibling| sibling.id).zip(fresh).collect();
            tasks.update_positions(&updates)?;
            tracing::debug!(container = %target, renumbered = updates.len(), "container renumbered");
            renumbered = updates
                .into_iter()
                .map(|(task_id, position)| SiblingPosition { task_id, position })
                .collect();
        }
        placed.position
    };

    tasks.update_placement(task.id, &Placement::new(target, parent_id, position))?;
    tracing::debug!(task_id = task.id, position, stage = %MoveStage::Applied);

    let task = tasks.get(task.id)?.ok_or_else(|| MoveError::not_found("Task", request.task_id))?;
    Ok(MoveOutcome { task, previous, renumbered })
}

fn resolve_target(containers: &Containers, task: &Task, request: &MoveRequest) -> Result<ContainerRef, MoveError> {
    if let Some(column_id) = request.target_column_id {
        let column = containers.get_column(column_id)?.ok_or_else(|| MoveError::not_found("Column", column_id))?;
        if column.board_id != task.board_id {
            return Err(MoveError::validation("Target column belongs to a different board"));
        }
        return Ok(ContainerRef::Column {
            board_id: task.board_id,
            column_id,
        });
    }

    if let Some(sprint_column_id) = request.target_sprint_column_id {
        let column = containers
            .get_sprint_column(sprint_column_id)?
            .ok_or_else(|| MoveError::not_found("Sprint column", sprint_column_id))?;
        if let Some(sprint_id) = request.target_sprint_id {
            if sprint_id != column.sprint_id {
                return Err(MoveError::validation(format!("Sprint column does not belong to sprint {}", sprint_id)));
            }
        }
        let sprint = containers
            .get_sprint(column.sprint_id)?
            .ok_or_else(|| MoveError::not_found("Sprint", column.sprint_id))?;
        if sprint.board_id != task.board_id {
            return Err(MoveError::validation("Target sprint belongs to a different board"));
        }
        return Ok(ContainerRef::SprintColumn {
            sprint_id: sprint.id,
            sprint_column_id,
        });
    }

    if let Some(sprint_id) = request.target_sprint_id {
        let sprint = containers.get_sprint(sprint_id)?.ok_or_else(|| MoveError::not_found("Sprint", sprint_id))?;
        if sprint.board_id != task.board_id {
            return Err(MoveError::validation("Target sprint belongs to a different board"));
        }
        return Ok(ContainerRef::SprintBacklog { sprint_id });
    }

    Ok(ContainerRef::Backlog { board_id: task.board_id })
}

fn resolve_parent(tasks: &Tasks, task: &Task, change: ParentChange, guard: &CycleGuard) -> Result<Option<TaskId>, MoveError> {
    let parent_id = match change {
        ParentChange::Keep => return Ok(task.parent_id),
        ParentChange::Clear => return Ok(None),
        ParentChange::Set(parent_id) => parent_id,
    };

    let parent = tasks.get(parent_id)?.ok_or_else(|| MoveError::not_found("Parent task", parent_id))?;
    if parent.board_id != task.board_id {
        return Err(MoveError::validation("Parent task belongs to a different board"));
    }

    match guard.check(tasks, task.id, parent_id)? {
        CycleCheck::Cycle => Err(MoveError::CycleDetected),
        CycleCheck::AlreadyChild | CycleCheck::Acyclic => Ok(Some(parent_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_field_distinguishes_absent_and_null() {
        let absent = MoveRequest::parse(br#"{"taskId": 1}"#).unwrap();
        assert_eq!(absent.parent_change(), ParentChange::Keep);

        let cleared = MoveRequest::parse(br#"{"taskId": 1, "parentId": null}"#).unwrap();
        assert_eq!(cleared.parent_change(), ParentChange::Clear);

        let nested = MoveRequest::parse(br#"{"taskId": 1, "parentId": 7}"#).unwrap();
        assert_eq!(nested.parent_change(), ParentChange::Set(7));
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(MoveRequest::parse(b"not json").is_err());
        assert!(MoveRequest::parse(br#"{"taskId": 0}"#).is_err());
        assert!(MoveRequest::parse(br#"{"taskId": 1, "position": -1}"#).is_err());
        assert!(MoveRequest::parse(br#"{"taskId": 1, "targetColumnId": 2, "targetSprintColumnId": 3}"#).is_err());
        assert!(MoveRequest::parse(br#"{"taskId": 1, "targetColumnId": 2, "targetSprintId": 3}"#).is_err());
        assert!(MoveRequest::parse(br#"{"taskId": 1, "parentId": -4}"#).is_err());
    }

    #[test]
    fn request_from_intent_names_the_target() {
        let intent = MoveIntent::new(
            5,
            ContainerRef::Backlog { board_id: 1 },
            ContainerRef::SprintColumn {
                sprint_id: 2,
                sprint_column_id: 3,
            },
            Some(1),
        );
        let request = MoveRequest::from(&intent);
        assert_eq!(request.target_sprint_column_id, Some(3));
        assert_eq!(request.target_sprint_id, Some(2));
        assert_eq!(request.position, Some(1));
        assert_eq!(request.parent_id, None);

        let json = serde_json::to_value(&MoveRequest::from(&intent.with_parent(ParentChange::Clear))).unwrap();
        assert_eq!(json["parentId"], serde_json::Value::Null);
        assert!(json.as_object().unwrap().contains_key("parentId"));
    }
}
