//! Containers: the ordered groupings a task can live in.
//!
//! A task sits in exactly one container, derived from its placement fields:
//!
//! | column_id | sprint_id | sprint_column_id | container                 |
//! |-----------|-----------|------------------|---------------------------|
//! | set       | -         | -                | board column              |
//! | null      | set       | set              | sprint column             |
//! | null      | set       | null             | sprint backlog            |
//! | null      | null      | -                | board backlog             |
//!
//! Columns and sprint columns may carry a WIP limit; backlogs never do.

use super::task::{BoardId, ColumnId, SprintColumnId, SprintId, Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ContainerRef {
    Column { board_id: BoardId, column_id: ColumnId },
    SprintColumn { sprint_id: SprintId, sprint_column_id: SprintColumnId },
    SprintBacklog { sprint_id: SprintId },
    Backlog { board_id: BoardId },
}

impl ContainerRef {
    pub fn of(task: &Task) -> Self {
        match (task.column_id, task.sprint_id, task.sprint_column_id) {
            (Some(column_id), _, _) => ContainerRef::Column {
                board_id: task.board_id,
                column_id,
            },
            (None, Some(sprint_id), Some(sprint_column_id)) => ContainerRef::SprintColumn {
                sprint_id,
                sprint_column_id,
            },
            (None, Some(sprint_id), None) => ContainerRef::SprintBacklog { sprint_id },
            // A sprint column without its sprint is unreachable through the move
            // operation; such a row is shown in the board backlog.
            (None, None, _) => ContainerRef::Backlog { board_id: task.board_id },
        }
    }

    /// `(column_id, sprint_id, sprint_column_id)` as written to the task row.
    pub fn fields(&self) -> (Option<ColumnId>, Option<SprintId>, Option<SprintColumnId>) {
        match *self {
            ContainerRef::Column { column_id, .. } => (Some(column_id), None, None),
            ContainerRef::SprintColumn {
                sprint_id,
                sprint_column_id,
            } => (None, Some(sprint_id), Some(sprint_column_id)),
            ContainerRef::SprintBacklog { sprint_id } => (None, Some(sprint_id), None),
            ContainerRef::Backlog { .. } => (None, None, None),
        }
    }

    /// Whether this container can carry a WIP limit at all.
    pub fn is_limitable(&self) -> bool {
        matches!(self, ContainerRef::Column { .. } | ContainerRef::SprintColumn { .. })
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerRef::Column { column_id, .. } => write!(f, "column {}", column_id),
            ContainerRef::SprintColumn {
                sprint_id,
                sprint_column_id,
            } => write!(f, "sprint {} column {}", sprint_id, sprint_column_id),
            ContainerRef::SprintBacklog { sprint_id } => write!(f, "sprint {} backlog", sprint_id),
            ContainerRef::Backlog { board_id } => write!(f, "board {} backlog", board_id),
        }
    }
}

/// Raised when a container is already at its WIP limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Column has reached its WIP limit of {limit}")]
pub struct CapacityExceeded {
    pub limit: u32,
    pub count: usize,
}

/// A container with its current members in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub reference: ContainerRef,
    pub wip_limit: Option<u32>,
    pub members: Vec<TaskId>,
}

impl Container {
    pub fn new(reference: ContainerRef, wip_limit: Option<u32>, members: Vec<TaskId>) -> Self {
        Container {
            reference,
            wip_limit,
            members,
        }
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.members.contains(&task_id)
    }

    /// Member count with `task_id` taken out when it is already a member.
    pub fn occupancy_excluding(&self, task_id: TaskId) -> usize {
        self.members.iter().filter(|&&id| id != task_id).count()
    }

    /// True when `task_id` may be placed here without exceeding the limit.
    pub fn can_accept(&self, task_id: TaskId) -> bool {
        self.check_capacity(task_id).is_ok()
    }

    pub fn check_capacity(&self, task_id: TaskId) -> Result<(), CapacityExceeded> {
        match self.wip_limit {
            Some(limit) => {
                let count = self.occupancy_excluding(task_id);
                if count < limit as usize {
                    Ok(())
                } else {
                    Err(CapacityExceeded { limit, count })
                }
            }
            None => Ok(()),
        }
    }

    /// Members in display order with `task_id` removed.
    pub fn siblings_excluding(&self, task_id: TaskId) -> Vec<TaskId> {
        self.members.iter().copied().filter(|&id| id != task_id).collect()
    }

    /// Member order after moving `task_id` here at `requested_index`.
    pub fn membership_after_move(&self, task_id: TaskId, requested_index: Option<usize>) -> Vec<TaskId> {
        let mut members = self.siblings_excluding(task_id);
        let index = clamp_index(requested_index, members.len());
        members.insert(index, task_id);
        members
    }
}

/// Clamps a requested insertion index to `0..=len`; `None` means the end.
pub fn clamp_index(requested: Option<usize>, len: usize) -> usize {
    requested.map_or(len, |index| index.min(len))
}
