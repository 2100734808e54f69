use super::container::ContainerRef;
use serde::{Deserialize, Serialize};

pub type TaskId = i64;
pub type BoardId = i64;
pub type ColumnId = i64;
pub type SprintId = i64;
pub type SprintColumnId = i64;
pub type UserId = i64;

/// A task as stored by the server and mirrored by the client.
///
/// `position` only orders tasks within one container; gaps are normal and
/// equal positions fall back to `created_at`, then `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub board_id: BoardId,
    pub column_id: Option<ColumnId>,
    pub sprint_id: Option<SprintId>,
    pub sprint_column_id: Option<SprintColumnId>,
    pub parent_id: Option<TaskId>,
    pub position: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn container(&self) -> ContainerRef {
        ContainerRef::of(self)
    }

    pub fn placement(&self) -> Placement {
        Placement {
            column_id: self.column_id,
            sprint_id: self.sprint_id,
            sprint_column_id: self.sprint_column_id,
            parent_id: self.parent_id,
            position: self.position,
        }
    }

    /// Returns a copy of the task with the placement fields replaced.
    pub fn with_placement(&self, placement: &Placement) -> Task {
        Task {
            column_id: placement.column_id,
            sprint_id: placement.sprint_id,
            sprint_column_id: placement.sprint_column_id,
            parent_id: placement.parent_id,
            position: placement.position,
            ..self.clone()
        }
    }
}

/// The fields a move is allowed to change. The optimistic overlay stores
/// exactly these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub column_id: Option<ColumnId>,
    pub sprint_id: Option<SprintId>,
    pub sprint_column_id: Option<SprintColumnId>,
    pub parent_id: Option<TaskId>,
    pub position: f64,
}

impl Placement {
    pub fn new(container: ContainerRef, parent_id: Option<TaskId>, position: f64) -> Self {
        let (column_id, sprint_id, sprint_column_id) = container.fields();
        Placement {
            column_id,
            sprint_id,
            sprint_column_id,
            parent_id,
            position,
        }
    }
}

/// A sibling's position after its container was renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingPosition {
    pub task_id: TaskId,
    pub position: f64,
}

/// Input for creating a task. New tasks are appended to their container.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub board_id: BoardId,
    pub container: ContainerRef,
    pub parent_id: Option<TaskId>,
}

impl NewTask {
    pub fn new(title: &str, board_id: BoardId, container: ContainerRef) -> Self {
        NewTask {
            title: title.to_string(),
            board_id,
            container,
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// What a move does to the task's parent link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentChange {
    #[default]
    Keep,
    Clear,
    Set(TaskId),
}

impl ParentChange {
    /// Wire form used by the move request: absent, `null` or an id.
    pub fn to_wire(self) -> Option<Option<TaskId>> {
        match self {
            ParentChange::Keep => None,
            ParentChange::Clear => Some(None),
            ParentChange::Set(parent_id) => Some(Some(parent_id)),
        }
    }

    pub fn from_wire(value: Option<Option<TaskId>>) -> Self {
        match value {
            None => ParentChange::Keep,
            Some(None) => ParentChange::Clear,
            Some(Some(parent_id)) => ParentChange::Set(parent_id),
        }
    }

    /// Parent id after applying the change to `current`.
    pub fn resolve(self, current: Option<TaskId>) -> Option<TaskId> {
        match self {
            ParentChange::Keep => current,
            ParentChange::Clear => None,
            ParentChange::Set(parent_id) => Some(parent_id),
        }
    }
}

/// A requested relocation, built once per drop.
///
/// `requested_index` counts siblings in the target container with the moved
/// task removed; `None` appends.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveIntent {
    pub task_id: TaskId,
    pub from: ContainerRef,
    pub to: ContainerRef,
    pub requested_index: Option<usize>,
    pub parent: ParentChange,
}

impl MoveIntent {
    pub fn new(task_id: TaskId, from: ContainerRef, to: ContainerRef, requested_index: Option<usize>) -> Self {
        MoveIntent {
            task_id,
            from,
            to,
            requested_index,
            parent: ParentChange::Keep,
        }
    }

    pub fn with_parent(mut self, parent: ParentChange) -> Self {
        self.parent = parent;
        self
    }

    pub fn changes_container(&self) -> bool {
        self.from != self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_change_wire_forms() {
        assert_eq!(ParentChange::from_wire(None), ParentChange::Keep);
        assert_eq!(ParentChange::from_wire(Some(None)), ParentChange::Clear);
        assert_eq!(ParentChange::from_wire(Some(Some(4))), ParentChange::Set(4));
        assert_eq!(ParentChange::Set(4).to_wire(), Some(Some(4)));
    }

    #[test]
    fn parent_change_resolve_keeps_current() {
        assert_eq!(ParentChange::Keep.resolve(Some(3)), Some(3));
        assert_eq!(ParentChange::Clear.resolve(Some(3)), None);
        assert_eq!(ParentChange::Set(9).resolve(Some(3)), Some(9));
    }
}
