use crate::libs::container::ContainerRef;
use crate::libs::cycle_guard::ParentLookup;
use crate::libs::position::{Allocation, PositionAllocator};
use crate::libs::task::{BoardId, NewTask, Placement, Task, TaskId};
use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

const SELECT_TASKS: &str = "SELECT id, title, board_id, column_id, sprint_id, sprint_column_id, parent_id, position, created_at, updated_at FROM tasks";

/// Display order inside a container. Equal positions fall back to creation order.
const ORDER_BY_POSITION: &str = "ORDER BY position, created_at, id";

fn task_from_row(row: &Row) -> Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        board_id: row.get(2)?,
        column_id: row.get(3)?,
        sprint_id: row.get(4)?,
        sprint_column_id: row.get(5)?,
        parent_id: row.get(6)?,
        position: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Millisecond timestamps so tasks created in a burst still sort by creation.
fn now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

pub struct Tasks<'c> {
    conn: &'c Connection,
}

impl<'c> Tasks<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Tasks { conn }
    }

    /// Appends a new task to the end of its container.
    pub fn insert(&self, task: &NewTask, allocator: &PositionAllocator) -> Result<Task> {
        let siblings: Vec<f64> = self.members(&task.container)?.iter().map(|member| member.position).collect();
        let position = match allocator.allocate(&siblings, None) {
            Allocation::Position(position) => position,
            // Appending always has room; this arm only guards the type.
            Allocation::Renumber => siblings.last().map_or(allocator.step(), |last| last + allocator.step()),
        };
        let (column_id, sprint_id, sprint_column_id) = task.container.fields();
        let timestamp = now();

        self.conn.execute(
            "INSERT INTO tasks (board_id, title, column_id, sprint_id, sprint_column_id, parent_id, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                task.board_id,
                task.title,
                column_id,
                sprint_id,
                sprint_column_id,
                task.parent_id,
                position,
                timestamp
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get(id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn get(&self, task_id: TaskId) -> Result<Option<Task>> {
        self.conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_TASKS), params![task_id], task_from_row)
            .optional()
    }

    pub fn list_by_board(&self, board_id: BoardId) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE board_id = ?1 {}", SELECT_TASKS, ORDER_BY_POSITION))?;
        let tasks = stmt.query_map(params![board_id], task_from_row)?.collect::<Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Members of a container in display order.
    pub fn members(&self, container: &ContainerRef) -> Result<Vec<Task>> {
        let (filter, id) = match *container {
            ContainerRef::Column { column_id, .. } => ("WHERE column_id = ?1", column_id),
            ContainerRef::SprintColumn { sprint_column_id, .. } => {
                ("WHERE column_id IS NULL AND sprint_column_id = ?1", sprint_column_id)
            }
            ContainerRef::SprintBacklog { sprint_id } => {
                ("WHERE column_id IS NULL AND sprint_id = ?1 AND sprint_column_id IS NULL", sprint_id)
            }
            ContainerRef::Backlog { board_id } => ("WHERE board_id = ?1 AND column_id IS NULL AND sprint_id IS NULL", board_id),
        };

        let mut stmt = self.conn.prepare(&format!("{} {} {}", SELECT_TASKS, filter, ORDER_BY_POSITION))?;
        let tasks = stmt.query_map(params![id], task_from_row)?.collect::<Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Writes container fields, parent and position of one task.
    pub fn update_placement(&self, task_id: TaskId, placement: &Placement) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET column_id = ?1, sprint_id = ?2, sprint_column_id = ?3, parent_id = ?4, position = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                placement.column_id,
                placement.sprint_id,
                placement.sprint_column_id,
                placement.parent_id,
                placement.position,
                now(),
                task_id
            ],
        )?;
        Ok(())
    }

    /// Rewrites positions only; used by the renumbering pass.
    pub fn update_positions(&self, positions: &[(TaskId, f64)]) -> Result<()> {
        let mut stmt = self.conn.prepare("UPDATE tasks SET position = ?1 WHERE id = ?2")?;
        for (task_id, position) in positions {
            stmt.execute(params![position, task_id])?;
        }
        Ok(())
    }

    /// Deletes a task. Its sub-items become roots.
    pub fn delete(&self, task_id: TaskId) -> Result<usize> {
        self.conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])
    }
}

impl ParentLookup for Tasks<'_> {
    type Error = rusqlite::Error;

    fn parent_of(&self, task_id: TaskId) -> Result<Option<TaskId>> {
        let parent: Option<Option<TaskId>> = self
            .conn
            .query_row("SELECT parent_id FROM tasks WHERE id = ?1", params![task_id], |row| row.get(0))
            .optional()?;
        Ok(parent.flatten())
    }
}
