//! Board columns, sprints and sprint columns.
//!
//! Besides plain creation and lookup this module turns a [`ContainerRef`]
//! into a loaded [`Container`]: its WIP limit plus its members in display
//! order, as read on the given connection (inside the move transaction on the
//! server).

use super::tasks::Tasks;
use crate::libs::board::ContainerLimit;
use crate::libs::container::{Container, ContainerRef};
use crate::libs::task::{BoardId, ColumnId, SprintColumnId, SprintId};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub name: String,
    pub wip_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sprint {
    pub id: SprintId,
    pub board_id: BoardId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SprintColumn {
    pub id: SprintColumnId,
    pub sprint_id: SprintId,
    pub name: String,
    pub wip_limit: Option<u32>,
}

const SELECT_COLUMN: &str = "SELECT id, board_id, name, wip_limit FROM board_columns";
const SELECT_SPRINT: &str = "SELECT id, board_id, name FROM sprints";
const SELECT_SPRINT_COLUMN: &str = "SELECT id, sprint_id, name, wip_limit FROM sprint_columns";

fn column_from_row(row: &Row) -> Result<Column> {
    Ok(Column {
        id: row.get(0)?,
        board_id: row.get(1)?,
        name: row.get(2)?,
        wip_limit: row.get(3)?,
    })
}

fn sprint_from_row(row: &Row) -> Result<Sprint> {
    Ok(Sprint {
        id: row.get(0)?,
        board_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn sprint_column_from_row(row: &Row) -> Result<SprintColumn> {
    Ok(SprintColumn {
        id: row.get(0)?,
        sprint_id: row.get(1)?,
        name: row.get(2)?,
        wip_limit: row.get(3)?,
    })
}

pub struct Containers<'c> {
    conn: &'c Connection,
}

impl<'c> Containers<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Containers { conn }
    }

    /// Appends a column to the board. Columns are ordered by creation.
    pub fn create_column(&self, board_id: BoardId, name: &str, wip_limit: Option<u32>) -> Result<ColumnId> {
        self.conn.execute(
            "INSERT INTO board_columns (board_id, name, position, wip_limit)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), 0) + 1 FROM board_columns WHERE board_id = ?1), ?3)",
            params![board_id, name, wip_limit],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_column(&self, column_id: ColumnId) -> Result<Option<Column>> {
        self.conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_COLUMN), params![column_id], column_from_row)
            .optional()
    }

    pub fn list_columns(&self, board_id: BoardId) -> Result<Vec<Column>> {
        let mut stmt = self.conn.prepare(&format!("{} WHERE board_id = ?1 ORDER BY position, id", SELECT_COLUMN))?;
        let columns = stmt.query_map(params![board_id], column_from_row)?.collect::<Result<Vec<_>>>()?;
        Ok(columns)
    }

    pub fn set_column_limit(&self, column_id: ColumnId, wip_limit: Option<u32>) -> Result<()> {
        self.conn.execute(
            "UPDATE board_columns SET wip_limit = ?1 WHERE id = ?2",
            params![wip_limit, column_id],
        )?;
        Ok(())
    }

    pub fn create_sprint(&self, board_id: BoardId, name: &str) -> Result<SprintId> {
        self.conn.execute("INSERT INTO sprints (board_id, name) VALUES (?1, ?2)", params![board_id, name])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_sprint(&self, sprint_id: SprintId) -> Result<Option<Sprint>> {
        self.conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_SPRINT), params![sprint_id], sprint_from_row)
            .optional()
    }

    pub fn list_sprints(&self, board_id: BoardId) -> Result<Vec<Sprint>> {
        let mut stmt = self.conn.prepare(&format!("{} WHERE board_id = ?1 ORDER BY id", SELECT_SPRINT))?;
        let sprints = stmt.query_map(params![board_id], sprint_from_row)?.collect::<Result<Vec<_>>>()?;
        Ok(sprints)
    }

    pub fn create_sprint_column(&self, sprint_id: SprintId, name: &str, wip_limit: Option<u32>) -> Result<SprintColumnId> {
        self.conn.execute(
            "INSERT INTO sprint_columns (sprint_id, name, position, wip_limit)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), 0) + 1 FROM sprint_columns WHERE sprint_id = ?1), ?3)",
            params![sprint_id, name, wip_limit],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_sprint_column(&self, sprint_column_id: SprintColumnId) -> Result<Option<SprintColumn>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_SPRINT_COLUMN),
                params![sprint_column_id],
                sprint_column_from_row,
            )
            .optional()
    }

    pub fn list_sprint_columns(&self, sprint_id: SprintId) -> Result<Vec<SprintColumn>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE sprint_id = ?1 ORDER BY position, id", SELECT_SPRINT_COLUMN))?;
        let columns = stmt.query_map(params![sprint_id], sprint_column_from_row)?.collect::<Result<Vec<_>>>()?;
        Ok(columns)
    }

    /// WIP limit of a container. Backlogs never have one.
    pub fn wip_limit(&self, container: &ContainerRef) -> Result<Option<u32>> {
        let limit = match *container {
            ContainerRef::Column { column_id, .. } => self.get_column(column_id)?.and_then(|column| column.wip_limit),
            ContainerRef::SprintColumn { sprint_column_id, .. } => {
                self.get_sprint_column(sprint_column_id)?.and_then(|column| column.wip_limit)
            }
            ContainerRef::SprintBacklog { .. } | ContainerRef::Backlog { .. } => None,
        };
        Ok(limit)
    }

    /// Limits of every limited container on the board.
    pub fn limits(&self, board_id: BoardId) -> Result<Vec<ContainerLimit>> {
        let mut limits = Vec::new();

        for column in self.list_columns(board_id)? {
            if let Some(wip_limit) = column.wip_limit {
                limits.push(ContainerLimit {
                    container: ContainerRef::Column {
                        board_id,
                        column_id: column.id,
                    },
                    wip_limit,
                });
            }
        }

        for sprint in self.list_sprints(board_id)? {
            for column in self.list_sprint_columns(sprint.id)? {
                if let Some(wip_limit) = column.wip_limit {
                    limits.push(ContainerLimit {
                        container: ContainerRef::SprintColumn {
                            sprint_id: sprint.id,
                            sprint_column_id: column.id,
                        },
                        wip_limit,
                    });
                }
            }
        }

        Ok(limits)
    }

    /// Loads limit and members of `container` in display order.
    pub fn load(&self, container: &ContainerRef) -> Result<Container> {
        let wip_limit = self.wip_limit(container)?;
        let members = Tasks::new(self.conn).members(container)?.into_iter().map(|task| task.id).collect();
        Ok(Container::new(*container, wip_limit, members))
    }
}
