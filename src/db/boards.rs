//! Organizations, memberships and boards.
//!
//! Only what the move operation and the demo seed need: creation helpers,
//! lookups and the membership check used for authorization.

use super::containers::Containers;
use super::tasks::Tasks;
use crate::libs::board::BoardSnapshot;
use crate::libs::task::{BoardId, UserId};
use rusqlite::{params, Connection, OptionalExtension, Result};

pub type OrganizationId = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub id: BoardId,
    pub organization_id: OrganizationId,
    pub name: String,
}

pub struct Boards<'c> {
    conn: &'c Connection,
}

impl<'c> Boards<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Boards { conn }
    }

    pub fn create_organization(&self, name: &str) -> Result<OrganizationId> {
        self.conn.execute("INSERT INTO organizations (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Adds `user_id` to the organization. Adding an existing member is a no-op.
    pub fn add_member(&self, organization_id: OrganizationId, user_id: UserId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO memberships (organization_id, user_id) VALUES (?1, ?2)",
            params![organization_id, user_id],
        )?;
        Ok(())
    }

    pub fn is_member(&self, organization_id: OrganizationId, user_id: UserId) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM memberships WHERE organization_id = ?1 AND user_id = ?2",
            params![organization_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn create(&self, organization_id: OrganizationId, name: &str) -> Result<BoardId> {
        self.conn.execute(
            "INSERT INTO boards (organization_id, name) VALUES (?1, ?2)",
            params![organization_id, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, board_id: BoardId) -> Result<Option<Board>> {
        self.conn
            .query_row(
                "SELECT id, organization_id, name FROM boards WHERE id = ?1",
                params![board_id],
                |row| {
                    Ok(Board {
                        id: row.get(0)?,
                        organization_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()
    }

    /// True when `user_id` belongs to the organization owning the board.
    pub fn can_access(&self, board_id: BoardId, user_id: UserId) -> Result<bool> {
        match self.get(board_id)? {
            Some(board) => self.is_member(board.organization_id, user_id),
            None => Ok(false),
        }
    }

    /// Every task of the board plus the WIP limits of its containers.
    pub fn snapshot(&self, board_id: BoardId) -> Result<BoardSnapshot> {
        Ok(BoardSnapshot {
            board_id,
            tasks: Tasks::new(self.conn).list_by_board(board_id)?,
            limits: Containers::new(self.conn).limits(board_id)?,
        })
    }
}
