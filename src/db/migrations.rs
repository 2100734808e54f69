//! Database schema migration management and versioning system.
//!
//! Migrations are registered in version order and applied inside a single
//! transaction at startup. Every applied version is recorded in the
//! `migrations` table, so reopening a database only runs what is new.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use boardsync::db::migrations::{init_with_migrations, get_db_version};
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open("boardsync.db")?;
//! init_with_migrations(&mut conn)?;
//! let version = get_db_version(&conn)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::libs::messages::Message;
use crate::{msg_debug, msg_error};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

/// Tracking table for applied migrations.
const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Debug, Clone)]
struct Migration {
    /// Unique version number for ordering and tracking
    version: u32,
    /// Human-readable name describing the migration's purpose
    name: &'static str,
    /// Function that applies the schema changes within a transaction
    up: fn(&Transaction) -> Result<()>,
}

/// Registry of all schema migrations, in version order.
///
/// The manager is meant for single-threaded use while the database is being
/// opened; the server runs it once before it starts accepting requests.
pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        // Version 1: organizations, their members, boards and board columns
        self.add_migration(1, "create_boards", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS organizations (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
                [],
            )?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS memberships (
                    organization_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    PRIMARY KEY (organization_id, user_id),
                    FOREIGN KEY (organization_id) REFERENCES organizations(id) ON DELETE CASCADE
                )",
                [],
            )?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS boards (
                    id INTEGER PRIMARY KEY,
                    organization_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    FOREIGN KEY (organization_id) REFERENCES organizations(id) ON DELETE CASCADE
                )",
                [],
            )?;

            // A NULL limit means the column is unbounded
            tx.execute(
                "CREATE TABLE IF NOT EXISTS board_columns (
                    id INTEGER PRIMARY KEY,
                    board_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    position REAL NOT NULL DEFAULT 0,
                    wip_limit INTEGER CHECK (wip_limit IS NULL OR wip_limit > 0),
                    FOREIGN KEY (board_id) REFERENCES boards(id) ON DELETE CASCADE
                )",
                [],
            )?;

            tx.execute("CREATE INDEX IF NOT EXISTS idx_boards_organization ON boards(organization_id)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_board_columns_board ON board_columns(board_id)", [])?;
            Ok(())
        });

        // Version 2: sprints and their own columns
        self.add_migration(2, "create_sprints", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS sprints (
                    id INTEGER PRIMARY KEY,
                    board_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    FOREIGN KEY (board_id) REFERENCES boards(id) ON DELETE CASCADE
                )",
                [],
            )?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS sprint_columns (
                    id INTEGER PRIMARY KEY,
                    sprint_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    position REAL NOT NULL DEFAULT 0,
                    wip_limit INTEGER CHECK (wip_limit IS NULL OR wip_limit > 0),
                    FOREIGN KEY (sprint_id) REFERENCES sprints(id) ON DELETE CASCADE
                )",
                [],
            )?;

            tx.execute("CREATE INDEX IF NOT EXISTS idx_sprints_board ON sprints(board_id)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_sprint_columns_sprint ON sprint_columns(sprint_id)", [])?;
            Ok(())
        });

        // Version 3: tasks; a task is never in a board column and a sprint column at once
        self.add_migration(3, "create_tasks", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY,
                    board_id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    column_id INTEGER,
                    sprint_id INTEGER,
                    sprint_column_id INTEGER,
                    parent_id INTEGER,
                    position REAL NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    CHECK (column_id IS NULL OR sprint_column_id IS NULL),
                    FOREIGN KEY (board_id) REFERENCES boards(id) ON DELETE CASCADE,
                    FOREIGN KEY (column_id) REFERENCES board_columns(id) ON DELETE SET NULL,
                    FOREIGN KEY (sprint_id) REFERENCES sprints(id) ON DELETE SET NULL,
                    FOREIGN KEY (sprint_column_id) REFERENCES sprint_columns(id) ON DELETE SET NULL,
                    FOREIGN KEY (parent_id) REFERENCES tasks(id) ON DELETE SET NULL
                )",
                [],
            )?;

            // Container reads are always ordered by position
            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_board ON tasks(board_id)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_column ON tasks(column_id, position)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_sprint ON tasks(sprint_id, sprint_column_id, position)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_id)", [])?;
            Ok(())
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    /// Applies every migration newer than the recorded version.
    ///
    /// All pending migrations share one transaction: a failure leaves the
    /// schema exactly as it was.
    pub fn run_migrations(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;

        let current_version = self.get_current_version(conn)?;
        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();

        if pending.is_empty() {
            msg_debug!(Message::DatabaseUpToDate);
            return Ok(());
        }

        msg_debug!(Message::MigrationsFound(pending.len()));

        let tx = conn.transaction()?;

        for migration in pending {
            msg_debug!(Message::RunningMigration(migration.version, migration.name.to_string()));

            match (migration.up)(&tx) {
                Ok(()) => {
                    tx.execute(
                        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                        params![migration.version, migration.name],
                    )?;
                    msg_debug!(Message::MigrationCompleted(migration.version));
                }
                Err(e) => {
                    msg_error!(Message::MigrationFailed(migration.version, e.to_string()));
                    return Err(e);
                }
            }
        }

        tx.commit()?;
        msg_debug!(Message::AllMigrationsCompleted);

        Ok(())
    }

    fn get_current_version(&self, conn: &Connection) -> Result<u32> {
        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(version.unwrap_or(0))
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies all pending migrations to `conn`.
pub fn init_with_migrations(conn: &mut Connection) -> Result<()> {
    let manager = MigrationManager::new();
    manager.run_migrations(conn)?;
    Ok(())
}

pub fn get_db_version(conn: &Connection) -> Result<u32> {
    let manager = MigrationManager::new();
    manager.get_current_version(conn)
}
