//! Database layer for boardsync.
//!
//! SQLite through `rusqlite`, with a versioned migration system. Repository
//! structs borrow a connection instead of owning one, so the same code runs
//! on a plain connection and inside the move transaction (a `Transaction`
//! dereferences to a `Connection`).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use boardsync::db::{boards::Boards, db::Db, tasks::Tasks};
//!
//! let db = Db::open("boardsync.db")?;
//! let snapshot = Boards::new(&db.conn).snapshot(1)?;
//! let first = Tasks::new(&db.conn).get(snapshot.tasks[0].id)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Connection setup: busy timeout, foreign keys and migrations.
pub mod db;

/// Versioned schema migrations.
pub mod migrations;

/// Organizations, memberships and boards.
pub mod boards;

/// Board columns, sprints, sprint columns and loaded containers.
pub mod containers;

/// Task rows, container membership and parent links.
pub mod tasks;
