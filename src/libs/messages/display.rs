//! Display implementation for boardsync messages.
//!
//! All message text is defined here so that wording stays consistent between
//! the CLI, the server log and the client session notices.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let s = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved(path) => format!("Configuration saved to {}", path),
            Message::ConfigAlreadyExists(path) => format!("Configuration already exists at {}, keeping it", path),

            // === DATABASE MESSAGES ===
            Message::DatabaseReady(path, version) => format!("Database ready at {} (schema v{})", path, version),
            Message::MigrationsFound(count) => format!("Found {} pending database migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationCompleted(version) => format!("✓ Migration v{} completed", version),
            Message::MigrationFailed(version, error) => format!("✗ Migration v{} failed: {}", version, error),
            Message::AllMigrationsCompleted => "All database migrations completed successfully".to_string(),
            Message::DatabaseUpToDate => "Database is up to date".to_string(),

            // === DEMO BOARD MESSAGES ===
            Message::DemoBoardSeeded { board_id, user_id } => {
                format!("Demo board {} created, accessible to user {}", board_id, user_id)
            }
            Message::DemoColumn { column_id, name, wip_limit } => match wip_limit {
                Some(limit) => format!("  column {} \"{}\" (WIP limit {})", column_id, name, limit),
                None => format!("  column {} \"{}\"", column_id, name),
            },

            // === SERVER MESSAGES ===
            Message::ServerListening(address) => format!("Move server listening on http://{}", address),
            Message::ServerStopped => "Move server stopped".to_string(),
            Message::MoveCommitted { task_id, container } => format!("Task {} committed to {}", task_id, container),
            Message::MoveRejected { task_id, reason } => format!("Move of task {} rejected: {}", task_id, reason),
            Message::InvalidationDropped(board_id) => format!("No listeners for invalidation of board {}", board_id),

            // === CLIENT MESSAGES ===
            Message::DragStarted(task_id) => format!("Dragging task {}", task_id),
            Message::DragCancelled(task_id) => format!("Drag of task {} cancelled", task_id),
            Message::DropOutsideTargets(task_id) => format!("Task {} was dropped outside any container", task_id),
            Message::DropTargetInvalid(reason) => format!("Invalid drop target: {}", reason),
            Message::TaskNotOnBoard(task_id) => format!("Task {} is not on this board", task_id),
            Message::MoveApplied { task_id, container, index } => {
                format!("Task {} moved to {} at index {}", task_id, container, index)
            }
            Message::MoveReconciled { task_id, position } => format!("Task {} confirmed at position {}", task_id, position),
            Message::MoveRolledBack { task_id, reason } => format!("Task {} snapped back: {}", task_id, reason),
            Message::StaleResponseDiscarded { task_id, version } => {
                format!("Discarded stale response for task {} (version {})", task_id, version)
            }
            Message::RetryAvailable(task_id) => format!("Network problem while moving task {}, the move can be retried", task_id),
            Message::RefetchRecommended(board_id) => format!("Board {} changed on the server, reload recommended", board_id),
            Message::BoardRefreshed { board_id, tasks } => format!("Board {} reloaded ({} tasks)", board_id, tasks),
            Message::BoardEmpty(board_id) => format!("Board {} has no tasks", board_id),
            Message::BoardNotFound(board_id) => format!("Board {} not found", board_id),
            Message::TaskAlreadyInPlace(task_id) => format!("Task {} is already there, nothing to move", task_id),
            Message::WipLimitReached { container, limit } => format!("{} has reached its WIP limit of {}", container, limit),
        };
        write!(f, "{}", s)
    }
}
