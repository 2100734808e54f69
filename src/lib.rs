//! # boardsync - task board positioning and synchronization
//!
//! The engine behind a board's drag-and-drop. A client moves a task between
//! columns, sprint columns and backlogs and sees the result at once, while the
//! move is committed to the server in the background and rolled back if the
//! server rejects it.
//!
//! ## Features
//!
//! - **Positioning**: ordinal positions with interpolation and renumbering
//! - **WIP limits**: enforced inside the server's move transaction
//! - **Sub-items**: parent links guarded against cycles
//! - **Optimistic client**: overlay store, drag sessions and a stale-aware commit pipeline
//! - **HTTP server**: axum endpoints backed by SQLite
//!
//! ## Usage
//!
//! ```rust,no_run
//! use boardsync::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod db;
pub mod libs;
