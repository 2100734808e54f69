//! HTTP boundary of boardsync.
//!
//! - **server**: axum router for moves and board snapshots, plus the
//!   invalidation broadcast
//! - **client**: reqwest transport used by the client-side commit pipeline
//!
//! ## Usage
//!
//! ```rust,no_run
//! use boardsync::api::server::{router, AppState};
//! use boardsync::libs::move_task::MoveSettings;
//!
//! let state = AppState::new("boardsync.db".into(), MoveSettings::default());
//! let app = router(state);
//! ```

pub mod client;
pub mod server;

pub use client::HttpTransport;
pub use server::{router, AppState};
