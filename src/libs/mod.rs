//! Core library modules for boardsync.
//!
//! ## Features
//!
//! - **Board model**: tasks, containers, positions and parent links
//! - **Server moves**: the transactional move-and-reorder operation
//! - **Client sync**: optimistic store, drag sessions and the commit pipeline
//! - **Infrastructure**: configuration, data storage, messages and rendering
//!
//! ## Usage
//!
//! ```rust,no_run
//! use boardsync::libs::board::BoardSnapshot;
//! use boardsync::libs::optimistic::OptimisticStore;
//! use boardsync::libs::position::PositionAllocator;
//!
//! let store = OptimisticStore::new(BoardSnapshot::empty(1), PositionAllocator::default());
//! assert_eq!(store.pending_count(), 0);
//! ```

pub mod board;
pub mod commit;
pub mod config;
pub mod container;
pub mod cycle_guard;
pub mod data_storage;
pub mod drag;
pub mod error;
pub mod messages;
pub mod move_task;
pub mod optimistic;
pub mod position;
pub mod session;
pub mod task;
pub mod view;
