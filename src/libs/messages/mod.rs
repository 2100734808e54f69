//! User-facing messages and the macros that print them.
//!
//! - **types**: the [`Message`] enum, one variant per notice
//! - **display**: the text of every variant
//! - **macros**: `msg_*!` output macros with tracing support

pub mod display;
pub mod macros;
pub mod types;

pub use types::Message;
