//! Output macros with conditional tracing support.
//!
//! Every macro takes a [`Message`](super::Message) (or anything `Display`) and
//! routes it either to `tracing` or to the console:
//!
//! ```text
//! msg_info!(msg) ──▶ debug mode? ──yes──▶ tracing::info!
//!                         │
//!                         └──no───▶ println!
//! ```
//!
//! Debug mode is on when `BOARDSYNC_DEBUG` or `RUST_LOG` is set. The check is
//! cached on first use. In debug mode the binary installs a
//! `tracing-subscriber` formatter through [`init_tracing`].
//!
//! ## Usage
//!
//! ```rust
//! use boardsync::{msg_info, msg_error};
//! use boardsync::libs::messages::Message;
//!
//! msg_info!(Message::DatabaseUpToDate);
//! msg_error!(Message::DropTargetInvalid("unknown drop target".to_string()));
//! ```

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static DEBUG_MODE: OnceLock<bool> = OnceLock::new();

#[doc(hidden)]
pub fn is_debug_mode() -> bool {
    *DEBUG_MODE.get_or_init(|| std::env::var("BOARDSYNC_DEBUG").is_ok() || std::env::var("RUST_LOG").is_ok())
}

/// Installs the global `tracing` subscriber when debug mode is enabled.
///
/// `RUST_LOG` drives the filter; with only `BOARDSYNC_DEBUG` set the crate
/// logs at `debug` and everything else at `info`. Calling it twice is
/// harmless.
pub fn init_tracing() {
    if !is_debug_mode() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,boardsync=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}

#[macro_export]
macro_rules! msg_print {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("{}", $msg);
        } else {
            println!("{}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\n{}\n", $msg);
        } else {
            println!("\n{}\n", $msg);
        }
    };
}

#[macro_export]
macro_rules! msg_success {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("✅ {}", $msg);
        } else {
            println!("✅ {}", $msg);
        }
    };
}

#[macro_export]
macro_rules! msg_error {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::error!("❌ {}", $msg);
        } else {
            eprintln!("❌ {}", $msg);
        }
    };
}

#[macro_export]
macro_rules! msg_warning {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::warn!("⚠️ {}", $msg);
        } else {
            println!("⚠️ {}", $msg);
        }
    };
}

#[macro_export]
macro_rules! msg_info {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("ℹ️ {}", $msg);
        } else {
            println!("ℹ️ {}", $msg);
        }
    };
}

#[macro_export]
macro_rules! msg_debug {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::debug!("🔍 {}", $msg);
        }
    };
}

#[macro_export]
macro_rules! msg_error_anyhow {
    ($msg:expr) => {
        anyhow::anyhow!("❌ {}", $msg)
    };
}

#[macro_export]
macro_rules! msg_bail_anyhow {
    ($msg:expr) => {
        anyhow::bail!("❌ {}", $msg)
    };
}
