//! Configuration management for boardsync.
//!
//! The configuration is a single JSON document stored in the platform data
//! directory (see [`DataStorage`]). Every section is optional so that a
//! machine running only the server, or only the client, keeps a minimal file.
//!
//! ## Sections
//!
//! - **server**: listen address and database location for `boardsync serve`
//! - **client**: API endpoint, acting user and request timeout for the commit pipeline
//! - **board**: positioning and cycle-guard tuning shared by client and server
//!
//! ## Usage
//!
//! ```rust,no_run
//! use boardsync::libs::config::Config;
//!
//! let config = Config::read()?;
//! let client = config.client_or_default();
//! println!("Committing moves to {}", client.api_url);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;

/// Configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Database file name used when `server.database` is not set.
pub const DB_FILE_NAME: &str = "boardsync.db";

/// Settings for the move server.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to, e.g. `127.0.0.1:7878`.
    pub bind: String,

    /// Path of the SQLite database. Falls back to `boardsync.db` in the
    /// data directory when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

/// Settings for the client side of the commit pipeline.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the move server, without a trailing slash.
    pub api_url: String,

    /// Identity forwarded in the `x-user-id` header. Session validation is
    /// done upstream; the server only checks organization membership.
    pub user_id: i64,

    /// Request timeout in milliseconds. A timeout is a transient failure and
    /// rolls the optimistic move back.
    pub timeout_ms: u64,
}

/// Board tuning shared by the position allocator and the cycle guard.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BoardConfig {
    /// Gap between neighbours after renumbering, and the increment used when
    /// appending to either end of a container.
    pub position_step: f64,

    /// Maximum number of ancestor hops the cycle guard follows.
    pub max_parent_depth: usize,
}

/// Root configuration document.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<BoardConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:7878".to_string(),
            database: None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: "http://127.0.0.1:7878".to_string(),
            user_id: 1,
            timeout_ms: 5_000,
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            position_step: 1024.0,
            max_parent_depth: 64,
        }
    }
}

impl ServerConfig {
    /// Resolves the database path, creating the data directory if needed.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => DataStorage::new().get_path(DB_FILE_NAME),
        }
    }
}

impl Config {
    /// Loads the configuration file, or returns the default configuration
    /// when no file has been written yet.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Fills every missing section with its defaults.
    pub fn with_defaults(mut self) -> Self {
        self.server.get_or_insert_with(ServerConfig::default);
        self.client.get_or_insert_with(ClientConfig::default);
        self.board.get_or_insert_with(BoardConfig::default);
        self
    }

    pub fn server_or_default(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn client_or_default(&self) -> ClientConfig {
        self.client.clone().unwrap_or_default()
    }

    pub fn board_or_default(&self) -> BoardConfig {
        self.board.clone().unwrap_or_default()
    }
}
