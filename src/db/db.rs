use super::migrations::init_with_migrations;
use crate::libs::config::Config;
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// How long a connection waits for another writer before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the database named by the configuration.
    pub fn new() -> Result<Db> {
        let path = Config::read()?.server_or_default().database_path()?;
        Db::open(path)
    }

    /// Opens `path`, configures the connection and applies pending migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Db> {
        let mut conn = Db::connect(path)?;
        init_with_migrations(&mut conn)?;

        Ok(Db { conn })
    }

    /// Opens a configured connection without touching the schema. Used per
    /// request by the server once the schema is known to be current.
    pub fn connect<P: AsRef<Path>>(path: P) -> rusqlite::Result<Connection> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(conn)
    }
}
