use crate::api::server::{serve, AppState};
use crate::db::db::Db;
use crate::libs::config::Config;
use crate::libs::move_task::MoveSettings;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on, overriding `server.bind`
    #[arg(short, long)]
    bind: Option<String>,
}

pub async fn cmd(serve_args: ServeArgs) -> Result<()> {
    let config = Config::read()?;
    let server = config.server_or_default();
    let db_path = server.database_path()?;

    // Migrate once up front; requests then open plain connections.
    Db::open(&db_path)?;

    let state = AppState::new(db_path, MoveSettings::from(&config.board_or_default()));
    let bind = serve_args.bind.unwrap_or(server.bind);
    serve(&bind, state).await
}
