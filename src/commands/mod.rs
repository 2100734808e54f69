//! Command-line interface for boardsync.
//!
//! | Command | Side   | What it does                                            |
//! |---------|--------|---------------------------------------------------------|
//! | `init`  | both   | writes the configuration, migrates, optionally seeds    |
//! | `serve` | server | runs the HTTP move server                               |
//! | `show`  | server | prints a board from the local database                  |
//! | `move`  | client | drags a task through a board session and commits it     |

pub mod init;
pub mod move_task;
pub mod serve;
pub mod show;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Write the configuration and prepare the database")]
    Init(init::InitArgs),
    #[command(about = "Run the move server")]
    Serve(serve::ServeArgs),
    #[command(about = "Show a board grouped by container")]
    Show(show::ShowArgs),
    #[command(about = "Move a task and commit it to the server", arg_required_else_help = true)]
    Move(move_task::MoveArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Serve(args) => serve::cmd(args).await,
            Commands::Show(args) => show::cmd(args),
            Commands::Move(args) => move_task::cmd(args).await,
        }
    }
}
