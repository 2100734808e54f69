use boardsync::commands::Cli;
use boardsync::libs::messages::macros::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    Cli::menu().await
}
