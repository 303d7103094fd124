use canopy_types::CancelToken;
use clap::Parser;
use tracing::{warn, Level};

mod cli;
mod commands;
mod config;
mod link;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; stopping after the current step");
            on_interrupt.cancel();
        }
    });

    tokio::task::spawn_blocking(move || commands::run_command(cli, cancel)).await?
}
