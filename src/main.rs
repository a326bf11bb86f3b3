use anyhow::Context;
use clap::Parser;

use yieldlord::adapter::inbound::cli::command::Cli;
use yieldlord::adapter::inbound::cli::dispatch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config_path = cli.config.display().to_string();

    dispatch(cli)
        .await
        .with_context(|| format!("yieldlord failed (config: {config_path})"))
}
