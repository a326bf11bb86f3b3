//! CLI module graph.

pub mod command;
pub mod markets;
pub mod output;
pub mod run;

use command::{Cli, Commands};
use output::OutputConfig;

use crate::error::Result;
use crate::infrastructure::config::Config;

/// Dispatch a parsed command line.
pub async fn dispatch(cli: Cli) -> Result<()> {
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    let config = Config::load(&cli.config)?;
    config.init_logging();

    match &cli.command {
        Commands::Markets(args) => markets::execute(&config, args).await,
        Commands::Plan(args) => run::plan(&config, args).await,
        Commands::Run(args) => run::run(&config, args).await,
    }
}
