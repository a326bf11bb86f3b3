//! Command-line interface definitions.
//!
//! Defines the CLI structure for the yieldlord application using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

/// DeFi yield allocation and rebalancing CLI
#[derive(Parser, Debug)]
#[command(name = "yieldlord")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and summarize current yield opportunities
    Markets(MarketsArgs),

    /// Evaluate once and print the action list without executing
    Plan(PlanArgs),

    /// Run one full decision cycle
    Run(RunArgs),
}

/// Arguments for `markets`.
#[derive(Args, Debug, Default)]
pub struct MarketsArgs {
    /// Show only the top N opportunities by APY
    #[arg(long)]
    pub top: Option<usize>,

    /// Sort by risk-adjusted APY instead of reported APY
    #[arg(long)]
    pub risk_adjusted: bool,
}

/// Arguments for `plan`.
#[derive(Args, Debug, Default)]
pub struct PlanArgs {
    /// Capital to allocate (overrides `strategy.capital`)
    #[arg(long)]
    pub capital: Option<Decimal>,
}

/// Arguments for `run`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Capital to allocate (overrides `strategy.capital`)
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Evaluate without submitting transactions
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["yieldlord", "plan", "--config", "alt.toml", "--capital", "2500"])
            .unwrap();

        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        match cli.command {
            Commands::Plan(args) => assert_eq!(args.capital, Some(dec!(2500))),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["yieldlord", "run", "--dry-run"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(!cli.json);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.dry_run);
                assert!(args.capital.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(Cli::try_parse_from(["yieldlord", "trade"]).is_err());
    }
}
