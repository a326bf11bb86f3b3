//! Handlers for the `plan` and `run` commands.

use rust_decimal::Decimal;
use serde_json::json;
use tabled::Tabled;

use super::command::{PlanArgs, RunArgs};
use super::output;
use crate::application::decision::CycleReport;
use crate::domain::Action;
use crate::error::Result;
use crate::infrastructure::bootstrap::{build_engine, WalletMode};
use crate::infrastructure::config::Config;
use crate::port::inbound::executor::{ExecutionResult, Outcome};

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

impl ActionRow {
    fn new(index: usize, action: &Action) -> Self {
        let opportunity = action.opportunity();
        Self {
            index: index + 1,
            kind: action.kind(),
            asset: opportunity.asset().to_string(),
            protocol: opportunity.protocol_key().to_string(),
            amount: action.amount().round_dp(6).to_string(),
        }
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Outcome")]
    outcome: &'static str,
    #[tabled(rename = "Tx / Error")]
    detail: String,
}

impl ResultRow {
    fn new(index: usize, result: &ExecutionResult) -> Self {
        Self {
            index: index + 1,
            action: result.action.to_string(),
            outcome: result.outcome.label(),
            detail: outcome_detail(&result.outcome),
        }
    }
}

fn outcome_detail(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Failed { error } => error.to_string(),
        other => other.tx_hash().map(ToString::to_string).unwrap_or_default(),
    }
}

fn capital(config: &Config, flag: Option<Decimal>) -> Decimal {
    let capital = flag.unwrap_or(config.strategy.capital);
    if capital.is_zero() {
        output::warning("Capital is 0: nothing will be allocated and no holding will be withdrawn");
    }
    capital
}

/// Execute the plan command.
pub async fn plan(config: &Config, args: &PlanArgs) -> Result<()> {
    let capital = capital(config, args.capital);
    let mut engine = build_engine(config, WalletMode::Optional)?;
    let actions = engine.plan(capital).await?;
    print_actions(capital, &actions);
    Ok(())
}

/// Execute the run command. `--dry-run` (or `strategy.dry_run`) only plans.
pub async fn run(config: &Config, args: &RunArgs) -> Result<()> {
    if args.dry_run || config.strategy.dry_run {
        output::warning("Dry run: no transactions will be submitted");
        return plan(config, &PlanArgs { capital: args.capital }).await;
    }

    let capital = capital(config, args.capital);
    let mut engine = build_engine(config, WalletMode::Required)?;
    let report = engine.run_cycle(capital).await;
    print_report(&report);

    match report.evaluation_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn print_actions(capital: Decimal, actions: &[Action]) {
    if output::is_json() {
        output::json_output(json!({
            "command": "plan",
            "capital": capital,
            "actions": actions,
        }));
        return;
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Capital", capital);
    if actions.is_empty() {
        output::success("Portfolio already matches its targets");
        return;
    }
    output::section("Planned actions");
    output::table(actions.iter().enumerate().map(|(i, a)| ActionRow::new(i, a)));
}

fn print_report(report: &CycleReport) {
    if output::is_json() {
        let results: Vec<_> = report
            .results
            .iter()
            .map(|r| {
                json!({
                    "action": r.action,
                    "outcome": r.outcome.label(),
                    "tx_hash": r.outcome.tx_hash().map(ToString::to_string),
                    "error": match &r.outcome {
                        Outcome::Failed { error } => Some(error.to_string()),
                        _ => None,
                    },
                })
            })
            .collect();
        output::json_output(json!({
            "command": "run",
            "started_at": report.started_at,
            "finished_at": report.finished_at,
            "opportunities": report.opportunities,
            "evaluation_error": report.evaluation_error.as_ref().map(ToString::to_string),
            "results": results,
        }));
        return;
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Opportunities", report.opportunities);
    if let Some(e) = &report.evaluation_error {
        output::error(&format!("Evaluation failed: {e}"));
        return;
    }
    if report.results.is_empty() {
        output::success("Portfolio already matches its targets");
        return;
    }
    output::section("Results");
    output::table(report.results.iter().enumerate().map(|(i, r)| ResultRow::new(i, r)));
    output::field("Confirmed", report.confirmed());
    output::field("Pending", report.pending());
    output::field("Failed", report.failed());
    if report.failed() > 0 {
        output::warning("Some actions failed; portfolio is partially rebalanced");
    }
}
