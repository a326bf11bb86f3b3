//! Handler for the `markets` command.

use serde_json::json;
use tabled::Tabled;

use super::command::MarketsArgs;
use super::output;
use crate::application::market::{MarketAnalyzer, MarketSummary};
use crate::domain::Opportunity;
use crate::error::Result;
use crate::infrastructure::bootstrap::build_portals_client;
use crate::infrastructure::config::Config;
use crate::port::outbound::feed::OpportunityFeed;

#[derive(Tabled)]
pub(crate) struct OpportunityRow {
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Underlying")]
    underlying: String,
    #[tabled(rename = "Class")]
    class: &'static str,
    #[tabled(rename = "APY")]
    apy: String,
    #[tabled(rename = "Adj. APY")]
    adjusted_apy: String,
    #[tabled(rename = "Liquidity")]
    liquidity: String,
    #[tabled(rename = "Util.")]
    utilization: String,
}

impl From<&Opportunity> for OpportunityRow {
    fn from(o: &Opportunity) -> Self {
        Self {
            protocol: o.protocol_key().to_string(),
            asset: o.asset().to_string(),
            underlying: o.underlying_asset().to_string(),
            class: o.asset_class().as_str(),
            apy: output::percent(o.apy()),
            adjusted_apy: output::percent(o.risk_adjusted_apy()),
            liquidity: o.liquidity().round_dp(0).to_string(),
            utilization: output::percent(o.utilization_rate()),
        }
    }
}

/// Execute the markets command.
pub async fn execute(config: &Config, args: &MarketsArgs) -> Result<()> {
    let feed = build_portals_client(config);
    let query = config.feed.query(&config.portals.network);
    let opportunities = feed.fetch_opportunities(&query).await?;

    let analyzer = MarketAnalyzer::new();
    let mut shown = if args.risk_adjusted {
        analyzer.sort_by(&opportunities, Opportunity::risk_adjusted_apy, true)
    } else {
        analyzer.sort_by(&opportunities, Opportunity::apy, true)
    };
    if let Some(top) = args.top {
        shown.truncate(top);
    }
    let summary = analyzer.summary(&opportunities);

    if output::is_json() {
        output::json_output(json!({
            "command": "markets",
            "opportunities": shown,
            "summary": summary,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section(&format!("Opportunities on {}", query.network));
    output::table(shown.iter().map(OpportunityRow::from));
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &MarketSummary) {
    output::section("Summary");
    output::field("Count", summary.count);
    output::field("Protocols", summary.protocols.join(", "));
    if let Some(apy) = &summary.apy {
        output::field("APY mean", output::percent(apy.mean));
        output::field("APY median", output::percent(apy.median));
        output::field(
            "APY range",
            format!("{} - {}", output::percent(apy.min), output::percent(apy.max)),
        );
    }
    if let Some(liquidity) = &summary.liquidity {
        output::field("Liquidity", liquidity.total.round_dp(0));
    }
}
