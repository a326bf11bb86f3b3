//! Composition root: builds adapters and services from configuration.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::adapter::outbound::evm::{EvmRpc, LocalSigner};
use crate::adapter::outbound::portals::PortalsClient;
use crate::adapter::outbound::token::TokenRegistry;
use crate::application::decision::DecisionEngine;
use crate::application::execution::ExecutionPipeline;
use crate::application::risk::RiskLimiter;
use crate::domain::Action;
use crate::error::{ExecutionError, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::inbound::executor::{ActionExecutor, ExecutionResult};
use crate::port::outbound::chain::TxSigner;
use crate::port::outbound::token::TokenMetadata;

/// Whether the caller needs a signing wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletMode {
    /// Fail when `WALLET_PRIVATE_KEY` is unset.
    Required,
    /// Evaluate without a wallet; holdings come from the local book.
    Optional,
}

/// Executor used when no wallet is configured. Every action fails.
struct NoWallet;

#[async_trait]
impl ActionExecutor for NoWallet {
    async fn execute(&self, action: Action) -> ExecutionResult {
        ExecutionResult::failed(
            action,
            ExecutionError::Signing("no wallet configured".to_string()),
        )
    }
}

fn token_registry() -> Arc<dyn TokenMetadata> {
    Arc::new(TokenRegistry::arbitrum())
}

/// Portals client configured from `[portals]`.
#[must_use]
pub fn build_portals_client(config: &Config) -> Arc<PortalsClient> {
    let client = PortalsClient::new(
        config.portals.api_url.as_str(),
        config.portals.network.as_str(),
        token_registry(),
    )
    .with_api_key(config.portals.api_key.clone())
    .with_retry(config.portals.retry_policy())
    .with_timeout(config.portals.request_timeout());
    Arc::new(client)
}

/// Execution pipeline for the configured wallet.
///
/// # Errors
///
/// Returns an error if the private key is missing or invalid, the RPC URL
/// does not parse, or the execution section is invalid.
#[allow(clippy::result_large_err)]
pub fn build_pipeline(config: &Config, portals: Arc<PortalsClient>) -> Result<ExecutionPipeline> {
    let signer = LocalSigner::from_private_key(config.private_key()?)?;
    let chain = EvmRpc::new(&config.chain.rpc_url)?;
    let settings = config
        .execution
        .settings(&config.portals.network, config.chain.chain_id)?;

    info!(
        wallet = %signer.address(),
        rpc = %chain.endpoint(),
        chain_id = config.chain.chain_id,
        "Execution pipeline ready"
    );
    Ok(ExecutionPipeline::new(
        Arc::new(chain),
        Arc::new(signer),
        portals,
        token_registry(),
        settings,
    ))
}

/// Decision engine wired to Portals and, when available, the wallet.
///
/// With a wallet, holdings are read from live account balances; without
/// one, from the engine's local position book.
///
/// # Errors
///
/// Returns an error if configuration is invalid or `mode` is
/// [`WalletMode::Required`] and no wallet is configured.
#[allow(clippy::result_large_err)]
pub fn build_engine(config: &Config, mode: WalletMode) -> Result<DecisionEngine> {
    let portals = build_portals_client(config);
    let query = config.feed.query(&config.portals.network);
    let limiter = RiskLimiter::new(config.risk_profile()?);

    let has_wallet = config.wallet.private_key.is_some();
    if !has_wallet && mode == WalletMode::Required {
        config.private_key()?;
    }

    if !has_wallet {
        warn!("No wallet configured, holdings will be read from the local position book");
        return Ok(DecisionEngine::new(
            portals,
            Arc::new(NoWallet),
            query,
            limiter,
        ));
    }

    let pipeline = build_pipeline(config, Arc::clone(&portals))?;
    let owner = pipeline.address().to_string();
    Ok(
        DecisionEngine::new(portals.clone(), Arc::new(pipeline), query, limiter)
            .with_account_source(portals, owner),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::opportunity;
    use rust_decimal_macros::dec;

    fn config(env_key: Option<&str>) -> Config {
        let key = env_key.map(str::to_string);
        Config::parse_toml_with_env("[logging]\nlevel = \"info\"\n", move |name| {
            (name == "WALLET_PRIVATE_KEY").then(|| key.clone()).flatten()
        })
        .unwrap()
    }

    #[test]
    fn required_wallet_must_be_configured() {
        assert!(build_engine(&config(None), WalletMode::Required).is_err());
        assert!(build_engine(&config(None), WalletMode::Optional).is_ok());
    }

    #[test]
    fn invalid_key_is_a_config_error() {
        let result = build_engine(&config(Some("0x1234")), WalletMode::Optional);
        assert!(matches!(result, Err(crate::error::Error::Config(_))));
    }

    #[tokio::test]
    async fn no_wallet_executor_fails_every_action() {
        let action = Action::Deposit {
            target: opportunity("aavev3", "aArbUSDC", dec!(4)),
            amount: dec!(100),
        };
        let result = NoWallet.execute(action).await;
        assert!(result.outcome.is_failed());
    }
}
