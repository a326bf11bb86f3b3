//! Execution pipeline.
//!
//! Turns one [`Action`] into one on-chain transaction and reports how it
//! ended. Each attempt rebuilds the transaction from live chain state:
//!
//! 1. read pending nonce and gas price
//! 2. estimate gas against the call data
//! 3. sign locally
//! 4. submit the raw transaction
//!
//! Only transport failures during those steps are retried. Once a hash is
//! known the pipeline polls for the receipt; a reverted receipt is terminal
//! and a timeout is reported as pending, never resubmitted.

pub mod route;
pub mod units;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::domain::{Action, Holding, Opportunity, TxHash};
use crate::error::ExecutionError;
use crate::infrastructure::retry::{retry_async, RetryPolicy};
use crate::port::inbound::executor::{ActionExecutor, ExecutionResult, Outcome};
use crate::port::outbound::builder::{PortalRequest, TransactionBuilder, TxPayload};
use crate::port::outbound::chain::{CallRequest, ChainClient, TxSigner, UnsignedTx};
use crate::port::outbound::token::TokenMetadata;

use route::{
    allowance_calldata, approve_calldata, decode_allowance, ensure_depositable,
    pool_withdraw_calldata, vault_redeem_calldata, WithdrawRoute,
};
use units::to_base_units;

/// Canonical Aave v3 pool on Arbitrum.
pub const AAVE_V3_POOL_ARBITRUM: &str = "0x794a61358D6845594F94dc1DB02A252b5b4814aD";

/// Slack allowed when a withdrawal asks for slightly more than the holding.
const BALANCE_TOLERANCE: Decimal = dec!(0.00000001);

/// Tunables for the execution pipeline.
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    /// Network name passed to the transaction builder.
    pub network: String,
    pub chain_id: u64,
    /// Slippage tolerance in percent.
    pub slippage_tolerance: Decimal,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    /// Rebuild-and-resubmit policy for transport failures.
    pub retry: RetryPolicy,
    pub aave_pool: Address,
    /// Approve the builder's target contract before deposits when needed.
    pub auto_approve: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            network: "arbitrum".to_string(),
            chain_id: 42161,
            slippage_tolerance: dec!(0.5),
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
            retry: RetryPolicy::new(3, Duration::from_millis(500)),
            aave_pool: Address::from_str(AAVE_V3_POOL_ARBITRUM).unwrap_or(Address::ZERO),
            auto_approve: true,
        }
    }
}

/// Executes actions for a single wallet.
///
/// Submissions are serialized on an internal lock so two concurrent
/// `execute` calls never read the same pending nonce. Use one pipeline per
/// wallet.
pub struct ExecutionPipeline {
    chain: Arc<dyn ChainClient>,
    signer: Arc<dyn TxSigner>,
    builder: Arc<dyn TransactionBuilder>,
    tokens: Arc<dyn TokenMetadata>,
    settings: ExecutionSettings,
    wallet: Mutex<()>,
}

impl ExecutionPipeline {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        signer: Arc<dyn TxSigner>,
        builder: Arc<dyn TransactionBuilder>,
        tokens: Arc<dyn TokenMetadata>,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            chain,
            signer,
            builder,
            tokens,
            settings,
            wallet: Mutex::new(()),
        }
    }

    /// Wallet address transactions are sent from.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    #[must_use]
    pub const fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    async fn deposit(
        &self,
        target: &Opportunity,
        amount: Decimal,
    ) -> Result<Outcome, ExecutionError> {
        ensure_depositable(target.protocol_key())?;

        let underlying = target.underlying_asset();
        let input_token = self.token_address(underlying)?;
        let input_amount = positive_base_units(amount, self.tokens.decimals(underlying))?;
        let output_token = parse_address(target.asset_address(), target.asset())?;

        let request = PortalRequest {
            sender: self.address(),
            network: self.settings.network.clone(),
            input_token,
            input_amount,
            output_token,
            slippage_tolerance: self.settings.slippage_tolerance,
            gas_price: None,
            gas_limit: None,
        };
        let quote = self.builder.build_portal(&request).await?;
        debug!(
            to = %quote.tx.to,
            output_amount = %quote.output_amount,
            gas_estimate = quote.gas_estimate,
            "Deposit transaction built"
        );

        if self.settings.auto_approve {
            if let Some(blocked) = self
                .ensure_allowance(input_token, quote.tx.to, input_amount)
                .await?
            {
                return Ok(blocked);
            }
        }

        Ok(self.submit(&quote.tx, "deposit").await)
    }

    async fn withdraw(&self, source: &Holding, amount: Decimal) -> Result<Outcome, ExecutionError> {
        let opportunity = source.opportunity();
        let route = WithdrawRoute::for_protocol(opportunity.protocol_key())?;

        if amount > source.balance() + BALANCE_TOLERANCE {
            return Err(ExecutionError::InvalidAmount(format!(
                "withdraw of {amount} exceeds balance {}",
                source.balance()
            )));
        }

        let payload = match route {
            WithdrawRoute::LendingPool => {
                let underlying = opportunity.underlying_asset();
                let asset = self.token_address(underlying)?;
                let units = positive_base_units(amount, self.tokens.decimals(underlying))?;
                TxPayload {
                    to: self.settings.aave_pool,
                    data: pool_withdraw_calldata(asset, units, self.address()),
                    value: U256::ZERO,
                }
            }
            WithdrawRoute::VaultRedeem => {
                let vault = parse_address(opportunity.asset_address(), opportunity.asset())?;
                let units = positive_base_units(amount, self.tokens.decimals(opportunity.asset()))?;
                TxPayload {
                    to: vault,
                    data: vault_redeem_calldata(units),
                    value: U256::ZERO,
                }
            }
        };

        Ok(self.submit(&payload, "withdraw").await)
    }

    /// Make sure `spender` may pull `amount` of `token`. Returns the outcome
    /// to report when the approval did not confirm.
    async fn ensure_allowance(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Option<Outcome>, ExecutionError> {
        let owner = self.address();
        let raw = self
            .chain
            .call(&CallRequest {
                from: owner,
                to: token,
                data: allowance_calldata(owner, spender),
                value: U256::ZERO,
            })
            .await?;
        let allowance = decode_allowance(&raw)?;
        if allowance >= amount {
            debug!(token = %token, spender = %spender, allowance = %allowance, "Allowance sufficient");
            return Ok(None);
        }

        info!(token = %token, spender = %spender, amount = %amount, "Approving token spend");
        let approval = TxPayload {
            to: token,
            data: approve_calldata(spender, amount),
            value: U256::ZERO,
        };
        match self.submit(&approval, "approve").await {
            Outcome::Confirmed { .. } => Ok(None),
            Outcome::Pending { tx_hash } => Ok(Some(Outcome::Failed {
                error: ExecutionError::ChainSubmission(format!(
                    "approval {tx_hash} not confirmed before timeout"
                )),
            })),
            failed @ Outcome::Failed { .. } => Ok(Some(failed)),
        }
    }

    /// Build, sign, and send `payload`, then wait for its receipt.
    async fn submit(&self, payload: &TxPayload, label: &'static str) -> Outcome {
        let sent = {
            let _wallet = self.wallet.lock().await;
            retry_async(self.settings.retry, ExecutionError::is_retryable, move |attempt| {
                self.send_once(payload, label, attempt)
            })
            .await
        };

        match sent {
            Ok(tx_hash) => self.await_receipt(tx_hash, label).await,
            Err(error) => {
                error!(kind = label, error = %error, "Transaction was not submitted");
                Outcome::Failed { error }
            }
        }
    }

    /// One attempt: fresh nonce, fresh gas price, fresh estimate.
    async fn send_once(
        &self,
        payload: &TxPayload,
        label: &'static str,
        attempt: usize,
    ) -> Result<TxHash, ExecutionError> {
        let from = self.address();
        let nonce = self.chain.pending_nonce(from).await?;
        let gas_price = self.chain.gas_price().await?;
        let gas_limit = self
            .chain
            .estimate_gas(&CallRequest {
                from,
                to: payload.to,
                data: payload.data.clone(),
                value: payload.value,
            })
            .await?;

        let tx = UnsignedTx {
            chain_id: self.settings.chain_id,
            nonce,
            gas_price,
            gas_limit,
            to: payload.to,
            value: payload.value,
            data: payload.data.clone(),
        };
        let signed = self.signer.sign(&tx)?;
        let tx_hash = self.chain.send_raw_transaction(&signed.raw).await?;

        info!(
            kind = label,
            attempt,
            nonce,
            gas_price,
            gas_limit,
            tx_hash = %tx_hash,
            "Transaction submitted"
        );
        Ok(tx_hash)
    }

    async fn await_receipt(&self, tx_hash: TxHash, label: &'static str) -> Outcome {
        let deadline = Instant::now() + self.settings.confirmation_timeout;
        loop {
            match self.chain.receipt(&tx_hash).await {
                Ok(Some(receipt)) if receipt.success => {
                    info!(
                        kind = label,
                        tx_hash = %tx_hash,
                        block = ?receipt.block_number,
                        gas_used = receipt.gas_used,
                        "Transaction confirmed"
                    );
                    return Outcome::Confirmed { tx_hash, receipt };
                }
                Ok(Some(_)) => {
                    error!(kind = label, tx_hash = %tx_hash, "Transaction reverted");
                    return Outcome::Failed {
                        error: ExecutionError::OnChainRevert { tx_hash },
                    };
                }
                Ok(None) => {}
                Err(e) => warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed"),
            }

            if Instant::now() >= deadline {
                warn!(
                    kind = label,
                    tx_hash = %tx_hash,
                    timeout_secs = self.settings.confirmation_timeout.as_secs(),
                    "Receipt not seen before timeout"
                );
                return Outcome::Pending { tx_hash };
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    fn token_address(&self, symbol: &str) -> Result<Address, ExecutionError> {
        self.tokens
            .address(symbol)
            .ok_or_else(|| ExecutionError::UnknownToken {
                symbol: symbol.to_string(),
            })
    }
}

#[async_trait]
impl ActionExecutor for ExecutionPipeline {
    async fn execute(&self, action: Action) -> ExecutionResult {
        info!(action = %action, "Executing action");
        let outcome = match &action {
            Action::Deposit { target, amount } => self.deposit(target, *amount).await,
            Action::Withdraw { source, amount } => self.withdraw(source, *amount).await,
        };

        match outcome {
            Ok(outcome) => ExecutionResult::new(action, outcome),
            Err(error) => {
                error!(action = %action, error = %error, "Action failed before submission");
                ExecutionResult::failed(action, error)
            }
        }
    }
}

fn positive_base_units(amount: Decimal, decimals: u8) -> Result<U256, ExecutionError> {
    let units = to_base_units(amount, decimals)?;
    if units.is_zero() {
        return Err(ExecutionError::InvalidAmount(format!(
            "{amount} rounds to zero at {decimals} decimals"
        )));
    }
    Ok(units)
}

fn parse_address(address: &str, symbol: &str) -> Result<Address, ExecutionError> {
    Address::from_str(address).map_err(|_| ExecutionError::UnknownToken {
        symbol: symbol.to_string(),
    })
}
