//! Transaction builder port.
//!
//! Deposits are routed through an external API that turns "swap X of token A
//! into token B" into ready-to-sign calldata.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::ExecutionError;

/// Request for a deposit/swap transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalRequest {
    pub sender: Address,
    pub network: String,
    pub input_token: Address,
    /// Input amount in base units.
    pub input_amount: U256,
    pub output_token: Address,
    /// Slippage tolerance in percent (0.5 = 0.5%).
    pub slippage_tolerance: Decimal,
    pub gas_price: Option<u128>,
    pub gas_limit: Option<u64>,
}

/// Transaction payload returned by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPayload {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// A built deposit transaction plus the builder's estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalQuote {
    pub tx: TxPayload,
    /// Expected output in base units of the output token.
    pub output_amount: String,
    pub gas_estimate: u64,
    pub route: Vec<String>,
    pub simulation_success: bool,
}

#[async_trait]
pub trait TransactionBuilder: Send + Sync {
    /// Build a deposit transaction.
    ///
    /// A response missing the payload, the output estimate, or the gas
    /// estimate is an `ExecutionError::TransactionBuild`.
    async fn build_portal(&self, request: &PortalRequest) -> Result<PortalQuote, ExecutionError>;
}
