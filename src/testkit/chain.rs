//! Scripted chain client.
//!
//! Every method call is recorded. Failures and receipt behavior are
//! scripted up front so tests can drive the execution pipeline through
//! retries, reverts, and timeouts deterministically.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::domain::TxHash;
use crate::error::ChainError;
use crate::port::outbound::chain::{CallRequest, ChainClient, TxReceipt};

/// What the chain reports for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptScript {
    /// Mined successfully on the first poll.
    Success,
    /// Mined with a failed status on the first poll.
    Revert,
    /// Never mined.
    Never,
    /// Not found for `n` polls, then mined successfully.
    AfterPolls(usize),
}

/// One recorded chain interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainCall {
    PendingNonce,
    GasPrice,
    EstimateGas,
    Call,
    SendRaw,
    Receipt,
}

#[derive(Debug)]
struct State {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    allowance: U256,
    send_failures: VecDeque<ChainError>,
    gas_price_failures: VecDeque<ChainError>,
    receipt_scripts: VecDeque<ReceiptScript>,
    default_receipt: ReceiptScript,
    mined: HashMap<TxHash, (ReceiptScript, usize)>,
    sent: Vec<Bytes>,
    calls: Vec<ChainCall>,
    nonces_served: Vec<u64>,
    gas_prices_served: Vec<u128>,
}

/// In-memory [`ChainClient`] with scripted behavior.
#[derive(Debug)]
pub struct ScriptedChain {
    state: Mutex<State>,
}

impl Default for ScriptedChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedChain {
    /// Chain where every call succeeds and every receipt is successful.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                nonce: 0,
                gas_price: 100_000_000,
                gas_limit: 250_000,
                allowance: U256::MAX,
                send_failures: VecDeque::new(),
                gas_price_failures: VecDeque::new(),
                receipt_scripts: VecDeque::new(),
                default_receipt: ReceiptScript::Success,
                mined: HashMap::new(),
                sent: Vec::new(),
                calls: Vec::new(),
                nonces_served: Vec::new(),
                gas_prices_served: Vec::new(),
            }),
        }
    }

    fn with_state(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().expect("chain state"));
        self
    }

    /// Fail the next `send_raw_transaction` calls with these errors, in order.
    pub fn with_send_failures(self, failures: Vec<ChainError>) -> Self {
        self.with_state(|s| s.send_failures = failures.into())
    }

    /// Fail the next `gas_price` calls with these errors, in order.
    pub fn with_gas_price_failures(self, failures: Vec<ChainError>) -> Self {
        self.with_state(|s| s.gas_price_failures = failures.into())
    }

    /// Receipt behavior for each submitted transaction, in submission order.
    /// Transactions beyond the script use the default.
    pub fn with_receipts(self, scripts: Vec<ReceiptScript>) -> Self {
        self.with_state(|s| s.receipt_scripts = scripts.into())
    }

    pub fn with_default_receipt(self, script: ReceiptScript) -> Self {
        self.with_state(|s| s.default_receipt = script)
    }

    /// Allowance returned by any `call`.
    pub fn with_allowance(self, allowance: U256) -> Self {
        self.with_state(|s| s.allowance = allowance)
    }

    pub fn with_nonce(self, nonce: u64) -> Self {
        self.with_state(|s| s.nonce = nonce)
    }

    /// Change the gas price served from now on.
    pub fn set_gas_price(&self, gas_price: u128) {
        self.state.lock().expect("chain state").gas_price = gas_price;
    }

    /// Every interaction, in order.
    pub fn calls(&self) -> Vec<ChainCall> {
        self.state.lock().expect("chain state").calls.clone()
    }

    pub fn count(&self, call: &ChainCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    /// Raw transactions accepted by the node.
    pub fn sent(&self) -> Vec<Bytes> {
        self.state.lock().expect("chain state").sent.clone()
    }

    /// Nonces handed out, one per `pending_nonce` call.
    pub fn nonces_served(&self) -> Vec<u64> {
        self.state.lock().expect("chain state").nonces_served.clone()
    }

    /// Gas prices handed out, one per successful `gas_price` call.
    pub fn gas_prices_served(&self) -> Vec<u128> {
        self.state.lock().expect("chain state").gas_prices_served.clone()
    }

    fn record(&self, call: ChainCall) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().expect("chain state");
        state.calls.push(call);
        state
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn pending_nonce(&self, _address: Address) -> Result<u64, ChainError> {
        let mut state = self.record(ChainCall::PendingNonce);
        let nonce = state.nonce;
        state.nonces_served.push(nonce);
        Ok(nonce)
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        let mut state = self.record(ChainCall::GasPrice);
        if let Some(err) = state.gas_price_failures.pop_front() {
            return Err(err);
        }
        let price = state.gas_price;
        state.gas_prices_served.push(price);
        Ok(price)
    }

    async fn estimate_gas(&self, _call: &CallRequest) -> Result<u64, ChainError> {
        Ok(self.record(ChainCall::EstimateGas).gas_limit)
    }

    async fn call(&self, _call: &CallRequest) -> Result<Bytes, ChainError> {
        let state = self.record(ChainCall::Call);
        Ok(Bytes::from(state.allowance.to_be_bytes::<32>().to_vec()))
    }

    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<TxHash, ChainError> {
        let mut state = self.record(ChainCall::SendRaw);
        if let Some(err) = state.send_failures.pop_front() {
            return Err(err);
        }
        state.sent.push(raw.clone());
        state.nonce += 1;

        let hash = TxHash::new(format!("0x{:064x}", state.sent.len()));
        let script = state
            .receipt_scripts
            .pop_front()
            .unwrap_or(state.default_receipt);
        state.mined.insert(hash.clone(), (script, 0));
        Ok(hash)
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>, ChainError> {
        let mut state = self.record(ChainCall::Receipt);
        let Some((script, polls)) = state.mined.get_mut(hash) else {
            return Ok(None);
        };
        *polls += 1;

        let success = match *script {
            ReceiptScript::Success => true,
            ReceiptScript::Revert => false,
            ReceiptScript::Never => return Ok(None),
            ReceiptScript::AfterPolls(n) if *polls <= n => return Ok(None),
            ReceiptScript::AfterPolls(_) => true,
        };
        Ok(Some(TxReceipt {
            tx_hash: hash.clone(),
            success,
            block_number: Some(1),
            gas_used: 21_000,
        }))
    }
}
