//! Static feed, balances, and a scripted executor.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Action, Opportunity, TxHash};
use crate::error::{ExecutionError, FeedError};
use crate::port::inbound::executor::{ActionExecutor, ExecutionResult, Outcome};
use crate::port::outbound::chain::TxReceipt;
use crate::port::outbound::feed::{AccountBalance, AccountBalances, FeedQuery, OpportunityFeed};

/// Feed returning a fixed snapshot, or a fixed error.
#[derive(Debug)]
pub struct StaticFeed {
    result: Result<Vec<Opportunity>, FeedError>,
    queries: Mutex<Vec<FeedQuery>>,
}

impl StaticFeed {
    pub fn new(opportunities: Vec<Opportunity>) -> Self {
        Self {
            result: Ok(opportunities),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: FeedError) -> Self {
        Self {
            result: Err(error),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<FeedQuery> {
        self.queries.lock().expect("feed state").clone()
    }
}

#[async_trait]
impl OpportunityFeed for StaticFeed {
    async fn fetch_opportunities(&self, query: &FeedQuery) -> Result<Vec<Opportunity>, FeedError> {
        self.queries.lock().expect("feed state").push(query.clone());
        self.result.clone()
    }
}

/// Account source returning fixed balances.
#[derive(Debug, Default)]
pub struct StaticBalances {
    balances: Vec<AccountBalance>,
}

impl StaticBalances {
    pub fn new(balances: Vec<AccountBalance>) -> Self {
        Self { balances }
    }
}

#[async_trait]
impl AccountBalances for StaticBalances {
    async fn fetch_balances(
        &self,
        _owner: &str,
        _networks: &[String],
    ) -> Result<Vec<AccountBalance>, FeedError> {
        Ok(self.balances.clone())
    }
}

/// What [`ScriptedExecutor`] reports for one action.
#[derive(Debug, Clone)]
pub enum Scripted {
    Confirm,
    Pending,
    Fail(ExecutionError),
}

/// Executor that plays back outcomes in order, recording every action.
/// Actions beyond the script are confirmed.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<Scripted>>,
    executed: Mutex<Vec<Action>>,
}

impl ScriptedExecutor {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Actions in the order they were executed.
    pub fn executed(&self) -> Vec<Action> {
        self.executed.lock().expect("executor state").clone()
    }
}

#[async_trait]
impl ActionExecutor for ScriptedExecutor {
    async fn execute(&self, action: Action) -> ExecutionResult {
        let step = {
            let mut executed = self.executed.lock().expect("executor state");
            executed.push(action.clone());
            let n = executed.len();
            let next = self.script.lock().expect("executor state").pop_front();
            (n, next.unwrap_or(Scripted::Confirm))
        };
        let (n, scripted) = step;
        let tx_hash = TxHash::new(format!("0x{n:064x}"));

        let outcome = match scripted {
            Scripted::Confirm => Outcome::Confirmed {
                receipt: TxReceipt {
                    tx_hash: tx_hash.clone(),
                    success: true,
                    block_number: Some(1),
                    gas_used: 21_000,
                },
                tx_hash,
            },
            Scripted::Pending => Outcome::Pending { tx_hash },
            Scripted::Fail(error) => Outcome::Failed { error },
        };
        ExecutionResult::new(action, outcome)
    }
}
