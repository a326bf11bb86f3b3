//! Decision orchestrator.
//!
//! One cycle walks `Idle -> Evaluating -> Acting -> Done`: fetch the feed,
//! optimize, clip, diff against holdings, then execute the resulting actions
//! in order. Nothing is carried from one cycle to the next except the
//! position book.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::application::optimizer::YieldOptimizer;
use crate::application::rebalance::{holdings_from_balances, Rebalancer};
use crate::application::risk::RiskLimiter;
use crate::domain::{Action, Holding, Opportunity, PositionBook};
use crate::error::EvaluationError;
use crate::port::inbound::executor::{ActionExecutor, ExecutionResult, Outcome};
use crate::port::outbound::feed::{AccountBalances, FeedQuery, OpportunityFeed};

/// Where a cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Evaluating,
    Acting,
    Done,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Evaluating => "evaluating",
            Self::Acting => "acting",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Inputs to one evaluation. Every field is required; a missing one is an
/// `EvaluationError::MissingInput`, distinct from "nothing to do".
#[derive(Debug, Clone, Default)]
pub struct DecisionContext {
    pub optimizer: Option<YieldOptimizer>,
    pub rebalancer: Option<Rebalancer>,
    pub holdings: Option<Vec<Holding>>,
    pub market_data: Option<Vec<Opportunity>>,
    pub capital: Option<Decimal>,
}

impl DecisionContext {
    /// Context with the default optimizer and rebalancer and no data.
    #[must_use]
    pub fn new() -> Self {
        Self {
            optimizer: Some(YieldOptimizer::new()),
            rebalancer: Some(Rebalancer::new()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_holdings(mut self, holdings: Vec<Holding>) -> Self {
        self.holdings = Some(holdings);
        self
    }

    #[must_use]
    pub fn with_market_data(mut self, market_data: Vec<Opportunity>) -> Self {
        self.market_data = Some(market_data);
        self
    }

    #[must_use]
    pub fn with_capital(mut self, capital: Decimal) -> Self {
        self.capital = Some(capital);
        self
    }
}

/// Summary of one full cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of opportunities the feed returned.
    pub opportunities: usize,
    /// Set when evaluation failed; `results` is then empty.
    pub evaluation_error: Option<EvaluationError>,
    pub results: Vec<ExecutionResult>,
}

impl CycleReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    #[must_use]
    pub fn confirmed(&self) -> usize {
        self.count(Outcome::is_confirmed)
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.count(Outcome::is_pending)
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failed)
    }
}

/// Sequences feed, optimizer, limiter, differencer, and executor.
pub struct DecisionEngine {
    feed: Arc<dyn OpportunityFeed>,
    executor: Arc<dyn ActionExecutor>,
    accounts: Option<(Arc<dyn AccountBalances>, String)>,
    query: FeedQuery,
    limiter: RiskLimiter,
    book: PositionBook,
    phase: CyclePhase,
}

impl DecisionEngine {
    pub fn new(
        feed: Arc<dyn OpportunityFeed>,
        executor: Arc<dyn ActionExecutor>,
        query: FeedQuery,
        limiter: RiskLimiter,
    ) -> Self {
        Self {
            feed,
            executor,
            accounts: None,
            query,
            limiter,
            book: PositionBook::new(),
            phase: CyclePhase::Idle,
        }
    }

    /// Read holdings from live account balances of `owner` instead of the
    /// local position book.
    #[must_use]
    pub fn with_account_source(
        mut self,
        accounts: Arc<dyn AccountBalances>,
        owner: impl Into<String>,
    ) -> Self {
        self.accounts = Some((accounts, owner.into()));
        self
    }

    #[must_use]
    pub const fn phase(&self) -> CyclePhase {
        self.phase
    }

    #[must_use]
    pub const fn book(&self) -> &PositionBook {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut PositionBook {
        &mut self.book
    }

    /// Produce the action list for `context`.
    ///
    /// An empty `Ok` means the portfolio already matches its targets.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::MissingInput` for an incomplete context and
    /// `EvaluationError::Domain` if the optimizer rejects its inputs.
    pub fn evaluate(&self, context: DecisionContext) -> Result<Vec<Action>, EvaluationError> {
        let optimizer = context
            .optimizer
            .ok_or(EvaluationError::MissingInput { field: "optimizer" })?;
        let rebalancer = context
            .rebalancer
            .ok_or(EvaluationError::MissingInput { field: "rebalancer" })?;
        let holdings = context
            .holdings
            .ok_or(EvaluationError::MissingInput { field: "holdings" })?;
        let market_data = context
            .market_data
            .ok_or(EvaluationError::MissingInput { field: "market_data" })?;
        let capital = context
            .capital
            .ok_or(EvaluationError::MissingInput { field: "capital" })?;

        let allocations = optimizer.suggest_allocations(capital, &market_data)?;
        let suggested = allocations.len();
        let limited = self.limiter.enforce_limits(allocations);
        let actions = rebalancer.compute_rebalance(&holdings, &limited);

        info!(
            capital = %capital,
            opportunities = market_data.len(),
            holdings = holdings.len(),
            allocations = suggested,
            after_limits = limited.len(),
            actions = actions.len(),
            "Evaluation complete"
        );
        Ok(actions)
    }

    /// Execute `actions` one at a time, in order. A failed action never
    /// stops the ones after it.
    pub async fn act(actions: Vec<Action>, executor: &dyn ActionExecutor) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(actions.len());
        for action in actions {
            let result = executor.execute(action).await;
            if let Outcome::Failed { error } = &result.outcome {
                warn!(action = %result.action, error = %error, "Action failed, continuing");
            }
            results.push(result);
        }
        results
    }

    /// Fetch inputs and evaluate without executing anything.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError` if the feed or evaluation fails.
    pub async fn plan(&mut self, capital: Decimal) -> Result<Vec<Action>, EvaluationError> {
        self.phase = CyclePhase::Evaluating;
        let result = self.gather_and_evaluate(capital).await.map(|(_, actions)| actions);
        self.phase = CyclePhase::Done;
        result
    }

    /// Run one full cycle and apply confirmed results to the position book.
    pub async fn run_cycle(&mut self, capital: Decimal) -> CycleReport {
        let started_at = Utc::now();
        self.phase = CyclePhase::Evaluating;
        info!(phase = %self.phase, capital = %capital, "Cycle started");

        let (opportunities, actions) = match self.gather_and_evaluate(capital).await {
            Ok(found) => found,
            Err(e) => {
                error!(error = %e, "Evaluation failed, skipping cycle");
                self.phase = CyclePhase::Done;
                return CycleReport {
                    started_at,
                    finished_at: Utc::now(),
                    opportunities: 0,
                    evaluation_error: Some(e),
                    results: Vec::new(),
                };
            }
        };

        self.phase = CyclePhase::Acting;
        let executor = Arc::clone(&self.executor);
        let results = Self::act(actions, executor.as_ref()).await;
        for result in &results {
            self.apply(result);
        }

        self.phase = CyclePhase::Done;
        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            opportunities,
            evaluation_error: None,
            results,
        };
        info!(
            phase = %self.phase,
            actions = report.results.len(),
            confirmed = report.confirmed(),
            pending = report.pending(),
            failed = report.failed(),
            "Cycle finished"
        );
        report
    }

    async fn gather_and_evaluate(
        &self,
        capital: Decimal,
    ) -> Result<(usize, Vec<Action>), EvaluationError> {
        let market_data = self.feed.fetch_opportunities(&self.query).await?;
        info!(count = market_data.len(), network = %self.query.network, "Opportunities fetched");

        let holdings = match &self.accounts {
            Some((accounts, owner)) => {
                let networks = vec![self.query.network.clone()];
                let balances = accounts.fetch_balances(owner, &networks).await?;
                holdings_from_balances(&balances, &market_data)
            }
            None => self.book.holdings(),
        };

        let count = market_data.len();
        let context = DecisionContext::new()
            .with_holdings(holdings)
            .with_market_data(market_data)
            .with_capital(capital);
        Ok((count, self.evaluate(context)?))
    }

    fn apply(&mut self, result: &ExecutionResult) {
        let Outcome::Confirmed { tx_hash, .. } = &result.outcome else {
            return;
        };
        let now = Utc::now();
        let applied = match &result.action {
            Action::Deposit { target, amount } => self
                .book
                .apply_deposit(target, *amount, tx_hash.clone(), now)
                .map(|_| ()),
            Action::Withdraw { source, amount } => self
                .book
                .apply_withdraw(source.key(), *amount, tx_hash.clone(), now)
                .map(|_| ()),
        };
        if let Err(e) = applied {
            warn!(action = %result.action, error = %e, "Could not apply result to position book");
        }
    }
}
