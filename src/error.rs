use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::id::TxHash;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures talking to the opportunity/transaction-builder HTTP API.
#[derive(Error, Debug, Clone)]
pub enum FeedError {
    /// The API kept answering 429 until the retry budget ran out.
    #[error("rate limit persisted after {attempts} attempts")]
    RateLimited { attempts: usize },

    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Network(String),

    #[error("failed to parse API response: {0}")]
    Parse(String),
}

impl FeedError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Parse(_) => false,
        }
    }
}

/// Chain RPC failure, classified by whether the node ever saw the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Connection, timeout, or transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error (e.g. execution reverted).
    #[error("rejected by node: {0}")]
    Rejected(String),
}

/// Execution-related errors with structured variants.
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error("failed to build transaction: {0}")]
    TransactionBuild(String),

    #[error("transaction builder request failed: {0}")]
    Api(#[from] FeedError),

    #[error("failed to sign transaction: {0}")]
    Signing(String),

    #[error("failed to submit transaction: {0}")]
    ChainSubmission(String),

    #[error("transaction rejected: {0}")]
    ChainRejected(String),

    #[error("transaction {tx_hash} reverted on-chain")]
    OnChainRevert { tx_hash: TxHash },

    #[error("protocol not supported: {protocol}")]
    UnsupportedProtocol { protocol: String },

    #[error("unknown token: {symbol}")]
    UnknownToken { symbol: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl ExecutionError {
    /// Only network-level submission failures are worth rebuilding and resending.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ChainSubmission(_))
    }
}

impl From<ChainError> for ExecutionError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Transport(msg) => Self::ChainSubmission(msg),
            ChainError::Rejected(msg) => Self::ChainRejected(msg),
        }
    }
}

/// Why a decision cycle could not produce an action list.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("missing decision input: {field}")]
    MissingInput { field: &'static str },

    #[error("opportunity feed failed: {0}")]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
