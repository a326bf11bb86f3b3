//! Execution pipeline wired to in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use yieldlord::adapter::outbound::token::TokenRegistry;
use yieldlord::application::execution::{ExecutionPipeline, ExecutionSettings};
use yieldlord::infrastructure::retry::RetryPolicy;
use yieldlord::testkit::builder::StaticBuilder;
use yieldlord::testkit::chain::ScriptedChain;
use yieldlord::testkit::signer::RecordingSigner;

/// Settings with millisecond timings so timeouts and retries stay fast.
pub fn fast_settings() -> ExecutionSettings {
    ExecutionSettings {
        confirmation_timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(2),
        retry: RetryPolicy::new(3, Duration::from_millis(1)),
        ..ExecutionSettings::default()
    }
}

pub struct Harness {
    pub chain: Arc<ScriptedChain>,
    pub signer: Arc<RecordingSigner>,
    pub builder: Arc<StaticBuilder>,
    pub pipeline: ExecutionPipeline,
}

impl Harness {
    pub fn new(chain: ScriptedChain) -> Self {
        Self::with_parts(chain, RecordingSigner::new(), StaticBuilder::new(), fast_settings())
    }

    pub fn with_parts(
        chain: ScriptedChain,
        signer: RecordingSigner,
        builder: StaticBuilder,
        settings: ExecutionSettings,
    ) -> Self {
        let chain = Arc::new(chain);
        let signer = Arc::new(signer);
        let builder = Arc::new(builder);
        let pipeline = ExecutionPipeline::new(
            chain.clone(),
            signer.clone(),
            builder.clone(),
            Arc::new(TokenRegistry::arbitrum()),
            settings,
        );
        Self {
            chain,
            signer,
            builder,
            pipeline,
        }
    }
}
