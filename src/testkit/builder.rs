//! Canned transaction builder.

use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::error::ExecutionError;
use crate::port::outbound::builder::{PortalQuote, PortalRequest, TransactionBuilder, TxPayload};
use crate::testkit::domain::address_for;

/// Returns the same quote for every request, targeting [`StaticBuilder::router`].
#[derive(Debug)]
pub struct StaticBuilder {
    router: Address,
    error: Option<ExecutionError>,
    requests: Mutex<Vec<PortalRequest>>,
}

impl Default for StaticBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticBuilder {
    pub fn new() -> Self {
        Self {
            router: address_for("portals-router"),
            error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Builder that fails every request with `error`.
    pub fn failing(error: ExecutionError) -> Self {
        Self {
            error: Some(error),
            ..Self::new()
        }
    }

    /// Contract every quote targets.
    pub const fn router(&self) -> Address {
        self.router
    }

    pub fn requests(&self) -> Vec<PortalRequest> {
        self.requests.lock().expect("builder state").clone()
    }
}

#[async_trait]
impl TransactionBuilder for StaticBuilder {
    async fn build_portal(&self, request: &PortalRequest) -> Result<PortalQuote, ExecutionError> {
        self.requests.lock().expect("builder state").push(request.clone());
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        Ok(PortalQuote {
            tx: TxPayload {
                to: self.router,
                data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
                value: U256::ZERO,
            },
            output_amount: request.input_amount.to_string(),
            gas_estimate: 200_000,
            route: vec!["portals".to_string()],
            simulation_success: true,
        })
    }
}
