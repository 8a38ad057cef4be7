//! Minimal JSON-RPC surface for transaction simulation.
//!
//! Only the `simulateTransaction` method is modeled here. The client is
//! behind the [`SimulationClient`] trait so the compute budget estimator
//! can run against a mock in tests and an HTTP endpoint in production.

mod http;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpSimulationClient;

/// Commitment level for simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

/// Configuration for a `simulateTransaction` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateConfig {
    pub sig_verify: bool,
    pub replace_recent_blockhash: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment: Option<Commitment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_context_slot: Option<u64>,
    pub encoding: &'static str,
}

impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            sig_verify: false,
            replace_recent_blockhash: false,
            commitment: None,
            min_context_slot: None,
            encoding: "base64",
        }
    }
}

/// The `value` object of a `simulateTransaction` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Runtime error the transaction hit, if any.
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    /// Compute units the transaction consumed.
    #[serde(default)]
    pub units_consumed: Option<u64>,
    /// Program log output.
    #[serde(default)]
    pub logs: Option<Vec<String>>,
}

/// Errors raised by simulation clients.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The endpoint returned a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    RpcResponse { code: i64, message: String },

    /// The endpoint responded with something other than the expected shape.
    #[error("malformed rpc response: {0}")]
    MalformedResponse(String),

    /// The HTTP request itself failed.
    #[error("rpc transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Anything that can simulate a serialized transaction.
#[async_trait]
pub trait SimulationClient: Send + Sync {
    /// Simulates the wire-encoded transaction and returns the node's verdict.
    async fn simulate_transaction(
        &self,
        wire_transaction: &[u8],
        config: &SimulateConfig,
    ) -> Result<SimulationResult, RpcError>;
}

/// In-memory simulation client that replays queued results, recording
/// every request it receives.
#[derive(Debug, Default)]
pub struct MockSimulationClient {
    results: Mutex<VecDeque<Result<SimulationResult, (i64, String)>>>,
    requests: Mutex<Vec<(Vec<u8>, SimulateConfig)>>,
}

impl MockSimulationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful simulation result.
    pub fn push_result(&self, result: SimulationResult) {
        self.results.lock().unwrap().push_back(Ok(result));
    }

    /// Queues a JSON-RPC error response.
    pub fn push_error(&self, code: i64, message: impl Into<String>) {
        self.results
            .lock()
            .unwrap()
            .push_back(Err((code, message.into())));
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<(Vec<u8>, SimulateConfig)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimulationClient for MockSimulationClient {
    async fn simulate_transaction(
        &self,
        wire_transaction: &[u8],
        config: &SimulateConfig,
    ) -> Result<SimulationResult, RpcError> {
        self.requests
            .lock()
            .unwrap()
            .push((wire_transaction.to_vec(), config.clone()));
        match self.results.lock().unwrap().pop_front() {
            Some(Ok(result)) => Ok(result),
            Some(Err((code, message))) => Err(RpcError::RpcResponse { code, message }),
            None => Err(RpcError::MalformedResponse(
                "no queued simulation result".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_config_serializes_camel_case_and_skips_none() {
        let config = SimulateConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(Commitment::Confirmed),
            min_context_slot: None,
            encoding: "base64",
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["sigVerify"], false);
        assert_eq!(json["replaceRecentBlockhash"], true);
        assert_eq!(json["commitment"], "confirmed");
        assert_eq!(json["encoding"], "base64");
        assert!(json.get("minContextSlot").is_none());
    }

    #[test]
    fn test_simulation_result_parses_partial_response() {
        let result: SimulationResult =
            serde_json::from_str(r#"{"err":null,"unitsConsumed":1234}"#).unwrap();
        assert!(result.err.is_none());
        assert_eq!(result.units_consumed, Some(1234));
        assert!(result.logs.is_none());
    }

    #[tokio::test]
    async fn test_mock_client_replays_results_in_order() {
        let client = MockSimulationClient::new();
        client.push_result(SimulationResult {
            units_consumed: Some(500),
            ..Default::default()
        });
        client.push_error(-32002, "node is behind");

        let first = client
            .simulate_transaction(&[1, 2, 3], &SimulateConfig::default())
            .await
            .unwrap();
        assert_eq!(first.units_consumed, Some(500));

        let second = client
            .simulate_transaction(&[4], &SimulateConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(second, RpcError::RpcResponse { code: -32002, .. }));

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, vec![1, 2, 3]);
    }
}
