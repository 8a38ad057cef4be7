//! HTTP JSON-RPC simulation client built on reqwest.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

use super::{RpcError, SimulateConfig, SimulationClient, SimulationResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC client for a single HTTP endpoint.
#[derive(Debug)]
pub struct HttpSimulationClient {
    url: String,
    client: reqwest::Client,
    request_id: AtomicU64,
}

impl HttpSimulationClient {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        Self::new_with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn new_with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
            request_id: AtomicU64::new(1),
        })
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(url = %self.url, method, id, "Sending JSON-RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let mut body: Value = response.json().await?;

        if body["error"].is_object() {
            let error: RpcErrorBody = serde_json::from_value(body["error"].take())
                .map_err(|e| RpcError::MalformedResponse(format!("error object: {e}")))?;
            return Err(RpcError::RpcResponse {
                code: error.code,
                message: error.message,
            });
        }

        let result = body["result"].take();
        if result.is_null() {
            return Err(RpcError::MalformedResponse(
                "response carries neither result nor error".to_string(),
            ));
        }
        Ok(result)
    }
}

#[async_trait]
impl SimulationClient for HttpSimulationClient {
    async fn simulate_transaction(
        &self,
        wire_transaction: &[u8],
        config: &SimulateConfig,
    ) -> Result<SimulationResult, RpcError> {
        let encoded = BASE64_STANDARD.encode(wire_transaction);
        let params = json!([encoded, config]);
        let result = self.send_request("simulateTransaction", params).await?;

        // The node wraps the simulation verdict in a context envelope.
        let value = result
            .get("value")
            .cloned()
            .ok_or_else(|| RpcError::MalformedResponse("missing result.value".to_string()))?;
        let simulation: SimulationResult = serde_json::from_value(value)
            .map_err(|e| RpcError::MalformedResponse(format!("result.value: {e}")))?;

        debug!(
            url = %self.url,
            units_consumed = ?simulation.units_consumed,
            failed = simulation.err.is_some(),
            "Simulated transaction"
        );
        Ok(simulation)
    }
}
