//! Compute unit limit estimation via simulation.
//!
//! Requesting exactly the units a transaction needs (plus a chosen
//! margin) instead of the default per-instruction allowance lowers fees
//! and improves scheduling. The estimator patches the message to request
//! the maximum limit, simulates it with signature verification off, and
//! reads back the units the node actually consumed.

use thiserror::Error;
use tracing::instrument;

use crate::compile::{compile_transaction_message, AddressLookupTable, CompileError};
use crate::message::{
    set_or_append_compute_unit_limit, TransactionMessage, MAX_COMPUTE_UNIT_LIMIT,
};
use crate::rpc::{Commitment, RpcError, SimulateConfig, SimulationClient};
use crate::transaction::{Transaction, TransactionError};

/// Errors raised while estimating a compute unit limit.
#[derive(Debug, Error)]
pub enum EstimateError {
    /// The simulated transaction failed at runtime.
    #[error("transaction failed when simulating to estimate the compute limit: {error}")]
    FailedWhenSimulatingToEstimateComputeLimit {
        error: serde_json::Value,
        units_consumed: Option<u64>,
    },

    /// The node reported success but no consumed unit count.
    #[error("simulation reported no consumed compute units")]
    FailedToEstimateComputeLimit,

    /// The provisional message could not be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The compiled message could not be wrapped in a transaction.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// The simulation request itself failed.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Options for one estimation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimateOptions {
    /// Commitment the node should simulate at.
    pub commitment: Option<Commitment>,
    /// Minimum slot the node must have processed before simulating.
    pub min_context_slot: Option<u64>,
    /// Extra units added on top of the measured consumption, capped at
    /// the network maximum.
    pub margin_cus: u32,
}

/// Estimates the compute unit limit the message needs by simulating it.
///
/// The message itself is not modified. A clone gets its
/// `SetComputeUnitLimit` instruction replaced with the maximum limit, or
/// one appended if none exists, so the simulation is never cut short by
/// a limit the caller already set. The returned value is the consumed
/// unit count plus `margin_cus`.
#[instrument(skip_all, fields(instructions = message.instructions().len()))]
pub async fn estimate_compute_unit_limit(
    message: &TransactionMessage,
    tables: &[AddressLookupTable],
    client: &dyn SimulationClient,
    options: &EstimateOptions,
) -> Result<u32, EstimateError> {
    let mut provisional = message.clone();
    set_or_append_compute_unit_limit(provisional.instructions_mut(), MAX_COMPUTE_UNIT_LIMIT);

    let compiled = compile_transaction_message(&provisional, tables)?;
    let transaction = Transaction::new_unsigned(compiled.to_bytes()?)?;
    let wire_transaction = transaction.to_wire_bytes()?;

    let config = SimulateConfig {
        sig_verify: false,
        // A durable nonce lifetime must survive simulation untouched;
        // anything else may be stale, so let the node substitute a
        // current blockhash.
        replace_recent_blockhash: !message.is_durable_nonce(),
        commitment: options.commitment,
        min_context_slot: options.min_context_slot,
        ..Default::default()
    };
    let simulation = client.simulate_transaction(&wire_transaction, &config).await?;

    if let Some(error) = simulation.err {
        return Err(EstimateError::FailedWhenSimulatingToEstimateComputeLimit {
            error,
            units_consumed: simulation.units_consumed,
        });
    }
    let units = simulation
        .units_consumed
        .ok_or(EstimateError::FailedToEstimateComputeLimit)?;
    let units = u32::try_from(units).unwrap_or(u32::MAX);

    let limit = if options.margin_cus > 0 {
        units
            .saturating_add(options.margin_cus)
            .min(MAX_COMPUTE_UNIT_LIMIT)
    } else {
        units
    };
    tracing::debug!(units, limit, "Estimated compute unit limit");
    Ok(limit)
}
