//! Submission, simulation and confirmation
//!
//! Submission never returns `Err`: every outcome, including RPC failures and
//! timeouts, is reported through a result value the caller can inspect or
//! serialize.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_sdk::{packet::PACKET_DATA_SIZE, signature::Signature, transaction::Transaction};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::Commitment;
use crate::errors::{SdkError, SdkResult};
use crate::rpc::{rpc_context, send_config, ChainRpc};

/// Spacing between signature status polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Commitment to wait for after sending
    pub commitment: Commitment,
    pub skip_preflight: bool,
    pub confirmation_timeout: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            commitment: Commitment::default(),
            skip_preflight: false,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }
}

impl SubmitOptions {
    pub fn with_commitment(commitment: Commitment) -> Self {
        Self {
            commitment,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitResult {
    /// Convert into the signature or a [`SdkError::Transaction`]
    pub fn into_result(self) -> SdkResult<String> {
        match (self.success, self.signature) {
            (true, Some(signature)) => Ok(signature),
            (_, signature) => Err(SdkError::rejected(
                signature,
                self.error.unwrap_or_else(|| "Submission failed".to_string()),
            )),
        }
    }

    fn confirmed(signature: &Signature) -> Self {
        Self {
            success: true,
            signature: Some(signature.to_string()),
            error: None,
        }
    }

    fn failed(signature: Option<&Signature>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            signature: signature.map(|s| s.to_string()),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub success: bool,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_consumed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationResult {
    pub success: bool,
    /// Slot the transaction landed in, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSubmitResult {
    /// One entry per attempted transaction, ending at the first failure
    pub results: Vec<SubmitResult>,
    pub all_succeeded: bool,
}

impl BatchSubmitResult {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }
}

/// Reject transactions that can't be sent as they are
fn preflight_check(transaction: &Transaction) -> Result<(), String> {
    if !transaction.is_signed() {
        return Err("Transaction is not fully signed".to_string());
    }
    let size = bincode::serialized_size(transaction)
        .map_err(|e| format!("Failed to serialize transaction: {e}"))?;
    if size > PACKET_DATA_SIZE as u64 {
        return Err(format!(
            "Transaction is {size} bytes, exceeds packet limit of {PACKET_DATA_SIZE}"
        ));
    }
    Ok(())
}

/// Send a signed transaction and wait for the requested commitment
pub async fn submit_transaction<R: ChainRpc + ?Sized>(
    rpc: &R,
    transaction: &Transaction,
    options: &SubmitOptions,
) -> SubmitResult {
    if let Err(reason) = preflight_check(transaction) {
        warn!(error = %reason, "Refusing to submit transaction");
        return SubmitResult::failed(None, reason);
    }

    let commitment = options.commitment.to_config();
    let signature = match rpc
        .send_transaction(transaction, send_config(commitment, options.skip_preflight))
        .await
        .map_err(rpc_context("sendTransaction"))
    {
        Ok(signature) => signature,
        Err(e) => {
            warn!(error = %e, "Transaction send failed");
            return SubmitResult::failed(None, e.to_string());
        }
    };
    info!(signature = %signature, "Transaction sent, awaiting confirmation");

    let confirmation =
        wait_for_confirmation(rpc, &signature, options.commitment, options.confirmation_timeout)
            .await;
    if confirmation.success {
        info!(signature = %signature, slot = ?confirmation.slot, "Transaction confirmed");
        SubmitResult::confirmed(&signature)
    } else {
        let error = confirmation
            .error
            .unwrap_or_else(|| "Confirmation failed".to_string());
        warn!(signature = %signature, error = %error, "Transaction not confirmed");
        SubmitResult::failed(Some(&signature), error)
    }
}

/// Dry run without signature verification
pub async fn simulate_transaction<R: ChainRpc + ?Sized>(
    rpc: &R,
    transaction: &Transaction,
    commitment: Commitment,
) -> SimulationResult {
    match rpc
        .simulate_transaction(transaction, commitment.to_config())
        .await
        .map_err(rpc_context("simulateTransaction"))
    {
        Ok(outcome) => {
            debug!(
                units = ?outcome.units_consumed,
                logs = outcome.logs.len(),
                failed = outcome.err.is_some(),
                "Simulation finished"
            );
            SimulationResult {
                success: outcome.err.is_none(),
                logs: outcome.logs,
                units_consumed: outcome.units_consumed,
                error: outcome.err,
            }
        }
        Err(e) => {
            warn!(error = %e, "Simulation request failed");
            SimulationResult {
                success: false,
                logs: Vec::new(),
                units_consumed: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Poll the signature status once per [`POLL_INTERVAL`] until `commitment`
/// is reached, the chain reports an error, or `timeout` elapses
///
/// RPC errors while polling are logged and polling continues. A timeout too
/// large to represent as a deadline waits without one.
pub async fn wait_for_confirmation<R: ChainRpc + ?Sized>(
    rpc: &R,
    signature: &Signature,
    commitment: Commitment,
    timeout: Duration,
) -> ConfirmationResult {
    let target = commitment.to_config();
    let deadline = Instant::now().checked_add(timeout);
    let mut polls = 0u32;

    loop {
        polls += 1;
        match rpc.get_signature_status(signature).await {
            Ok(Some(status)) => {
                if let Some(err) = &status.err {
                    return ConfirmationResult {
                        success: false,
                        slot: Some(status.slot),
                        error: Some(format!("Transaction failed: {err}")),
                    };
                }
                if status.satisfies_commitment(target) {
                    debug!(signature = %signature, polls, slot = status.slot, "Commitment reached");
                    return ConfirmationResult {
                        success: true,
                        slot: Some(status.slot),
                        error: None,
                    };
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(signature = %signature, error = %e, "Status poll failed, retrying");
            }
        }

        let pause = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return ConfirmationResult {
                        success: false,
                        slot: None,
                        error: Some(format!(
                            "timeout after {timeout:?} waiting for {commitment:?} commitment of {signature}"
                        )),
                    };
                }
                remaining.min(POLL_INTERVAL)
            }
            None => POLL_INTERVAL,
        };
        sleep(pause).await;
    }
}

/// Submit transactions in order, stopping at the first failure
pub async fn submit_batch<R: ChainRpc + ?Sized>(
    rpc: &R,
    transactions: &[Transaction],
    options: &SubmitOptions,
) -> BatchSubmitResult {
    let mut results = Vec::with_capacity(transactions.len());

    for (idx, transaction) in transactions.iter().enumerate() {
        let result = submit_transaction(rpc, transaction, options).await;
        let success = result.success;
        results.push(result);
        if !success {
            warn!(
                index = idx,
                remaining = transactions.len() - idx - 1,
                "Batch halted at failed transaction"
            );
            return BatchSubmitResult {
                results,
                all_succeeded: false,
            };
        }
    }

    info!(count = results.len(), "Batch submitted");
    BatchSubmitResult {
        results,
        all_succeeded: true,
    }
}
