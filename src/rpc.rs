//! RPC boundary
//!
//! [`ChainRpc`] is the only way the SDK talks to the chain: six calls, all
//! async, all returning [`SdkError::Rpc`] on failure. [`SolanaRpc`] implements
//! it over the non-blocking `RpcClient`.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use solana_transaction_status::TransactionStatus;
use std::sync::Arc;
use tracing::debug;

use crate::config::BlockchainConfig;
use crate::errors::{SdkError, SdkResult};

/// Fixed retry count handed to the node for raw transaction sends
pub const RAW_SEND_MAX_RETRIES: usize = 3;

/// Outcome of a dry run as reported by the node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// Execution error, if the transaction would fail
    pub err: Option<String>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

/// The chain calls consumed by builders, signing and submission
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Latest blockhash at the given commitment
    async fn get_latest_blockhash(&self, commitment: CommitmentConfig) -> SdkResult<Hash>;

    /// Rent-exempt minimum balance for an account of `data_len` bytes
    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> SdkResult<u64>;

    /// Whether an account exists at `pubkey`
    async fn account_exists(&self, pubkey: &Pubkey, commitment: CommitmentConfig)
        -> SdkResult<bool>;

    /// Send a signed transaction, returning its signature once accepted by the node
    async fn send_transaction(
        &self,
        transaction: &Transaction,
        config: RpcSendTransactionConfig,
    ) -> SdkResult<Signature>;

    /// Dry-run a transaction against current state
    async fn simulate_transaction(
        &self,
        transaction: &Transaction,
        commitment: CommitmentConfig,
    ) -> SdkResult<SimulationOutcome>;

    /// Current status of a signature, `None` when the node hasn't seen it
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> SdkResult<Option<TransactionStatus>>;
}

/// [`ChainRpc`] over a Solana JSON-RPC endpoint
#[derive(Clone)]
pub struct SolanaRpc {
    client: Arc<RpcClient>,
}

impl std::fmt::Debug for SolanaRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpc")
            .field("url", &self.client.url())
            .finish()
    }
}

impl SolanaRpc {
    /// Connect to the endpoint named in `config`
    pub fn new(config: &BlockchainConfig) -> Self {
        let client = RpcClient::new_with_commitment(
            config.rpc_url.clone(),
            config.commitment_config(),
        );
        Self {
            client: Arc::new(client),
        }
    }

    /// Wrap an existing client
    pub fn from_client(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

#[async_trait]
impl ChainRpc for SolanaRpc {
    async fn get_latest_blockhash(&self, commitment: CommitmentConfig) -> SdkResult<Hash> {
        let (hash, last_valid_height) = self
            .client
            .get_latest_blockhash_with_commitment(commitment)
            .await?;
        debug!(blockhash = %hash, last_valid_height, "Fetched latest blockhash");
        Ok(hash)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> SdkResult<u64> {
        Ok(self
            .client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await?)
    }

    async fn account_exists(
        &self,
        pubkey: &Pubkey,
        commitment: CommitmentConfig,
    ) -> SdkResult<bool> {
        let response = self
            .client
            .get_account_with_commitment(pubkey, commitment)
            .await?;
        Ok(response.value.is_some())
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
        config: RpcSendTransactionConfig,
    ) -> SdkResult<Signature> {
        Ok(self
            .client
            .send_transaction_with_config(transaction, config)
            .await?)
    }

    async fn simulate_transaction(
        &self,
        transaction: &Transaction,
        commitment: CommitmentConfig,
    ) -> SdkResult<SimulationOutcome> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            commitment: Some(commitment),
            ..RpcSimulateTransactionConfig::default()
        };
        let response = self
            .client
            .simulate_transaction_with_config(transaction, config)
            .await?;
        let result = response.value;

        Ok(SimulationOutcome {
            err: result.err.map(|e| format!("{e:?}")),
            logs: result.logs.unwrap_or_default(),
            units_consumed: result.units_consumed,
        })
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> SdkResult<Option<TransactionStatus>> {
        let response = self.client.get_signature_statuses(&[*signature]).await?;
        let status = response.value.into_iter().next().flatten();
        Ok(status)
    }
}

/// Send config used for every raw submission
pub(crate) fn send_config(
    commitment: CommitmentConfig,
    skip_preflight: bool,
) -> RpcSendTransactionConfig {
    RpcSendTransactionConfig {
        skip_preflight,
        preflight_commitment: Some(commitment.commitment),
        max_retries: Some(RAW_SEND_MAX_RETRIES),
        ..RpcSendTransactionConfig::default()
    }
}

/// Map a failed RPC call into the SDK error, keeping the original message
pub(crate) fn rpc_context(operation: &str) -> impl FnOnce(SdkError) -> SdkError + '_ {
    move |err| match err {
        SdkError::Rpc(msg) => SdkError::Rpc(format!("{operation}: {msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::commitment_config::CommitmentLevel;

    #[test]
    fn test_send_config_uses_fixed_retry_count() {
        let config = send_config(CommitmentConfig::finalized(), true);
        assert_eq!(config.max_retries, Some(RAW_SEND_MAX_RETRIES));
        assert!(config.skip_preflight);
        assert_eq!(config.preflight_commitment, Some(CommitmentLevel::Finalized));
    }

    #[test]
    fn test_rpc_context_prefixes_rpc_errors_only() {
        let err = rpc_context("getLatestBlockhash")(SdkError::Rpc("timed out".to_string()));
        assert_eq!(err.to_string(), "RPC error: getLatestBlockhash: timed out");

        let err = rpc_context("getLatestBlockhash")(SdkError::validation("bad"));
        assert!(matches!(err, SdkError::Validation(_)));
    }

    #[test]
    fn test_solana_rpc_debug_shows_url() {
        let config = BlockchainConfig::for_cluster(crate::config::Cluster::Localnet);
        let rpc = SolanaRpc::new(&config);
        assert!(format!("{rpc:?}").contains("127.0.0.1:8899"));
    }
}
