//! Test Utilities Module
//!
//! In-memory stand-ins for the chain and for a browser wallet, so builders,
//! signing and submission can be driven end to end without a network.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use solana_rpc_client_api::config::RpcSendTransactionConfig;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use solana_transaction_status::{TransactionConfirmationStatus, TransactionStatus};
use tokio::sync::Mutex;

use crate::errors::{SdkError, SdkResult};
use crate::rpc::{ChainRpc, SimulationOutcome};
use crate::signing::RemoteSigner;

/// Lamports per byte-year times the two-year exemption threshold
const RENT_LAMPORTS_PER_BYTE: u64 = 6_960;
/// Account storage overhead charged on top of the data length
const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;

/// Rent-exempt minimum as computed by the default rent sysvar
pub fn rent_for(data_len: usize) -> u64 {
    (data_len as u64 + ACCOUNT_STORAGE_OVERHEAD) * RENT_LAMPORTS_PER_BYTE
}

#[derive(Default)]
struct FakeRpcState {
    blockhash: Hash,
    blockhash_requests: usize,
    existing_accounts: HashSet<Pubkey>,
    sent: Vec<Transaction>,
    send_error: Option<String>,
    /// Scripted poll answers, consumed front to back
    statuses: VecDeque<Option<TransactionStatus>>,
    /// Answer once the script runs out; `None` means never seen
    settled_status: Option<TransactionStatus>,
    simulation: SimulationOutcome,
}

/// In-memory [`ChainRpc`]
///
/// Sends succeed and confirm as finalized unless scripted otherwise. Every
/// sent transaction is recorded.
#[derive(Clone)]
pub struct FakeRpc {
    state: Arc<Mutex<FakeRpcState>>,
}

impl FakeRpc {
    pub fn new() -> Self {
        let state = FakeRpcState {
            blockhash: Hash::new_unique(),
            settled_status: Some(finalized_status(1)),
            ..FakeRpcState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Mark an account as present on chain
    pub async fn add_account(&self, pubkey: Pubkey) {
        self.state.lock().await.existing_accounts.insert(pubkey);
    }

    /// Make every send fail with `message`
    pub async fn fail_sends(&self, message: impl Into<String>) {
        self.state.lock().await.send_error = Some(message.into());
    }

    /// Queue status answers for the next polls
    pub async fn script_statuses(&self, statuses: Vec<Option<TransactionStatus>>) {
        self.state.lock().await.statuses.extend(statuses);
    }

    /// Signatures stay unknown forever once the script is exhausted
    pub async fn never_confirm(&self) {
        self.state.lock().await.settled_status = None;
    }

    pub async fn set_simulation(&self, outcome: SimulationOutcome) {
        self.state.lock().await.simulation = outcome;
    }

    pub async fn blockhash(&self) -> Hash {
        self.state.lock().await.blockhash
    }

    /// Serve a different blockhash from now on
    pub async fn rotate_blockhash(&self) -> Hash {
        let mut state = self.state.lock().await;
        state.blockhash = Hash::new_unique();
        state.blockhash
    }

    pub async fn blockhash_requests(&self) -> usize {
        self.state.lock().await.blockhash_requests
    }

    pub async fn sent_transactions(&self) -> Vec<Transaction> {
        self.state.lock().await.sent.clone()
    }
}

impl Default for FakeRpc {
    fn default() -> Self {
        Self::new()
    }
}

/// Status at the given slot with an optional on-chain error
pub fn status_at(
    slot: u64,
    level: TransactionConfirmationStatus,
    err: Option<solana_sdk::transaction::TransactionError>,
) -> TransactionStatus {
    let confirmations = match level {
        TransactionConfirmationStatus::Finalized => None,
        _ => Some(1),
    };
    TransactionStatus {
        slot,
        confirmations,
        status: err.clone().map_or(Ok(()), Err),
        err,
        confirmation_status: Some(level),
    }
}

fn finalized_status(slot: u64) -> TransactionStatus {
    status_at(slot, TransactionConfirmationStatus::Finalized, None)
}

#[async_trait]
impl ChainRpc for FakeRpc {
    async fn get_latest_blockhash(&self, _commitment: CommitmentConfig) -> SdkResult<Hash> {
        let mut state = self.state.lock().await;
        state.blockhash_requests += 1;
        Ok(state.blockhash)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> SdkResult<u64> {
        Ok(rent_for(data_len))
    }

    async fn account_exists(
        &self,
        pubkey: &Pubkey,
        _commitment: CommitmentConfig,
    ) -> SdkResult<bool> {
        Ok(self.state.lock().await.existing_accounts.contains(pubkey))
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
        _config: RpcSendTransactionConfig,
    ) -> SdkResult<Signature> {
        let mut state = self.state.lock().await;
        if let Some(message) = &state.send_error {
            return Err(SdkError::Rpc(message.clone()));
        }
        let signature = transaction
            .signatures
            .first()
            .copied()
            .ok_or_else(|| SdkError::Rpc("Transaction has no signatures".to_string()))?;
        state.sent.push(transaction.clone());
        Ok(signature)
    }

    async fn simulate_transaction(
        &self,
        _transaction: &Transaction,
        _commitment: CommitmentConfig,
    ) -> SdkResult<SimulationOutcome> {
        Ok(self.state.lock().await.simulation.clone())
    }

    async fn get_signature_status(
        &self,
        _signature: &Signature,
    ) -> SdkResult<Option<TransactionStatus>> {
        let mut state = self.state.lock().await;
        Ok(match state.statuses.pop_front() {
            Some(scripted) => scripted,
            None => state.settled_status.clone(),
        })
    }
}

/// Keypair-backed [`RemoteSigner`] that can be told to refuse
pub struct FakeWallet {
    keypair: Keypair,
    reject: bool,
    sign_calls: AtomicUsize,
}

impl FakeWallet {
    pub fn new() -> Self {
        Self::from_keypair(Keypair::new())
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair,
            reject: false,
            sign_calls: AtomicUsize::new(0),
        }
    }

    /// A wallet whose user declines every request
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::new()
        }
    }

    /// Number of signing requests received, bulk requests count once
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    fn sign_one(&self, mut transaction: Transaction) -> anyhow::Result<Transaction> {
        if self.reject {
            anyhow::bail!("User rejected the request");
        }
        let blockhash = transaction.message.recent_blockhash;
        transaction.try_partial_sign(&[&self.keypair], blockhash)?;
        Ok(transaction)
    }
}

impl Default for FakeWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteSigner for FakeWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(&self, transaction: Transaction) -> anyhow::Result<Transaction> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.sign_one(transaction)
    }

    async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> anyhow::Result<Vec<Transaction>> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        transactions
            .into_iter()
            .map(|tx| self.sign_one(tx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_system_interface::instruction as system_instruction;

    fn signed(payer: &Keypair, blockhash: Hash) -> Transaction {
        let ix = system_instruction::transfer(&payer.pubkey(), &Pubkey::new_unique(), 5);
        Transaction::new_signed_with_payer(&[ix], Some(&payer.pubkey()), &[payer], blockhash)
    }

    #[tokio::test]
    async fn test_fake_rpc_records_sends_and_confirms() {
        let rpc = FakeRpc::new();
        let payer = Keypair::new();
        let tx = signed(&payer, rpc.blockhash().await);

        let signature = rpc
            .send_transaction(&tx, RpcSendTransactionConfig::default())
            .await
            .unwrap();
        assert_eq!(signature, tx.signatures[0]);
        assert_eq!(rpc.sent_transactions().await.len(), 1);

        let status = rpc.get_signature_status(&signature).await.unwrap().unwrap();
        assert!(status.satisfies_commitment(CommitmentConfig::finalized()));
    }

    #[tokio::test]
    async fn test_fake_rpc_scripted_statuses_then_silence() {
        let rpc = FakeRpc::new();
        rpc.never_confirm().await;
        rpc.script_statuses(vec![Some(status_at(9, TransactionConfirmationStatus::Processed, None))])
            .await;

        let sig = Signature::default();
        assert_eq!(rpc.get_signature_status(&sig).await.unwrap().unwrap().slot, 9);
        assert!(rpc.get_signature_status(&sig).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fake_rpc_accounts_and_failures() {
        let rpc = FakeRpc::new();
        let key = Pubkey::new_unique();
        let commitment = CommitmentConfig::confirmed();

        assert!(!rpc.account_exists(&key, commitment).await.unwrap());
        rpc.add_account(key).await;
        assert!(rpc.account_exists(&key, commitment).await.unwrap());

        rpc.fail_sends("node unhealthy").await;
        let tx = signed(&Keypair::new(), Hash::new_unique());
        let err = rpc
            .send_transaction(&tx, RpcSendTransactionConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("node unhealthy"));
    }

    #[tokio::test]
    async fn test_fake_wallet() {
        let wallet = FakeWallet::new();
        let ix = system_instruction::transfer(&wallet.pubkey(), &Pubkey::new_unique(), 5);
        let tx = Transaction::new_with_payer(&[ix], Some(&wallet.pubkey()));

        let signed = wallet.sign_transaction(tx.clone()).await.unwrap();
        assert!(signed.is_signed());
        assert_eq!(wallet.sign_calls(), 1);

        let refused = FakeWallet::rejecting().sign_transaction(tx).await;
        assert!(refused.is_err());
    }
}
