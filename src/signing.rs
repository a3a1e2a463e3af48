//! Transaction signing
//!
//! Three shapes, all of which attach a fresh blockhash first (unless told not
//! to and one is already present):
//! - local keypairs ([`sign_with_keypair`], [`sign_with_keypairs`])
//! - sender plus separate fee payer ([`sign_with_fee_payer`])
//! - remote wallet, optionally with one local co-signer ([`sign_with_wallet`])
//!
//! Signature failures surface as [`SdkError::Signing`]. A failed blockhash
//! fetch keeps its [`SdkError::Rpc`] error so callers can retry it. A
//! partially signed transaction is never returned.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::Commitment;
use crate::errors::{SdkError, SdkResult};
use crate::rpc::ChainRpc;
use crate::tx_builder::UnsignedTransaction;

const KEYPAIR_LENGTH: usize = 64;

/// External wallet that signs on the caller's behalf
#[async_trait]
pub trait RemoteSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Add the wallet's signature, keeping any signatures already present
    async fn sign_transaction(&self, transaction: Transaction) -> anyhow::Result<Transaction>;

    /// Sign several transactions in one approval; defaults to one call each
    async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> anyhow::Result<Vec<Transaction>> {
        let mut signed = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            signed.push(self.sign_transaction(transaction).await?);
        }
        Ok(signed)
    }
}

/// Who signs: a local keypair or a remote wallet
#[derive(Clone)]
pub enum TransactionSigner {
    Local(Arc<Keypair>),
    Remote(Arc<dyn RemoteSigner>),
}

impl TransactionSigner {
    pub fn pubkey(&self) -> Pubkey {
        match self {
            TransactionSigner::Local(keypair) => keypair.pubkey(),
            TransactionSigner::Remote(wallet) => wallet.pubkey(),
        }
    }
}

impl std::fmt::Debug for TransactionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionSigner::Local(_) => write!(f, "Local({})", self.pubkey()),
            TransactionSigner::Remote(_) => write!(f, "Remote({})", self.pubkey()),
        }
    }
}

impl From<Keypair> for TransactionSigner {
    fn from(keypair: Keypair) -> Self {
        TransactionSigner::Local(Arc::new(keypair))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningOptions {
    /// Fetch a new blockhash even when the transaction already carries one
    pub refresh_blockhash: bool,
    pub commitment: Commitment,
}

impl Default for SigningOptions {
    fn default() -> Self {
        Self {
            refresh_blockhash: true,
            commitment: Commitment::default(),
        }
    }
}

impl SigningOptions {
    pub fn with_commitment(commitment: Commitment) -> Self {
        Self {
            commitment,
            ..Self::default()
        }
    }

    /// Keep whatever blockhash the transaction already has
    pub fn keep_blockhash(mut self) -> Self {
        self.refresh_blockhash = false;
        self
    }
}

/// Errors from the node are returned unchanged as [`SdkError::Rpc`]
async fn attach_blockhash<R: ChainRpc + ?Sized>(
    rpc: &R,
    transaction: &mut UnsignedTransaction,
    options: &SigningOptions,
) -> SdkResult<()> {
    if options.refresh_blockhash || transaction.recent_blockhash.is_none() {
        let blockhash = rpc
            .get_latest_blockhash(options.commitment.to_config())
            .await?;
        debug!(blockhash = %blockhash, "Attached recent blockhash");
        transaction.set_blockhash(blockhash);
    }
    Ok(())
}

fn ensure_real_key(pubkey: &Pubkey, role: &str) -> SdkResult<()> {
    if *pubkey == Pubkey::default() {
        return Err(SdkError::signing(format!("{role} public key is the default address")));
    }
    Ok(())
}

fn ensure_fully_signed(transaction: &Transaction) -> SdkResult<()> {
    if !transaction.is_signed() {
        return Err(SdkError::signing("Transaction is missing required signatures"));
    }
    transaction
        .verify()
        .map_err(|e| SdkError::signing(format!("Signature verification failed: {e}")))
}

/// Sign with one local keypair, which also pays fees unless the builder set a payer
pub async fn sign_with_keypair<R: ChainRpc + ?Sized>(
    rpc: &R,
    transaction: UnsignedTransaction,
    signer: &Keypair,
    options: &SigningOptions,
) -> SdkResult<Transaction> {
    sign_with_keypairs(rpc, transaction, &[signer], options).await
}

/// Sign with several local keypairs; the first is the default fee payer
pub async fn sign_with_keypairs<R: ChainRpc + ?Sized>(
    rpc: &R,
    mut transaction: UnsignedTransaction,
    signers: &[&Keypair],
    options: &SigningOptions,
) -> SdkResult<Transaction> {
    let first = signers
        .first()
        .ok_or_else(|| SdkError::signing("No signers provided"))?;
    for signer in signers {
        ensure_real_key(&signer.pubkey(), "Signer")?;
    }

    attach_blockhash(rpc, &mut transaction, options).await?;
    let mut tx = transaction.to_transaction(&first.pubkey());
    let blockhash = tx.message.recent_blockhash;

    tx.try_sign(signers, blockhash)
        .map_err(|e| SdkError::signing(format!("Local signing failed: {e}")))?;
    ensure_fully_signed(&tx)?;

    debug!(
        fee_payer = ?tx.message.account_keys.first(),
        signers = signers.len(),
        "Signed with local keypairs"
    );
    Ok(tx)
}

/// Sign as `sender` with `fee_payer` paying fees
///
/// When both are the same key only one signature is produced.
pub async fn sign_with_fee_payer<R: ChainRpc + ?Sized>(
    rpc: &R,
    mut transaction: UnsignedTransaction,
    sender: &Keypair,
    fee_payer: &Keypair,
    options: &SigningOptions,
) -> SdkResult<Transaction> {
    transaction.fee_payer = Some(fee_payer.pubkey());
    if sender.pubkey() == fee_payer.pubkey() {
        sign_with_keypairs(rpc, transaction, &[fee_payer], options).await
    } else {
        sign_with_keypairs(rpc, transaction, &[fee_payer, sender], options).await
    }
}

/// Sign through a remote wallet
///
/// A local `co_signer` (for example a new mint keypair) partially signs
/// first; the wallet then signs the partially signed transaction.
pub async fn sign_with_wallet<R: ChainRpc + ?Sized>(
    rpc: &R,
    mut transaction: UnsignedTransaction,
    wallet: &dyn RemoteSigner,
    co_signer: Option<&Keypair>,
    options: &SigningOptions,
) -> SdkResult<Transaction> {
    let wallet_key = wallet.pubkey();
    ensure_real_key(&wallet_key, "Wallet")?;

    attach_blockhash(rpc, &mut transaction, options).await?;
    let tx = prepare_for_wallet(&transaction, &wallet_key, co_signer)?;

    let signed = wallet.sign_transaction(tx).await.map_err(|e| {
        warn!(wallet = %wallet_key, error = %e, "Wallet refused to sign");
        SdkError::signing(format!("Wallet signing failed: {e}"))
    })?;
    ensure_fully_signed(&signed)?;

    debug!(wallet = %wallet_key, co_signed = co_signer.is_some(), "Signed with wallet");
    Ok(signed)
}

/// Sign a batch through the wallet's bulk capability
///
/// One blockhash is fetched for the whole batch.
pub async fn sign_all_with_wallet<R: ChainRpc + ?Sized>(
    rpc: &R,
    transactions: Vec<UnsignedTransaction>,
    wallet: &dyn RemoteSigner,
    options: &SigningOptions,
) -> SdkResult<Vec<Transaction>> {
    if transactions.is_empty() {
        return Ok(Vec::new());
    }
    let wallet_key = wallet.pubkey();
    ensure_real_key(&wallet_key, "Wallet")?;

    let needs_blockhash =
        options.refresh_blockhash || transactions.iter().any(|tx| tx.recent_blockhash.is_none());
    let blockhash = if needs_blockhash {
        Some(
            rpc.get_latest_blockhash(options.commitment.to_config())
                .await?,
        )
    } else {
        None
    };

    let prepared = transactions
        .into_iter()
        .map(|mut tx| {
            if let Some(blockhash) = blockhash {
                tx.set_blockhash(blockhash);
            }
            prepare_for_wallet(&tx, &wallet_key, None)
        })
        .collect::<SdkResult<Vec<_>>>()?;
    let expected = prepared.len();

    let signed = wallet
        .sign_all_transactions(prepared)
        .await
        .map_err(|e| SdkError::signing(format!("Wallet batch signing failed: {e}")))?;

    if signed.len() != expected {
        return Err(SdkError::signing(format!(
            "Wallet returned {} transactions, expected {expected}",
            signed.len()
        )));
    }
    for tx in &signed {
        ensure_fully_signed(tx)?;
    }

    debug!(wallet = %wallet_key, count = expected, "Batch signed with wallet");
    Ok(signed)
}

fn prepare_for_wallet(
    transaction: &UnsignedTransaction,
    wallet_key: &Pubkey,
    co_signer: Option<&Keypair>,
) -> SdkResult<Transaction> {
    let mut tx = transaction.to_transaction(wallet_key);
    if let Some(co_signer) = co_signer {
        ensure_real_key(&co_signer.pubkey(), "Co-signer")?;
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[co_signer], blockhash)
            .map_err(|e| SdkError::signing(format!("Co-signer failed: {e}")))?;
    }
    Ok(tx)
}

/// Sign with whichever signer the caller chose
pub async fn sign<R: ChainRpc + ?Sized>(
    rpc: &R,
    transaction: UnsignedTransaction,
    signer: &TransactionSigner,
    co_signer: Option<&Keypair>,
    options: &SigningOptions,
) -> SdkResult<Transaction> {
    match signer {
        TransactionSigner::Local(keypair) => match co_signer {
            Some(co_signer) => {
                sign_with_keypairs(rpc, transaction, &[keypair.as_ref(), co_signer], options).await
            }
            None => sign_with_keypair(rpc, transaction, keypair, options).await,
        },
        TransactionSigner::Remote(wallet) => {
            sign_with_wallet(rpc, transaction, wallet.as_ref(), co_signer, options).await
        }
    }
}

/// Keypair from its 64-byte secret, rejecting the all-zero key
pub fn keypair_from_bytes(bytes: &[u8]) -> SdkResult<Keypair> {
    if bytes.len() != KEYPAIR_LENGTH {
        return Err(SdkError::signing(format!(
            "Invalid keypair length: expected {KEYPAIR_LENGTH} bytes, got {}",
            bytes.len()
        )));
    }
    if bytes.iter().all(|&b| b == 0) {
        return Err(SdkError::signing("Invalid keypair: all-zero key rejected"));
    }
    Keypair::try_from(bytes).map_err(|e| SdkError::signing(format!("Invalid keypair bytes: {e}")))
}

/// Load a keypair file, either raw 64 bytes or the CLI's JSON byte array
pub fn read_keypair_file(path: impl AsRef<Path>) -> SdkResult<Keypair> {
    let path = path.as_ref();
    let raw = Zeroizing::new(std::fs::read(path).map_err(|e| {
        SdkError::signing(format!("Failed to read keypair file {}: {e}", path.display()))
    })?);

    if raw.len() == KEYPAIR_LENGTH {
        return keypair_from_bytes(&raw);
    }

    let json: Zeroizing<Vec<u8>> = Zeroizing::new(
        serde_json::from_slice(&raw)
            .map_err(|e| SdkError::signing(format!("Failed to parse keypair JSON: {e}")))?,
    );
    keypair_from_bytes(&json)
}

/// Keypair from a base58-encoded secret key string
pub fn keypair_from_base58(secret: &str) -> SdkResult<Keypair> {
    let bytes = Zeroizing::new(
        bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| SdkError::signing(format!("Invalid base58 secret key: {e}")))?,
    );
    keypair_from_bytes(&bytes)
}
