//! High-level SDK handle
//!
//! [`TokenSdk`] pairs one immutable [`BlockchainConfig`] with a [`ChainRpc`]
//! and exposes every builder, signer and submitter as a method. Each call
//! runs inside an `sdk_operation` span carrying a fresh correlation ID.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use tracing::{info, Instrument};

use crate::config::BlockchainConfig;
use crate::errors::{SdkError, SdkResult};
use crate::observability::OperationContext;
use crate::rpc::{ChainRpc, SolanaRpc};
use crate::signing::{self, RemoteSigner, SigningOptions, TransactionSigner};
use crate::submit::{
    self, BatchSubmitResult, ConfirmationResult, SimulationResult, SubmitOptions, SubmitResult,
};
use crate::tx_builder::{
    self, LiquidityParams, NftParams, PoolPlan, SwapParams, SwapPlan, TokenCreation, TokenParams,
    TransferParams, UnsignedTransaction,
};

/// Token created, signed and submitted in one call
#[derive(Debug, Clone)]
pub struct TokenLaunch {
    pub mint: Pubkey,
    pub associated_token_account: Pubkey,
    pub result: SubmitResult,
}

pub struct TokenSdk<R: ChainRpc = SolanaRpc> {
    config: Arc<BlockchainConfig>,
    rpc: Arc<R>,
}

impl<R: ChainRpc> Clone for TokenSdk<R> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            rpc: Arc::clone(&self.rpc),
        }
    }
}

impl TokenSdk<SolanaRpc> {
    /// Validate `config` and connect to its RPC endpoint
    pub fn connect(config: BlockchainConfig) -> SdkResult<Self> {
        config.validate()?;
        let rpc = SolanaRpc::new(&config);
        info!(cluster = %config.cluster, rpc_url = %config.rpc_url, "SDK connected");
        Ok(Self {
            config: Arc::new(config),
            rpc: Arc::new(rpc),
        })
    }
}

impl<R: ChainRpc> TokenSdk<R> {
    pub fn new(config: BlockchainConfig, rpc: R) -> SdkResult<Self> {
        Self::with_shared_rpc(config, Arc::new(rpc))
    }

    pub fn with_shared_rpc(config: BlockchainConfig, rpc: Arc<R>) -> SdkResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            rpc,
        })
    }

    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    fn signing_options(&self) -> SigningOptions {
        SigningOptions::with_commitment(self.config.commitment)
    }

    fn submit_options(&self) -> SubmitOptions {
        SubmitOptions::with_commitment(self.config.commitment)
    }

    // -- builders --

    pub async fn create_token(&self, payer: &Pubkey, params: TokenParams) -> SdkResult<TokenCreation> {
        let ctx = OperationContext::new("create_token");
        tx_builder::build_create_token(self.rpc.as_ref(), &self.config, payer, params)
            .instrument(ctx.span())
            .await
    }

    pub async fn create_nft(&self, payer: &Pubkey, params: NftParams) -> SdkResult<TokenCreation> {
        let ctx = OperationContext::new("create_nft");
        tx_builder::build_create_nft(self.rpc.as_ref(), &self.config, payer, params)
            .instrument(ctx.span())
            .await
    }

    pub fn transfer(&self, params: &TransferParams) -> SdkResult<UnsignedTransaction> {
        let ctx = OperationContext::new("transfer");
        let _span = ctx.span().entered();
        tx_builder::build_transfer(params)
    }

    pub fn swap(&self, payer: &Pubkey, params: &SwapParams) -> SdkResult<SwapPlan> {
        let ctx = OperationContext::new("swap");
        let _span = ctx.span().entered();
        tx_builder::build_swap(&self.config, payer, params)
    }

    pub fn create_pool(&self, payer: &Pubkey, params: &LiquidityParams) -> SdkResult<PoolPlan> {
        let ctx = OperationContext::new("create_pool");
        let _span = ctx.span().entered();
        tx_builder::build_create_pool(&self.config, payer, params)
    }

    pub async fn add_liquidity(&self, payer: &Pubkey, params: &LiquidityParams) -> SdkResult<PoolPlan> {
        let ctx = OperationContext::new("add_liquidity");
        tx_builder::build_add_liquidity(self.rpc.as_ref(), &self.config, payer, params)
            .instrument(ctx.span())
            .await
    }

    // -- signing --

    pub async fn sign_with_keypair(
        &self,
        transaction: UnsignedTransaction,
        signer: &Keypair,
    ) -> SdkResult<Transaction> {
        let ctx = OperationContext::new("sign_with_keypair");
        signing::sign_with_keypair(self.rpc.as_ref(), transaction, signer, &self.signing_options())
            .instrument(ctx.span())
            .await
    }

    pub async fn sign_with_fee_payer(
        &self,
        transaction: UnsignedTransaction,
        sender: &Keypair,
        fee_payer: &Keypair,
    ) -> SdkResult<Transaction> {
        let ctx = OperationContext::new("sign_with_fee_payer");
        signing::sign_with_fee_payer(
            self.rpc.as_ref(),
            transaction,
            sender,
            fee_payer,
            &self.signing_options(),
        )
        .instrument(ctx.span())
        .await
    }

    pub async fn sign_with_wallet(
        &self,
        transaction: UnsignedTransaction,
        wallet: &dyn RemoteSigner,
        co_signer: Option<&Keypair>,
    ) -> SdkResult<Transaction> {
        let ctx = OperationContext::new("sign_with_wallet");
        signing::sign_with_wallet(
            self.rpc.as_ref(),
            transaction,
            wallet,
            co_signer,
            &self.signing_options(),
        )
        .instrument(ctx.span())
        .await
    }

    pub async fn sign_all_with_wallet(
        &self,
        transactions: Vec<UnsignedTransaction>,
        wallet: &dyn RemoteSigner,
    ) -> SdkResult<Vec<Transaction>> {
        let ctx = OperationContext::new("sign_all_with_wallet");
        signing::sign_all_with_wallet(self.rpc.as_ref(), transactions, wallet, &self.signing_options())
            .instrument(ctx.span())
            .await
    }

    pub async fn sign(
        &self,
        transaction: UnsignedTransaction,
        signer: &TransactionSigner,
        co_signer: Option<&Keypair>,
    ) -> SdkResult<Transaction> {
        let ctx = OperationContext::new("sign");
        signing::sign(
            self.rpc.as_ref(),
            transaction,
            signer,
            co_signer,
            &self.signing_options(),
        )
        .instrument(ctx.span())
        .await
    }

    // -- submission --

    /// Submit and wait for the configured commitment
    pub async fn submit(&self, transaction: &Transaction) -> SubmitResult {
        self.submit_with(transaction, &self.submit_options()).await
    }

    pub async fn submit_with(&self, transaction: &Transaction, options: &SubmitOptions) -> SubmitResult {
        let ctx = OperationContext::new("submit");
        submit::submit_transaction(self.rpc.as_ref(), transaction, options)
            .instrument(ctx.span())
            .await
    }

    pub async fn simulate(&self, transaction: &Transaction) -> SimulationResult {
        let ctx = OperationContext::new("simulate");
        submit::simulate_transaction(self.rpc.as_ref(), transaction, self.config.commitment)
            .instrument(ctx.span())
            .await
    }

    /// Wait for a base58 signature to reach the configured commitment
    pub async fn wait_for_confirmation(&self, signature: &str) -> SdkResult<ConfirmationResult> {
        self.wait_for_confirmation_with(signature, self.submit_options().confirmation_timeout)
            .await
    }

    /// Same as [`TokenSdk::wait_for_confirmation`] with a caller-chosen timeout
    pub async fn wait_for_confirmation_with(
        &self,
        signature: &str,
        timeout: Duration,
    ) -> SdkResult<ConfirmationResult> {
        let signature = Signature::from_str(signature.trim()).map_err(|_| {
            SdkError::validation(format!("Invalid transaction signature: '{signature}'"))
        })?;
        let ctx = OperationContext::new("wait_for_confirmation");
        Ok(submit::wait_for_confirmation(
            self.rpc.as_ref(),
            &signature,
            self.config.commitment,
            timeout,
        )
        .instrument(ctx.span())
        .await)
    }

    pub async fn submit_batch(&self, transactions: &[Transaction]) -> BatchSubmitResult {
        let ctx = OperationContext::new("submit_batch");
        submit::submit_batch(self.rpc.as_ref(), transactions, &self.submit_options())
            .instrument(ctx.span())
            .await
    }

    // -- end to end --

    /// Build, sign (with the new mint as co-signer) and submit a token
    ///
    /// Build and signing failures are returned as errors; the submission
    /// outcome is reported in [`TokenLaunch::result`].
    pub async fn launch_token(
        &self,
        signer: &TransactionSigner,
        params: TokenParams,
    ) -> SdkResult<TokenLaunch> {
        let ctx = OperationContext::new("launch_token");
        let payer = signer.pubkey();
        let options = self.signing_options();
        let submit_options = self.submit_options();

        async move {
            let creation =
                tx_builder::build_create_token(self.rpc.as_ref(), &self.config, &payer, params)
                    .await?;
            let mint = creation.mint_address();
            let signed = signing::sign(
                self.rpc.as_ref(),
                creation.transaction,
                signer,
                Some(&creation.mint),
                &options,
            )
            .await?;
            let result = submit::submit_transaction(self.rpc.as_ref(), &signed, &submit_options).await;
            info!(mint = %mint, success = result.success, "Token launch finished");

            Ok(TokenLaunch {
                mint,
                associated_token_account: creation.associated_token_account,
                result,
            })
        }
        .instrument(ctx.span())
        .await
    }

    /// Build, sign and submit a native transfer from `sender`
    pub async fn send_sol(&self, sender: &Keypair, to: &Pubkey, amount_sol: f64) -> SdkResult<SubmitResult> {
        let ctx = OperationContext::new("send_sol");
        let params = TransferParams::new(sender.pubkey(), *to, amount_sol);
        async move {
            let unsigned = tx_builder::build_transfer(&params)?;
            let signed = signing::sign_with_keypair(
                self.rpc.as_ref(),
                unsigned,
                sender,
                &self.signing_options(),
            )
            .await?;
            Ok(submit::submit_transaction(self.rpc.as_ref(), &signed, &self.submit_options()).await)
        }
        .instrument(ctx.span())
        .await
    }
}
