//! Solana Token SDK
//!
//! Builds, signs and submits Token-2022 token and NFT launches with on-chain
//! metadata, native SOL transfers, and swaps and liquidity operations against
//! a constant-product AMM program.
//!
//! ## Modules
//! - **config**: cluster presets, program addresses and AMM layout
//! - **errors**: the SDK error type
//! - **observability**: logging setup and operation correlation
//! - **rpc**: the chain boundary and its JSON-RPC implementation
//! - **tx_builder**: one builder per operation, producing unsigned transactions
//! - **signing**: local keypair, fee payer and remote wallet signing
//! - **submit**: submission, simulation and confirmation polling
//! - **sdk**: the [`TokenSdk`] handle tying it all together

pub mod config;
pub mod errors;
pub mod observability;
pub mod rpc;
pub mod sdk;
pub mod signing;
pub mod submit;
pub mod tx_builder;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use config::{AmmConfig, BlockchainConfig, Cluster, Commitment, ProgramAddresses};
pub use errors::{SdkError, SdkResult};
pub use observability::{init_logging, CorrelationId, OperationContext};
pub use rpc::{ChainRpc, SimulationOutcome, SolanaRpc, RAW_SEND_MAX_RETRIES};
pub use sdk::{TokenLaunch, TokenSdk};
pub use signing::{
    keypair_from_base58, keypair_from_bytes, read_keypair_file, RemoteSigner, SigningOptions,
    TransactionSigner,
};
pub use submit::{
    BatchSubmitResult, ConfirmationResult, SimulationResult, SubmitOptions, SubmitResult,
};
pub use tx_builder::{
    LiquidityParams, NftParams, PoolPlan, SwapParams, SwapPlan, TokenCreation, TokenParams,
    TransferParams, UnsignedTransaction,
};

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
