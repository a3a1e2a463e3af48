//! Transaction builders
//!
//! One builder per operation. Each composes protocol instructions into a
//! single ordered [`UnsignedTransaction`]; none of them fetches a blockhash,
//! that happens at signing time.
//!
//! ## Modules
//! - **transaction**: the unsigned transaction value
//! - **instructions**: ordering and shape checks shared by the builders
//! - **token**: Token-2022 fungible token and NFT creation with metadata
//! - **transfer**: native SOL transfer
//! - **amm**: pair canonicalization, PDA derivation and payload encoding
//! - **swap**: AMM swap
//! - **pool**: AMM pool creation and add-liquidity

mod amm;
mod instructions;
mod pool;
mod swap;
mod token;
mod transaction;
mod transfer;

pub use amm::{
    canonical_pair, derive_pool_addresses, encode_amounts, encode_swap, parse_address,
    user_token_account, CanonicalPair, PoolAddresses,
};
pub use instructions::{ensure_account_count, sanity_check_token_creation_order, TokenStep};
pub use pool::{
    build_add_liquidity, build_create_pool, PoolPlan, LiquidityParams, POOL_INSTRUCTION_ACCOUNTS,
};
pub use swap::{build_swap, SwapParams, SwapPlan, SWAP_ACCOUNT_COUNT};
pub use token::{
    base_mint_space, build_create_nft, build_create_token, estimate_metadata_space, NftParams,
    TokenCreation, TokenParams,
};
pub use transaction::UnsignedTransaction;
pub use transfer::{build_transfer, sol_to_lamports, TransferParams, LAMPORTS_PER_SOL};
