//! AMM swap
//!
//! Account order expected by the program:
//! pool, mint A, mint B, vault A, vault B, user source, user destination,
//! user authority (signer), token program, associated-token program,
//! system program, rent sysvar.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    sysvar,
};
use tracing::debug;

use super::amm::{
    canonical_pair, derive_pool_addresses, encode_swap, parse_address, user_token_account,
    CanonicalPair,
};
use super::instructions::ensure_account_count;
use super::transaction::UnsignedTransaction;
use crate::config::BlockchainConfig;
use crate::errors::{SdkError, SdkResult};

pub const SWAP_ACCOUNT_COUNT: usize = 12;

/// Swap request with base58 mint addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
    pub source_mint: String,
    pub destination_mint: String,
    /// Input amount in the source mint's base units
    pub amount: u64,
}

impl SwapParams {
    pub fn new(source_mint: impl Into<String>, destination_mint: impl Into<String>, amount: u64) -> Self {
        Self {
            source_mint: source_mint.into(),
            destination_mint: destination_mint.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SwapPlan {
    pub transaction: UnsignedTransaction,
    pub pool: Pubkey,
    pub pair: CanonicalPair,
    pub a_to_b: bool,
}

/// Build the swap transaction for `payer`
///
/// Validation happens before any derivation; no chain state is read.
pub fn build_swap(
    config: &BlockchainConfig,
    payer: &Pubkey,
    params: &SwapParams,
) -> SdkResult<SwapPlan> {
    if params.amount == 0 {
        return Err(SdkError::validation("Swap amount must be greater than zero"));
    }
    let source = parse_address("source_mint", &params.source_mint)?;
    let destination = parse_address("destination_mint", &params.destination_mint)?;
    if source == destination {
        return Err(SdkError::validation(
            "Source and destination mints must differ",
        ));
    }

    let program_id = config.amm.program_id()?;
    let programs = &config.programs;
    let pair = canonical_pair(source, destination, &programs.native_mint)?;
    let addrs = derive_pool_addresses(&pair, &config.amm, &program_id)?;
    let a_to_b = source == pair.token_a;

    let user_source = user_token_account(
        payer,
        &source,
        pair.is_native(&source),
        &programs.token_program,
    );
    let user_destination = user_token_account(
        payer,
        &destination,
        pair.is_native(&destination),
        &programs.token_program,
    );

    let accounts = vec![
        AccountMeta::new(addrs.pool, false),
        AccountMeta::new_readonly(pair.token_a, false),
        AccountMeta::new_readonly(pair.token_b, false),
        AccountMeta::new(addrs.vault_a, false),
        AccountMeta::new(addrs.vault_b, false),
        AccountMeta::new(user_source, false),
        AccountMeta::new(user_destination, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(programs.token_program, false),
        AccountMeta::new_readonly(programs.associated_token_program, false),
        AccountMeta::new_readonly(programs.system_program, false),
        AccountMeta::new_readonly(sysvar::rent::id(), false),
    ];
    ensure_account_count(&accounts, SWAP_ACCOUNT_COUNT, &program_id)?;

    debug!(
        pool = %addrs.pool,
        source = %source,
        destination = %destination,
        amount = params.amount,
        a_to_b,
        "Building swap"
    );

    let ix = Instruction::new_with_bytes(
        program_id,
        &encode_swap(config.amm.swap_discriminator, params.amount, a_to_b),
        accounts,
    );

    Ok(SwapPlan {
        transaction: UnsignedTransaction::new(vec![ix], Some(*payer)),
        pool: addrs.pool,
        pair,
        a_to_b,
    })
}
