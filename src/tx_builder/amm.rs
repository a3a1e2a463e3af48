//! Shared AMM plumbing: pair canonicalization, PDA derivation, payload encoding

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address_with_program_id;
use tracing::debug;

use crate::config::AmmConfig;
use crate::errors::{SdkError, SdkResult};

/// Parse a base58 address, naming the offending field on failure
pub fn parse_address(field: &str, value: &str) -> SdkResult<Pubkey> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SdkError::invalid_address(field, value));
    }
    Pubkey::from_str(trimmed).map_err(|_| SdkError::invalid_address(field, value))
}

/// Token pair in the order the AMM program stores it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalPair {
    pub token_a: Pubkey,
    pub token_b: Pubkey,
    /// Token A is the native mint
    pub a_is_native: bool,
    /// The caller's order was reversed to reach canonical order
    pub swapped: bool,
}

impl CanonicalPair {
    pub fn contains(&self, mint: &Pubkey) -> bool {
        self.token_a == *mint || self.token_b == *mint
    }

    pub fn is_native(&self, mint: &Pubkey) -> bool {
        self.a_is_native && self.token_a == *mint
    }
}

/// Order two mints canonically
///
/// The native mint is always token A. Otherwise token A is the smaller
/// address by byte ordering, so every caller derives the same pool.
pub fn canonical_pair(first: Pubkey, second: Pubkey, native_mint: &Pubkey) -> SdkResult<CanonicalPair> {
    if first == second {
        return Err(SdkError::validation(format!(
            "Pair must contain two distinct mints, got {first} twice"
        )));
    }

    let first_native = first == *native_mint;
    let second_native = second == *native_mint;

    let (token_a, token_b, swapped) = match (first_native, second_native) {
        (true, true) => {
            return Err(SdkError::validation(
                "Both sides of the pair are the native mint",
            ))
        }
        (true, false) => (first, second, false),
        (false, true) => (second, first, true),
        (false, false) if first.to_bytes() <= second.to_bytes() => (first, second, false),
        (false, false) => (second, first, true),
    };

    Ok(CanonicalPair {
        token_a,
        token_b,
        a_is_native: first_native || second_native,
        swapped,
    })
}

/// Program-derived accounts of one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAddresses {
    pub pool: Pubkey,
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub lp_mint: Pubkey,
}

fn find_pda(seeds: &[&[u8]], program_id: &Pubkey, what: &str) -> SdkResult<Pubkey> {
    Pubkey::try_find_program_address(seeds, program_id)
        .map(|(address, _bump)| address)
        .ok_or_else(|| {
            SdkError::instruction_failed(
                program_id.to_string(),
                format!("No valid bump for {what} PDA"),
            )
        })
}

/// Derive pool, vault and LP mint addresses for a canonical pair
pub fn derive_pool_addresses(
    pair: &CanonicalPair,
    amm: &AmmConfig,
    program_id: &Pubkey,
) -> SdkResult<PoolAddresses> {
    let pool = find_pda(
        &[
            amm.pool_seed.as_bytes(),
            pair.token_a.as_ref(),
            pair.token_b.as_ref(),
        ],
        program_id,
        "pool",
    )?;

    let vault_for = |mint: &Pubkey| -> SdkResult<Pubkey> {
        if pair.is_native(mint) {
            find_pda(
                &[amm.native_vault_seed.as_bytes(), pool.as_ref()],
                program_id,
                "native vault",
            )
        } else {
            find_pda(
                &[amm.vault_seed.as_bytes(), pool.as_ref(), mint.as_ref()],
                program_id,
                "vault",
            )
        }
    };
    let vault_a = vault_for(&pair.token_a)?;
    let vault_b = vault_for(&pair.token_b)?;

    let lp_mint = find_pda(
        &[amm.lp_mint_seed.as_bytes(), pool.as_ref()],
        program_id,
        "LP mint",
    )?;

    debug!(
        pool = %pool,
        vault_a = %vault_a,
        vault_b = %vault_b,
        lp_mint = %lp_mint,
        "Derived pool addresses"
    );

    Ok(PoolAddresses {
        pool,
        vault_a,
        vault_b,
        lp_mint,
    })
}

/// The account a user holds `mint` in: the wallet itself for the native side
pub fn user_token_account(
    owner: &Pubkey,
    mint: &Pubkey,
    is_native: bool,
    token_program: &Pubkey,
) -> Pubkey {
    if is_native {
        *owner
    } else {
        get_associated_token_address_with_program_id(owner, mint, token_program)
    }
}

/// `[discriminator, amount u64 LE, direction u8]`, direction 1 for A to B
pub fn encode_swap(discriminator: u8, amount: u64, a_to_b: bool) -> Vec<u8> {
    let mut data = Vec::with_capacity(10);
    data.push(discriminator);
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(u8::from(a_to_b));
    data
}

/// `[discriminator, amount_a u64 LE, amount_b u64 LE]`
pub fn encode_amounts(discriminator: u8, amount_a: u64, amount_b: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(17);
    data.push(discriminator);
    data.extend_from_slice(&amount_a.to_le_bytes());
    data.extend_from_slice(&amount_b.to_le_bytes());
    data
}
