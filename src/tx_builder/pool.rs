//! AMM pool creation and add-liquidity

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    sysvar,
};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use tracing::{debug, info};

use super::amm::{
    canonical_pair, derive_pool_addresses, encode_amounts, parse_address, user_token_account,
    CanonicalPair, PoolAddresses,
};
use super::instructions::ensure_account_count;
use super::transaction::UnsignedTransaction;
use crate::config::BlockchainConfig;
use crate::errors::{SdkError, SdkResult};
use crate::rpc::ChainRpc;

/// Accounts of a pool instruction, not counting the system program
///
/// Pools with a native side carry the system program as one extra account.
pub const POOL_INSTRUCTION_ACCOUNTS: usize = 13;

/// Two mints and the amounts to deposit, in caller order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityParams {
    pub token_a: String,
    pub token_b: String,
    pub amount_a: u64,
    pub amount_b: u64,
}

impl LiquidityParams {
    pub fn new(
        token_a: impl Into<String>,
        token_b: impl Into<String>,
        amount_a: u64,
        amount_b: u64,
    ) -> Self {
        Self {
            token_a: token_a.into(),
            token_b: token_b.into(),
            amount_a,
            amount_b,
        }
    }
}

/// Built pool transaction plus the canonical view of what it deposits
#[derive(Debug, Clone)]
pub struct PoolPlan {
    pub transaction: UnsignedTransaction,
    pub pair: CanonicalPair,
    pub addresses: PoolAddresses,
    /// Amount deposited into token A after canonicalization
    pub amount_a: u64,
    pub amount_b: u64,
    pub user_lp: Pubkey,
}

struct PoolLayout {
    program_id: Pubkey,
    pair: CanonicalPair,
    addresses: PoolAddresses,
    amount_a: u64,
    amount_b: u64,
    user_lp: Pubkey,
    accounts: Vec<AccountMeta>,
}

fn resolve_layout(
    config: &BlockchainConfig,
    payer: &Pubkey,
    params: &LiquidityParams,
) -> SdkResult<PoolLayout> {
    if params.amount_a == 0 || params.amount_b == 0 {
        return Err(SdkError::validation(format!(
            "Both deposit amounts must be greater than zero (got {} and {})",
            params.amount_a, params.amount_b
        )));
    }
    let first = parse_address("token_a", &params.token_a)?;
    let second = parse_address("token_b", &params.token_b)?;

    let program_id = config.amm.program_id()?;
    let programs = &config.programs;
    let pair = canonical_pair(first, second, &programs.native_mint)?;
    let (amount_a, amount_b) = if pair.swapped {
        (params.amount_b, params.amount_a)
    } else {
        (params.amount_a, params.amount_b)
    };

    let addresses = derive_pool_addresses(&pair, &config.amm, &program_id)?;
    let user_a = user_token_account(payer, &pair.token_a, pair.a_is_native, &programs.token_program);
    let user_b = user_token_account(payer, &pair.token_b, false, &programs.token_program);
    let user_lp = user_token_account(payer, &addresses.lp_mint, false, &programs.token_program);

    let mut accounts = vec![
        AccountMeta::new(addresses.pool, false),
        AccountMeta::new_readonly(pair.token_a, false),
        AccountMeta::new_readonly(pair.token_b, false),
        AccountMeta::new(addresses.vault_a, false),
        AccountMeta::new(addresses.vault_b, false),
        AccountMeta::new(addresses.lp_mint, false),
        AccountMeta::new(user_a, false),
        AccountMeta::new(user_b, false),
        AccountMeta::new(user_lp, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(programs.token_program, false),
        AccountMeta::new_readonly(programs.associated_token_program, false),
    ];
    if pair.a_is_native {
        accounts.push(AccountMeta::new_readonly(programs.system_program, false));
    }
    accounts.push(AccountMeta::new_readonly(sysvar::rent::id(), false));

    let expected = POOL_INSTRUCTION_ACCOUNTS + usize::from(pair.a_is_native);
    ensure_account_count(&accounts, expected, &program_id)?;

    Ok(PoolLayout {
        program_id,
        pair,
        addresses,
        amount_a,
        amount_b,
        user_lp,
        accounts,
    })
}

impl PoolLayout {
    /// Append the pool instruction after `leading` and wrap everything up
    fn into_plan(
        self,
        discriminator: u8,
        mut leading: Vec<Instruction>,
        payer: &Pubkey,
    ) -> PoolPlan {
        leading.push(Instruction::new_with_bytes(
            self.program_id,
            &encode_amounts(discriminator, self.amount_a, self.amount_b),
            self.accounts,
        ));
        PoolPlan {
            transaction: UnsignedTransaction::new(leading, Some(*payer)),
            pair: self.pair,
            addresses: self.addresses,
            amount_a: self.amount_a,
            amount_b: self.amount_b,
            user_lp: self.user_lp,
        }
    }
}

/// Build the pool initialization transaction
///
/// A native side is moved into token A together with its amount. No chain
/// state is read.
pub fn build_create_pool(
    config: &BlockchainConfig,
    payer: &Pubkey,
    params: &LiquidityParams,
) -> SdkResult<PoolPlan> {
    let plan = resolve_layout(config, payer, params)?.into_plan(
        config.amm.init_pool_discriminator,
        Vec::new(),
        payer,
    );

    info!(
        pool = %plan.addresses.pool,
        token_a = %plan.pair.token_a,
        token_b = %plan.pair.token_b,
        amount_a = plan.amount_a,
        amount_b = plan.amount_b,
        native = plan.pair.a_is_native,
        "Building pool creation"
    );

    Ok(plan)
}

/// Build an add-liquidity transaction
///
/// Prepends an idempotent LP token account creation when the payer has no
/// LP account yet.
pub async fn build_add_liquidity<R: ChainRpc + ?Sized>(
    rpc: &R,
    config: &BlockchainConfig,
    payer: &Pubkey,
    params: &LiquidityParams,
) -> SdkResult<PoolPlan> {
    let layout = resolve_layout(config, payer, params)?;

    let lp_exists = rpc
        .account_exists(&layout.user_lp, config.commitment_config())
        .await?;

    let mut leading = Vec::with_capacity(1);
    if !lp_exists {
        debug!(user_lp = %layout.user_lp, "LP token account missing, creating it");
        leading.push(create_associated_token_account_idempotent(
            payer,
            payer,
            &layout.addresses.lp_mint,
            &config.programs.token_program,
        ));
    }

    let plan = layout.into_plan(config.amm.add_liquidity_discriminator, leading, payer);

    info!(
        pool = %plan.addresses.pool,
        amount_a = plan.amount_a,
        amount_b = plan.amount_b,
        create_lp_account = !lp_exists,
        "Building add-liquidity"
    );

    Ok(plan)
}
