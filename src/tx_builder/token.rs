//! Token-2022 fungible token and NFT creation
//!
//! The mint carries a metadata-pointer extension pointing at itself and the
//! token metadata lives in the mint account. The account is created with rent
//! for the fixed extension layout only; the metadata initialization reallocates
//! it, so the rent delta for the variable-length metadata is transferred in
//! before that instruction runs.

use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use solana_system_interface::instruction as system_instruction;
use spl_associated_token_account::{
    get_associated_token_address_with_program_id,
    instruction::create_associated_token_account,
};
use spl_token_2022::{
    extension::{metadata_pointer, ExtensionType},
    state::Mint,
};
use tracing::debug;

use super::instructions::sanity_check_token_creation_order;
use super::transaction::UnsignedTransaction;
use crate::config::BlockchainConfig;
use crate::errors::{SdkError, SdkResult};
use crate::rpc::{rpc_context, ChainRpc};

/// Two 32-byte keys in the metadata record (update authority, mint)
const METADATA_FIXED_KEYS_LEN: usize = 32 + 32;
/// Borsh length prefix for each string and for the additional-metadata vec
const LENGTH_PREFIX_LEN: usize = 4;
/// Extension TLV header (type + length)
const TLV_ENVELOPE_LEN: usize = 4;
/// Headroom over the raw record size, as a ratio (110%)
const METADATA_PADDING_NUM: usize = 11;
const METADATA_PADDING_DEN: usize = 10;

pub const MAX_NAME_LEN: usize = 32;
pub const MAX_SYMBOL_LEN: usize = 10;
pub const MAX_URI_LEN: usize = 200;
pub const MAX_DECIMALS: u8 = 9;

const TOKEN_PROGRAM_LABEL: &str = "token-2022";

/// Padded estimate of the serialized token metadata record
///
/// Depends only on the byte lengths of the three strings.
pub fn estimate_metadata_space(name: &str, symbol: &str, uri: &str) -> usize {
    let raw = METADATA_FIXED_KEYS_LEN
        + (LENGTH_PREFIX_LEN + name.len())
        + (LENGTH_PREFIX_LEN + symbol.len())
        + (LENGTH_PREFIX_LEN + uri.len())
        + LENGTH_PREFIX_LEN // empty additional_metadata
        + TLV_ENVELOPE_LEN;
    (raw * METADATA_PADDING_NUM).div_ceil(METADATA_PADDING_DEN)
}

fn token_err(e: impl std::fmt::Display) -> SdkError {
    SdkError::instruction_failed(TOKEN_PROGRAM_LABEL, e.to_string())
}

/// Size of a mint account carrying only the metadata-pointer extension
pub fn base_mint_space() -> SdkResult<usize> {
    ExtensionType::try_calculate_account_len::<Mint>(&[ExtensionType::MetadataPointer])
        .map_err(token_err)
}

/// Parameters for a new token
///
/// Defaults: 9 decimals, zero initial supply, no freeze authority, fresh
/// mint keypair.
#[derive(Debug)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    /// Initial supply in base units, minted to the payer's ATA
    pub supply: u64,
    pub decimals: u8,
    pub freeze_authority: Option<Pubkey>,
    /// Pre-generated mint keypair, a new one is generated when absent
    pub mint: Option<Keypair>,
}

impl TokenParams {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            uri: uri.into(),
            supply: 0,
            decimals: MAX_DECIMALS,
            freeze_authority: None,
            mint: None,
        }
    }

    pub fn with_supply(mut self, supply: u64) -> Self {
        self.supply = supply;
        self
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_freeze_authority(mut self, authority: Pubkey) -> Self {
        self.freeze_authority = Some(authority);
        self
    }

    pub fn with_mint_keypair(mut self, mint: Keypair) -> Self {
        self.mint = Some(mint);
        self
    }

    fn validate(&self) -> SdkResult<()> {
        for (field, value, max) in [
            ("name", &self.name, MAX_NAME_LEN),
            ("symbol", &self.symbol, MAX_SYMBOL_LEN),
            ("uri", &self.uri, MAX_URI_LEN),
        ] {
            if value.trim().is_empty() {
                return Err(SdkError::validation(format!("Token {field} must not be empty")));
            }
            if value.len() > max {
                return Err(SdkError::validation(format!(
                    "Token {field} is {} bytes, maximum is {max}",
                    value.len()
                )));
            }
        }
        if self.decimals > MAX_DECIMALS {
            return Err(SdkError::validation(format!(
                "Decimals must be at most {MAX_DECIMALS}, got {}",
                self.decimals
            )));
        }
        Ok(())
    }
}

/// Parameters for a new NFT: supply 1, 0 decimals
#[derive(Debug)]
pub struct NftParams {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub mint: Option<Keypair>,
}

impl NftParams {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            uri: uri.into(),
            mint: None,
        }
    }

    pub fn with_mint_keypair(mut self, mint: Keypair) -> Self {
        self.mint = Some(mint);
        self
    }
}

impl From<NftParams> for TokenParams {
    fn from(nft: NftParams) -> Self {
        Self {
            name: nft.name,
            symbol: nft.symbol,
            uri: nft.uri,
            supply: 1,
            decimals: 0,
            freeze_authority: None,
            mint: nft.mint,
        }
    }
}

/// Result of a token build
///
/// The mint keypair must co-sign: account creation needs the new account's
/// own signature.
#[derive(Debug)]
pub struct TokenCreation {
    pub transaction: UnsignedTransaction,
    pub mint: Keypair,
    pub associated_token_account: Pubkey,
    /// Total rent the mint account ends up holding
    pub mint_rent_lamports: u64,
}

impl TokenCreation {
    pub fn mint_address(&self) -> Pubkey {
        self.mint.pubkey()
    }
}

/// Build the token creation transaction
///
/// Reads two rent minimums and the payer ATA's existence from the chain.
pub async fn build_create_token<R: ChainRpc + ?Sized>(
    rpc: &R,
    config: &BlockchainConfig,
    payer: &Pubkey,
    params: TokenParams,
) -> SdkResult<TokenCreation> {
    params.validate()?;

    let programs = &config.programs;
    let token_program = programs.token_program;
    let mint = params.mint.unwrap_or_else(Keypair::new);
    let mint_pubkey = mint.pubkey();

    let base_space = base_mint_space()?;
    let metadata_space = estimate_metadata_space(&params.name, &params.symbol, &params.uri);

    let base_rent = rpc
        .get_minimum_balance_for_rent_exemption(base_space)
        .await
        .map_err(rpc_context("getMinimumBalanceForRentExemption"))?;
    let total_rent = rpc
        .get_minimum_balance_for_rent_exemption(base_space + metadata_space)
        .await
        .map_err(rpc_context("getMinimumBalanceForRentExemption"))?;
    let top_up = total_rent.saturating_sub(base_rent);

    let ata = get_associated_token_address_with_program_id(payer, &mint_pubkey, &token_program);
    let ata_exists = rpc
        .account_exists(&ata, config.commitment_config())
        .await
        .map_err(rpc_context("getAccountInfo"))?;

    debug!(
        mint = %mint_pubkey,
        base_space,
        metadata_space,
        base_rent,
        top_up,
        ata_exists,
        "Planning token creation"
    );

    let mut instructions: Vec<Instruction> = Vec::with_capacity(7);

    instructions.push(system_instruction::create_account(
        payer,
        &mint_pubkey,
        base_rent,
        base_space as u64,
        &token_program,
    ));

    instructions.push(
        metadata_pointer::instruction::initialize(
            &token_program,
            &mint_pubkey,
            Some(*payer),
            Some(mint_pubkey),
        )
        .map_err(token_err)?,
    );

    instructions.push(
        spl_token_2022::instruction::initialize_mint(
            &token_program,
            &mint_pubkey,
            payer,
            params.freeze_authority.as_ref(),
            params.decimals,
        )
        .map_err(token_err)?,
    );

    if top_up > 0 {
        instructions.push(system_instruction::transfer(payer, &mint_pubkey, top_up));
    }

    instructions.push(spl_token_metadata_interface::instruction::initialize(
        &token_program,
        &mint_pubkey,
        payer,
        &mint_pubkey,
        payer,
        params.name,
        params.symbol,
        params.uri,
    ));

    if !ata_exists {
        instructions.push(create_associated_token_account(
            payer,
            payer,
            &mint_pubkey,
            &token_program,
        ));
    }

    if params.supply > 0 {
        instructions.push(
            spl_token_2022::instruction::mint_to(
                &token_program,
                &mint_pubkey,
                &ata,
                payer,
                &[],
                params.supply,
            )
            .map_err(token_err)?,
        );
    }

    sanity_check_token_creation_order(&instructions, programs)?;

    Ok(TokenCreation {
        transaction: UnsignedTransaction::new(instructions, Some(*payer)),
        mint,
        associated_token_account: ata,
        mint_rent_lamports: total_rent.max(base_rent),
    })
}

/// Build an NFT creation transaction (supply 1, 0 decimals)
pub async fn build_create_nft<R: ChainRpc + ?Sized>(
    rpc: &R,
    config: &BlockchainConfig,
    payer: &Pubkey,
    params: NftParams,
) -> SdkResult<TokenCreation> {
    build_create_token(rpc, config, payer, params.into()).await
}
