//! Instruction ordering and shape validation
//!
//! Token creation must follow a fixed order:
//! 1. system `create_account` for the mint
//! 2. metadata-pointer initialization
//! 3. mint initialization
//! 4. rent top-up transfer (optional)
//! 5. metadata initialization
//! 6. associated token account creation (optional)
//! 7. `mint_to` (optional)
//!
//! AMM instructions must carry exactly the account count the program expects.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use spl_token_metadata_interface::instruction::TokenMetadataInstruction;

use crate::config::ProgramAddresses;
use crate::errors::{SdkError, SdkResult};

// Token-2022 instruction tags
const TOKEN_INITIALIZE_MINT: u8 = 0;
const TOKEN_MINT_TO: u8 = 7;
const TOKEN_METADATA_POINTER_EXTENSION: u8 = 39;

// System program instruction tags (u32 little-endian)
const SYSTEM_CREATE_ACCOUNT: u32 = 0;
const SYSTEM_TRANSFER: u32 = 2;

/// One step of the token creation sequence, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TokenStep {
    CreateMintAccount,
    InitializeMetadataPointer,
    InitializeMint,
    RentTopUp,
    InitializeMetadata,
    CreateAssociatedTokenAccount,
    MintTo,
}

impl TokenStep {
    /// Steps that may be omitted when their precondition doesn't apply
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            TokenStep::RentTopUp | TokenStep::CreateAssociatedTokenAccount | TokenStep::MintTo
        )
    }

    /// Identify which step an instruction performs, if any
    pub fn classify(ix: &Instruction, programs: &ProgramAddresses) -> Option<Self> {
        if ix.program_id == programs.system_program {
            let tag = ix
                .data
                .get(..4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))?;
            return match tag {
                SYSTEM_CREATE_ACCOUNT => Some(TokenStep::CreateMintAccount),
                SYSTEM_TRANSFER => Some(TokenStep::RentTopUp),
                _ => None,
            };
        }

        if ix.program_id == programs.associated_token_program {
            return Some(TokenStep::CreateAssociatedTokenAccount);
        }

        if ix.program_id == programs.token_program {
            // Metadata interface instructions use 8-byte discriminators, check them first
            if let Ok(TokenMetadataInstruction::Initialize(_)) =
                TokenMetadataInstruction::unpack(&ix.data)
            {
                return Some(TokenStep::InitializeMetadata);
            }
            return match ix.data.first() {
                Some(&TOKEN_METADATA_POINTER_EXTENSION) => {
                    Some(TokenStep::InitializeMetadataPointer)
                }
                Some(&TOKEN_INITIALIZE_MINT) => Some(TokenStep::InitializeMint),
                Some(&TOKEN_MINT_TO) => Some(TokenStep::MintTo),
                _ => None,
            };
        }

        None
    }
}

/// Validate token creation ordering (debug/test only)
///
/// # Errors
///
/// Returns `SdkError::InstructionBuild` if:
/// - an instruction doesn't belong to the creation sequence
/// - a step appears out of order or twice
/// - a mandatory step is missing
#[cfg(debug_assertions)]
pub fn sanity_check_token_creation_order(
    instructions: &[Instruction],
    programs: &ProgramAddresses,
) -> SdkResult<()> {
    if instructions.is_empty() {
        return Err(SdkError::instruction_failed(
            "token-2022",
            "Instruction list is empty",
        ));
    }

    let mut previous: Option<TokenStep> = None;
    let mut seen = Vec::with_capacity(instructions.len());

    for (idx, ix) in instructions.iter().enumerate() {
        let step = TokenStep::classify(ix, programs).ok_or_else(|| {
            SdkError::instruction_failed(
                "token-2022",
                format!(
                    "Unexpected instruction at position {} (program_id: {})",
                    idx, ix.program_id
                ),
            )
        })?;

        if let Some(prev) = previous {
            if step <= prev {
                return Err(SdkError::instruction_failed(
                    "token-2022",
                    format!("{step:?} at position {idx} must not follow {prev:?}"),
                ));
            }
        }
        previous = Some(step);
        seen.push(step);
    }

    for required in [
        TokenStep::CreateMintAccount,
        TokenStep::InitializeMetadataPointer,
        TokenStep::InitializeMint,
        TokenStep::InitializeMetadata,
    ] {
        if !seen.contains(&required) {
            return Err(SdkError::instruction_failed(
                "token-2022",
                format!("Missing mandatory step {required:?}"),
            ));
        }
    }

    Ok(())
}

/// No-op version for release builds
#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_token_creation_order(
    _instructions: &[Instruction],
    _programs: &ProgramAddresses,
) -> SdkResult<()> {
    Ok(())
}

/// Fail closed when an account list doesn't match the program's expected shape
pub fn ensure_account_count(
    accounts: &[AccountMeta],
    expected: usize,
    program: &Pubkey,
) -> SdkResult<()> {
    if accounts.len() != expected {
        return Err(SdkError::instruction_failed(
            program.to_string(),
            format!(
                "Account list has {} entries, program expects {}",
                accounts.len(),
                expected
            ),
        ));
    }
    Ok(())
}
