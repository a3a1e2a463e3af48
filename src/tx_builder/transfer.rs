//! Native SOL transfer

use solana_sdk::pubkey::Pubkey;
use solana_system_interface::instruction as system_instruction;
use tracing::debug;

use super::transaction::UnsignedTransaction;
use crate::errors::{SdkError, SdkResult};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert a SOL amount to lamports, rounding down
///
/// Rejects non-finite, non-positive and sub-lamport amounts.
pub fn sol_to_lamports(amount_sol: f64) -> SdkResult<u64> {
    if !amount_sol.is_finite() {
        return Err(SdkError::validation(format!(
            "Transfer amount must be a finite number, got {amount_sol}"
        )));
    }
    if amount_sol <= 0.0 {
        return Err(SdkError::validation(format!(
            "Transfer amount must be positive, got {amount_sol}"
        )));
    }

    let lamports = (amount_sol * LAMPORTS_PER_SOL as f64).floor();
    if lamports < 1.0 {
        return Err(SdkError::validation(format!(
            "Transfer amount {amount_sol} SOL is below one lamport"
        )));
    }
    if lamports >= u64::MAX as f64 {
        return Err(SdkError::validation(format!(
            "Transfer amount {amount_sol} SOL overflows the lamport range"
        )));
    }
    Ok(lamports as u64)
}

/// Parameters for a native transfer; fee payer defaults to `from`
#[derive(Debug, Clone, PartialEq)]
pub struct TransferParams {
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount_sol: f64,
    pub fee_payer: Option<Pubkey>,
}

impl TransferParams {
    pub fn new(from: Pubkey, to: Pubkey, amount_sol: f64) -> Self {
        Self {
            from,
            to,
            amount_sol,
            fee_payer: None,
        }
    }

    pub fn with_fee_payer(mut self, fee_payer: Pubkey) -> Self {
        self.fee_payer = Some(fee_payer);
        self
    }
}

/// Build a single-instruction transfer
///
/// Reads no chain state; the blockhash is attached at signing time.
pub fn build_transfer(params: &TransferParams) -> SdkResult<UnsignedTransaction> {
    let lamports = sol_to_lamports(params.amount_sol)?;
    let fee_payer = params.fee_payer.unwrap_or(params.from);

    debug!(
        from = %params.from,
        to = %params.to,
        lamports,
        fee_payer = %fee_payer,
        "Building SOL transfer"
    );

    let ix = system_instruction::transfer(&params.from, &params.to, lamports);
    Ok(UnsignedTransaction::new(vec![ix], Some(fee_payer)))
}
