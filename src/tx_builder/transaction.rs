//! Unsigned transaction value produced by every builder

use solana_sdk::{
    hash::Hash, instruction::Instruction, message::Message, pubkey::Pubkey,
    transaction::Transaction,
};

/// Ordered instructions plus an optional fee payer and blockhash placeholder
///
/// Builders leave `recent_blockhash` empty; signing fills it immediately
/// before signatures are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub instructions: Vec<Instruction>,
    pub fee_payer: Option<Pubkey>,
    pub recent_blockhash: Option<Hash>,
}

impl UnsignedTransaction {
    pub fn new(instructions: Vec<Instruction>, fee_payer: Option<Pubkey>) -> Self {
        Self {
            instructions,
            fee_payer,
            recent_blockhash: None,
        }
    }

    pub fn with_blockhash(mut self, blockhash: Hash) -> Self {
        self.recent_blockhash = Some(blockhash);
        self
    }

    pub fn set_blockhash(&mut self, blockhash: Hash) {
        self.recent_blockhash = Some(blockhash);
    }

    /// Compile the message, falling back to `default_payer` when no fee payer was set
    pub fn message(&self, default_payer: &Pubkey) -> Message {
        let payer = self.fee_payer.unwrap_or(*default_payer);
        let mut message = Message::new(&self.instructions, Some(&payer));
        if let Some(blockhash) = self.recent_blockhash {
            message.recent_blockhash = blockhash;
        }
        message
    }

    /// Unsigned legacy transaction ready for signature slots to be filled
    pub fn to_transaction(&self, default_payer: &Pubkey) -> Transaction {
        Transaction::new_unsigned(self.message(default_payer))
    }

    /// Accounts that must sign, fee payer first
    pub fn required_signers(&self, default_payer: &Pubkey) -> Vec<Pubkey> {
        let message = self.message(default_payer);
        let count = usize::from(message.header.num_required_signatures);
        message.account_keys.into_iter().take(count).collect()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
