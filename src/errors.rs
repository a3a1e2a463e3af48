//! Error types for the token SDK
//!
//! Every fallible SDK operation returns [`SdkError`]. The taxonomy mirrors the
//! lifecycle of a transaction:
//! - input validation (raised before any network call)
//! - instruction construction
//! - RPC access
//! - signing
//! - chain rejection
//!
//! Submission, simulation and confirmation outcomes are reported as result
//! objects (see [`crate::submit`]) rather than errors.

use solana_client::client_error::ClientError;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type SdkResult<T> = Result<T, SdkError>;

/// Error type for all SDK operations
#[derive(Error, Debug)]
pub enum SdkError {
    /// Caller input rejected before any RPC call
    ///
    /// Non-positive amounts, empty strings, same-asset pools and similar.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An address string could not be parsed as a public key
    #[error("Invalid address for {field}: {value}")]
    InvalidAddress {
        /// Which parameter carried the bad address
        field: String,
        /// The rejected input
        value: String,
    },

    /// Failed to build an instruction for a specific program
    #[error("Instruction build error (program={program}): {reason}")]
    InstructionBuild {
        /// The program the instruction targets
        program: String,
        /// Detailed reason for the failure
        reason: String,
    },

    /// RPC client error
    ///
    /// Wraps the original client message, no retry is attempted.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Failed to sign the transaction
    ///
    /// Covers malformed keypairs, signer/message mismatches and wallet
    /// rejections. No partially signed transaction is ever returned alongside
    /// this error.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The chain rejected a transaction
    #[error("Transaction rejected{}: {message}", signature_suffix(.signature))]
    Transaction {
        /// Signature of the rejected transaction, when one was assigned
        signature: Option<String>,
        /// Rejection reason reported by the chain
        message: String,
    },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Wrapped error from external collaborators (wallet adapters)
    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl SdkError {
    /// Check if retrying the same call might succeed
    ///
    /// The SDK never retries on its own, this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rpc(_) => true,
            Self::Transaction { message, .. } => {
                // Expired blockhashes succeed on a rebuild, program failures don't
                let msg = message.to_lowercase();
                msg.contains("blockhash not found") || msg.contains("block height exceeded")
            }

            Self::Validation(_) => false,
            Self::InvalidAddress { .. } => false,
            Self::InstructionBuild { .. } => false,
            Self::Signing(_) => false,
            Self::Configuration(_) => false,
            Self::External(_) => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidAddress { .. } => "validation",
            Self::InstructionBuild { .. } => "instruction",
            Self::Rpc(_) => "rpc",
            Self::Signing(_) => "signing",
            Self::Transaction { .. } => "transaction",
            Self::Configuration(_) => "config",
            Self::External(_) => "external",
        }
    }
}

// Convenience constructors for common error scenarios
impl SdkError {
    /// Create a validation error
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Create an invalid address error for a named parameter
    pub fn invalid_address(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidAddress {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an instruction build error for a specific program
    pub fn instruction_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InstructionBuild {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Create a signing error
    pub fn signing(reason: impl Into<String>) -> Self {
        Self::Signing(reason.into())
    }

    /// Create a transaction rejection error
    pub fn rejected(signature: Option<String>, message: impl Into<String>) -> Self {
        Self::Transaction {
            signature,
            message: message.into(),
        }
    }
}

fn signature_suffix(signature: &Option<String>) -> String {
    signature
        .as_ref()
        .map(|sig| format!(" (signature={sig})"))
        .unwrap_or_default()
}

impl From<ClientError> for SdkError {
    fn from(err: ClientError) -> Self {
        Self::Rpc(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SdkError::Validation("amount must be positive".to_string());
        assert_eq!(err.to_string(), "Validation error: amount must be positive");

        let err = SdkError::InstructionBuild {
            program: "amm".to_string(),
            reason: "account count mismatch".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Instruction build error (program=amm): account count mismatch"
        );

        let err = SdkError::rejected(Some("5xyz".to_string()), "custom program error: 0x1");
        assert_eq!(
            err.to_string(),
            "Transaction rejected (signature=5xyz): custom program error: 0x1"
        );

        let err = SdkError::rejected(None, "insufficient funds");
        assert_eq!(err.to_string(), "Transaction rejected: insufficient funds");
    }

    #[test]
    fn test_error_retryability() {
        assert!(SdkError::Rpc("connection reset".to_string()).is_retryable());
        assert!(SdkError::rejected(None, "Blockhash not found").is_retryable());

        assert!(!SdkError::rejected(None, "custom program error: 0x1").is_retryable());
        assert!(!SdkError::Signing("test".to_string()).is_retryable());
        assert!(!SdkError::Validation("test".to_string()).is_retryable());
        assert!(!SdkError::Configuration("test".to_string()).is_retryable());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(SdkError::validation("x").category(), "validation");
        assert_eq!(SdkError::invalid_address("mint", "abc").category(), "validation");
        assert_eq!(SdkError::signing("x").category(), "signing");
        assert_eq!(SdkError::Rpc("x".to_string()).category(), "rpc");
    }

    #[test]
    fn test_external_conversion() {
        let err: SdkError = anyhow::anyhow!("user rejected the request").into();
        assert!(matches!(err, SdkError::External(_)));
        assert!(err.to_string().contains("user rejected"));
    }
}
