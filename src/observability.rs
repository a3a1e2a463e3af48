//! Logging setup and per-operation correlation

use serde::{Deserialize, Serialize};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::errors::{SdkError, SdkResult};

/// Correlation ID for tracking one SDK operation across build, sign and submit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Create a new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Named operation with a correlation ID, entered as a tracing span
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub operation: &'static str,
    pub correlation_id: CorrelationId,
}

impl OperationContext {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            correlation_id: CorrelationId::new(),
        }
    }

    /// Span carrying the operation name and correlation ID
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "sdk_operation",
            operation = self.operation,
            correlation_id = %self.correlation_id
        )
    }
}

/// Install a global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the `verbose` default. Fails if a global
/// subscriber is already set.
pub fn init_logging(verbose: bool, json: bool) -> SdkResult<()> {
    let default_filter = if verbose {
        "solana_token_sdk=debug,info"
    } else {
        "solana_token_sdk=info,warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    result.map_err(|e| SdkError::Configuration(format!("Failed to initialize logging: {e}")))
}
