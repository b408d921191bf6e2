//! Error types for the Switchyard domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `Error` is the umbrella.

use thiserror::Error;

/// The top-level error type for all Switchyard operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Parser errors ---
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    // --- Command handler errors ---
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    // --- Registry errors ---
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures raised by the streaming command parser.
///
/// Only `InvalidStart` is terminal: more chunks can never fix a buffer whose
/// first visible character already rules out a command list. Everything else
/// the parser sees (truncation, stray characters) is recoverable and is
/// reported through the batch, not through an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("response must start with '[' or '{{', found {found:?}")]
    InvalidStart { found: char },
}

/// Failures raised by a command handler during `invoke`.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error("{0}")]
    Failed(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("delegation failed: {0}")]
    Delegation(String),
}

impl CommandError {
    /// Shorthand for the common free-form failure case.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Failures raised by provider registration or resolution.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("no provider registered for operation '{operation}'")]
    UnknownOperation { operation: String },

    #[error("cannot choose a provider for '{operation}': {candidates} candidates, flags tried {flags:?}")]
    Ambiguous {
        operation: String,
        candidates: usize,
        flags: Vec<String>,
    },

    #[error("command provider '{provider_id}' for '{operation}' requires a docstring")]
    MissingDocstring {
        operation: String,
        provider_id: String,
    },
}
