//! Provider trait: the abstraction over command implementations.
//!
//! A provider is one concrete implementation of a logical operation. Several
//! providers may compete for the same operation name; the registry picks one
//! at call time using the caller's preference flags.

use async_trait::async_trait;
use serde_json::Value;

use crate::command::CommandArgs;
use crate::context::TurnContext;
use crate::error::CommandError;

/// One registered implementation of an operation.
///
/// Implementations must be stateless across turns (any per-turn state goes
/// through the `TurnContext`), because a single instance serves every
/// session in the process.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The logical operation this provider implements (e.g. "say").
    fn operation(&self) -> &str;

    /// Identifier distinguishing this implementation from its competitors
    /// (e.g. "builtin", "remote_tts").
    fn provider_id(&self) -> &str;

    /// Model-facing documentation for the operation. Required when the
    /// provider is registered as a command; optional for services.
    fn docstring(&self) -> &str {
        ""
    }

    /// Capability flags this implementation carries (e.g. "local", "fast").
    fn capabilities(&self) -> Vec<String> {
        Vec::new()
    }

    /// Execute with resolved arguments.
    ///
    /// Returning `Value::Null` means "no result, continue silently": the
    /// pipeline will not echo anything into the transcript for it.
    async fn invoke(&self, args: CommandArgs, ctx: &TurnContext)
    -> Result<Value, CommandError>;
}
