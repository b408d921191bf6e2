//! The `reasoning` command: the model thinking out loud.
//!
//! Deliberately a no-op. The thought stays visible in the command echo so
//! later turns can read it back, but nothing executes and nothing returns.
//! The runtime treats a turn of nothing but reasoning as a turn that did
//! nothing.

use async_trait::async_trait;
use serde_json::Value;
use switchyard_core::command::CommandArgs;
use switchyard_core::context::TurnContext;
use switchyard_core::error::CommandError;
use switchyard_core::provider::Provider;
use tracing::debug;

pub struct ReasoningCommand;

#[async_trait]
impl Provider for ReasoningCommand {
    fn operation(&self) -> &str {
        "reasoning"
    }

    fn provider_id(&self) -> &str {
        "builtin"
    }

    fn docstring(&self) -> &str {
        "Think out loud before acting. Arguments: {\"text\": string}. The text is not shown \
         to the user; always follow it with real commands in the same list."
    }

    async fn invoke(&self, _args: CommandArgs, _ctx: &TurnContext) -> Result<Value, CommandError> {
        debug!("reasoning step recorded");
        Ok(Value::Null)
    }
}
