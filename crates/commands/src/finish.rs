//! The `finish` command: cooperative end of turn.

use async_trait::async_trait;
use serde_json::Value;
use switchyard_core::command::CommandArgs;
use switchyard_core::context::TurnContext;
use switchyard_core::error::CommandError;
use switchyard_core::provider::Provider;
use tracing::info;

pub struct FinishCommand;

#[async_trait]
impl Provider for FinishCommand {
    fn operation(&self) -> &str {
        "finish"
    }

    fn provider_id(&self) -> &str {
        "builtin"
    }

    fn docstring(&self) -> &str {
        "End the current turn once the task is complete. Arguments: {\"reason\": string}. \
         Commands after this one in the same list are not executed."
    }

    async fn invoke(&self, args: CommandArgs, ctx: &TurnContext) -> Result<Value, CommandError> {
        let reason = match &args {
            CommandArgs::Named(map) => map.get("reason").and_then(Value::as_str),
            CommandArgs::Single(value) => value.as_str(),
            CommandArgs::Positional(items) => items.first().and_then(Value::as_str),
        };
        info!(reason = reason.unwrap_or("unspecified"), "finish requested");
        ctx.finish();
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn finish_sets_the_turn_flag() {
        let ctx = TurnContext::new(Vec::<String>::new(), Vec::new());
        assert!(!ctx.is_finished());

        FinishCommand
            .invoke(CommandArgs::from(json!({"reason": "all done"})), &ctx)
            .await
            .unwrap();
        assert!(ctx.is_finished());
    }
}
