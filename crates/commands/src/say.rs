//! The `say` command: text the model addresses to the user.
//!
//! The spoken text reaches the user through the observer notifications while
//! it streams; by the time `invoke` runs, display has already happened. The
//! handler validates the arguments and returns null so no result echo lands
//! in the transcript.

use async_trait::async_trait;
use serde_json::Value;
use switchyard_core::command::CommandArgs;
use switchyard_core::context::TurnContext;
use switchyard_core::error::CommandError;
use switchyard_core::provider::Provider;
use tracing::info;

pub struct SayCommand;

#[async_trait]
impl Provider for SayCommand {
    fn operation(&self) -> &str {
        "say"
    }

    fn provider_id(&self) -> &str {
        "builtin"
    }

    fn docstring(&self) -> &str {
        "Say something to the user. Arguments: {\"text\": string, \"done\": optional bool}. \
         The text is shown verbatim; set done to true on the final message of a reply."
    }

    async fn invoke(&self, args: CommandArgs, _ctx: &TurnContext) -> Result<Value, CommandError> {
        let text = spoken_text(&args)
            .ok_or_else(|| CommandError::InvalidArguments("missing 'text'".into()))?;
        let done = matches!(
            &args,
            CommandArgs::Named(map) if map.get("done").and_then(Value::as_bool) == Some(true)
        );
        info!(chars = text.len(), done, "say");
        Ok(Value::Null)
    }
}

/// Accepts the named shape plus a bare string, which sloppy model output
/// sometimes produces.
fn spoken_text(args: &CommandArgs) -> Option<&str> {
    match args {
        CommandArgs::Named(map) => map.get("text")?.as_str(),
        CommandArgs::Single(value) => value.as_str(),
        CommandArgs::Positional(items) => items.first()?.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> TurnContext {
        TurnContext::new(Vec::<String>::new(), Vec::new())
    }

    #[tokio::test]
    async fn named_text_is_accepted() {
        let result = SayCommand
            .invoke(
                CommandArgs::from(json!({"text": "hi", "done": true})),
                &context(),
            )
            .await
            .unwrap();
        assert!(result.is_null());
    }

    #[tokio::test]
    async fn bare_string_is_accepted() {
        let result = SayCommand
            .invoke(CommandArgs::from(json!("hi")), &context())
            .await
            .unwrap();
        assert!(result.is_null());
    }

    #[tokio::test]
    async fn missing_text_is_invalid() {
        let err = SayCommand
            .invoke(CommandArgs::from(json!({"volume": 11})), &context())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments(_)));
    }
}
