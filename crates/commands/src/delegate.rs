//! The `delegate` service: a round-trip exchange with a sub-agent.
//!
//! The provider owns the requesting half of an exchange channel. Whoever
//! drives the sub-agent consumes `ExchangeRequest`s and answers over the
//! enclosed oneshot sender. Each round trip is bounded by a timeout;
//! exceeding it fails that round, there is no silent retry.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use switchyard_core::command::CommandArgs;
use switchyard_core::context::TurnContext;
use switchyard_core::error::CommandError;
use switchyard_core::provider::Provider;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default round-trip budget for one exchange.
pub const DEFAULT_EXCHANGE_TIMEOUT_SECS: u64 = 120;

/// One question for the sub-agent, with the slot its answer goes back to.
pub struct ExchangeRequest {
    pub prompt: String,
    pub reply: oneshot::Sender<Value>,
}

pub struct DelegateProvider {
    requests: mpsc::Sender<ExchangeRequest>,
    timeout_secs: u64,
}

impl DelegateProvider {
    pub fn new(requests: mpsc::Sender<ExchangeRequest>) -> Self {
        Self {
            requests,
            timeout_secs: DEFAULT_EXCHANGE_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[async_trait]
impl Provider for DelegateProvider {
    fn operation(&self) -> &str {
        "delegate"
    }

    fn provider_id(&self) -> &str {
        "builtin"
    }

    fn docstring(&self) -> &str {
        "Hand a sub-task to another agent and wait for its answer. \
         Arguments: {\"prompt\": string}."
    }

    async fn invoke(&self, args: CommandArgs, _ctx: &TurnContext) -> Result<Value, CommandError> {
        let prompt = prompt_text(&args)
            .ok_or_else(|| CommandError::InvalidArguments("missing 'prompt'".into()))?
            .to_string();

        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(ExchangeRequest {
                prompt,
                reply: reply_tx,
            })
            .await
            .map_err(|_| CommandError::Delegation("sub-agent endpoint is gone".into()))?;

        debug!(timeout_secs = self.timeout_secs, "awaiting sub-agent reply");
        match timeout(Duration::from_secs(self.timeout_secs), reply_rx).await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(_)) => Err(CommandError::Delegation(
                "sub-agent dropped the exchange without answering".into(),
            )),
            Err(_) => {
                warn!(timeout_secs = self.timeout_secs, "sub-agent reply timed out");
                Err(CommandError::Timeout {
                    timeout_secs: self.timeout_secs,
                })
            }
        }
    }
}

fn prompt_text(args: &CommandArgs) -> Option<&str> {
    match args {
        CommandArgs::Named(map) => map.get("prompt")?.as_str(),
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
    async fn round_trip_returns_the_answer() {
        let (tx, mut rx) = mpsc::channel(1);
        let provider = DelegateProvider::new(tx);

        let answerer = tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            assert_eq!(request.prompt, "what is 2+2");
            request.reply.send(json!({"answer": 4})).unwrap();
        });

        let result = provider
            .invoke(CommandArgs::from(json!({"prompt": "what is 2+2"})), &context())
            .await
            .unwrap();
        assert_eq!(result, json!({"answer": 4}));
        answerer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn missing_reply_times_out_as_a_hard_failure() {
        let (tx, _rx) = mpsc::channel(1);
        let provider = DelegateProvider::new(tx).with_timeout_secs(5);

        let err = provider
            .invoke(CommandArgs::from(json!({"prompt": "solve this"})), &context())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { timeout_secs: 5 }));
    }

    #[tokio::test]
    async fn dropped_exchange_is_reported() {
        let (tx, mut rx) = mpsc::channel(1);
        let provider = DelegateProvider::new(tx);

        let answerer = tokio::spawn(async move {
            drop(rx.recv().await.unwrap());
        });

        let err = provider
            .invoke(CommandArgs::from(json!({"prompt": "anyone there"})), &context())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Delegation(_)));
        answerer.await.unwrap();
    }

    #[tokio::test]
    async fn closed_endpoint_is_reported() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let provider = DelegateProvider::new(tx);

        let err = provider
            .invoke(CommandArgs::from(json!({"prompt": "hello"})), &context())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Delegation(_)));
    }

    #[tokio::test]
    async fn missing_prompt_is_invalid() {
        let (tx, _rx) = mpsc::channel(1);
        let provider = DelegateProvider::new(tx);

        let err = provider
            .invoke(CommandArgs::from(json!({"task": 7})), &context())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments(_)));
    }
}
