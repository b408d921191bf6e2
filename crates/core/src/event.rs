//! Live progress events for a running turn.
//!
//! `PipelineEvent` is the wire shape a gateway would forward to clients over
//! SSE or WebSocket. `TurnObserver` is the hook trait the pipeline calls;
//! `ChannelObserver` adapts it onto an mpsc sender.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::command::CommandArgs;

/// How a partial command's arguments changed since the last notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartialDelta {
    /// A lone string argument grew; only the appended suffix is carried.
    Text { suffix: String },

    /// Anything else changed; the full current arguments are re-sent.
    Full { args: CommandArgs },
}

/// Events emitted while a turn runs.
///
/// - `partial_command` — a trailing command is still streaming in
/// - `running_command` — a completed command is about to execute
/// - `command_result`  — a dispatched command produced its result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// The trailing command grew but has not closed yet.
    PartialCommand {
        name: String,
        delta: PartialDelta,
        args: CommandArgs,
    },

    /// A completed command is entering dispatch.
    RunningCommand { name: String, args: CommandArgs },

    /// A dispatched command finished (the result may be an error object).
    CommandResult {
        name: String,
        result: serde_json::Value,
    },
}

impl PipelineEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PartialCommand { .. } => "partial_command",
            Self::RunningCommand { .. } => "running_command",
            Self::CommandResult { .. } => "command_result",
        }
    }
}

/// Hooks the pipeline calls as a turn progresses.
///
/// Implementations must be cheap or hand off quickly: the pipeline awaits
/// each hook before moving on, so a slow observer slows the turn.
#[async_trait]
pub trait TurnObserver: Send + Sync {
    async fn on_partial_command(&self, name: &str, delta: &PartialDelta, args: &CommandArgs);

    async fn on_running_command(&self, name: &str, args: &CommandArgs);

    async fn on_command_result(&self, name: &str, result: &serde_json::Value);
}

/// An observer that drops every event.
pub struct NullObserver;

#[async_trait]
impl TurnObserver for NullObserver {
    async fn on_partial_command(&self, _name: &str, _delta: &PartialDelta, _args: &CommandArgs) {}

    async fn on_running_command(&self, _name: &str, _args: &CommandArgs) {}

    async fn on_command_result(&self, _name: &str, _result: &serde_json::Value) {}
}

/// Forwards every event over an mpsc channel.
///
/// A dropped receiver is not an error: the turn keeps running and the
/// remaining events are discarded.
pub struct ChannelObserver {
    tx: mpsc::Sender<PipelineEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl TurnObserver for ChannelObserver {
    async fn on_partial_command(&self, name: &str, delta: &PartialDelta, args: &CommandArgs) {
        let _ = self
            .tx
            .send(PipelineEvent::PartialCommand {
                name: name.to_string(),
                delta: delta.clone(),
                args: args.clone(),
            })
            .await;
    }

    async fn on_running_command(&self, name: &str, args: &CommandArgs) {
        let _ = self
            .tx
            .send(PipelineEvent::RunningCommand {
                name: name.to_string(),
                args: args.clone(),
            })
            .await;
    }

    async fn on_command_result(&self, name: &str, result: &serde_json::Value) {
        let _ = self
            .tx
            .send(PipelineEvent::CommandResult {
                name: name.to_string(),
                result: result.clone(),
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_serialization_partial_command() {
        let event = PipelineEvent::PartialCommand {
            name: "say".into(),
            delta: PartialDelta::Text {
                suffix: ", world".into(),
            },
            args: CommandArgs::from(json!({"text": "Hello, world"})),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"partial_command""#));
        assert!(json.contains(r#""kind":"text""#));
        assert!(json.contains(r#""suffix":", world""#));
    }

    #[test]
    fn event_serialization_running_command() {
        let event = PipelineEvent::RunningCommand {
            name: "say".into(),
            args: CommandArgs::from(json!({"text": "hi"})),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"running_command""#));
        assert!(json.contains(r#""name":"say""#));
    }

    #[test]
    fn event_serialization_command_result() {
        let event = PipelineEvent::CommandResult {
            name: "say".into(),
            result: json!({"ok": true}),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"command_result""#));
    }

    #[test]
    fn event_type_names() {
        assert_eq!(
            PipelineEvent::RunningCommand {
                name: "x".into(),
                args: CommandArgs::Single(serde_json::Value::Null),
            }
            .event_type(),
            "running_command"
        );
        assert_eq!(
            PipelineEvent::CommandResult {
                name: "x".into(),
                result: serde_json::Value::Null,
            }
            .event_type(),
            "command_result"
        );
    }

    #[tokio::test]
    async fn channel_observer_forwards_events() {
        let (tx, mut rx) = mpsc::channel(8);
        let observer = ChannelObserver::new(tx);

        let args = CommandArgs::from(json!({"text": "hi"}));
        observer.on_running_command("say", &args).await;
        observer.on_command_result("say", &json!(null)).await;

        match rx.recv().await.unwrap() {
            PipelineEvent::RunningCommand { name, .. } => assert_eq!(name, "say"),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            PipelineEvent::CommandResult { name, .. } => assert_eq!(name, "say"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn channel_observer_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let observer = ChannelObserver::new(tx);
        observer
            .on_command_result("say", &serde_json::Value::Null)
            .await;
    }
}
