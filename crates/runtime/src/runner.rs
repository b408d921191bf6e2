//! The command-stream execution loop.
//!
//! One `TurnRunner::run` call drives one conversation turn: it consumes text
//! chunks from the upstream channel, re-parses the accumulated buffer after
//! every chunk and dispatches each newly completed command exactly once, in
//! array order. Failures of the model's output quality become transcript
//! feedback for the next turn, never errors for the caller.

use std::sync::{Arc, MutexGuard};

use serde_json::{Value, json};
use switchyard_core::command::Command;
use switchyard_core::context::TurnContext;
use switchyard_core::error::ParseError;
use switchyard_core::event::{NullObserver, TurnObserver};
use switchyard_core::transcript::{Role, Transcript};
use switchyard_parser::{StreamingCommandParser, diagnose};
use switchyard_registry::ProviderRegistry;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::delta::PartialTracker;
use crate::report::{TurnOutcome, TurnReport};

/// Characters of buffer tail quoted back to the model on a failed turn.
const FAILURE_TAIL_CHARS: usize = 500;

/// Drives conversation turns against a sealed provider registry.
pub struct TurnRunner {
    registry: Arc<ProviderRegistry>,
    observer: Arc<dyn TurnObserver>,
    reasoning_command: String,
}

impl TurnRunner {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            observer: Arc::new(NullObserver),
            reasoning_command: "reasoning".into(),
        }
    }

    /// Attach an observer for live progress events.
    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Name of the no-op thinking command. A turn whose only dispatches are
    /// of this command still counts as having executed nothing.
    pub fn with_reasoning_command(mut self, name: impl Into<String>) -> Self {
        self.reasoning_command = name.into();
        self
    }

    /// Consume `chunks` to completion for one turn.
    ///
    /// 1. Appends each chunk to the buffer and re-parses it from scratch.
    /// 2. Dispatches every newly completed command once, strictly in order.
    /// 3. Streams partial-command progress to the observer.
    /// 4. On a dead turn, appends feedback to the transcript and reports
    ///    `Failed` instead of returning an error.
    pub async fn run(&self, ctx: &TurnContext, mut chunks: mpsc::Receiver<String>) -> TurnReport {
        info!(operations = self.registry.len(), "turn started");

        let checkpoint = lock_transcript(ctx).checkpoint();

        let mut parser = StreamingCommandParser::new();
        let mut tracker = PartialTracker::new();
        let mut buffer = String::new();
        let mut last_partial: Option<Command> = None;
        let mut slots = 0usize;
        let mut dispatched = 0usize;
        let mut actionable = 0usize;
        let mut failure = None;

        let outcome = 'turn: loop {
            let Some(chunk) = chunks.recv().await else {
                // Natural end of stream.
                if actionable > 0 {
                    break TurnOutcome::Done;
                }
                warn!(dispatched, "stream ended with nothing actionable dispatched");
                let feedback = synthesize_feedback(&buffer);
                lock_transcript(ctx).append(Role::System, &feedback);
                failure = Some(feedback);
                break TurnOutcome::Failed;
            };
            buffer.push_str(&chunk);

            let batch = match parser.parse(&buffer) {
                Ok(batch) => batch,
                Err(ParseError::InvalidStart { found }) => {
                    // No later chunk can fix the first character. Echo the
                    // buffer back verbatim and abandon the stream.
                    chunks.close();
                    warn!(found = %found, "response cannot open a command array");
                    let feedback = synthesize_feedback(&buffer);
                    {
                        let mut transcript = lock_transcript(ctx);
                        transcript.append(Role::Assistant, &buffer);
                        transcript.append(Role::System, &feedback);
                    }
                    failure = Some(feedback);
                    break TurnOutcome::Failed;
                }
            };
            last_partial = batch.partial.clone();

            for command in &batch.complete {
                if ctx.is_finished() {
                    break 'turn self.interrupt(ctx, &mut chunks, last_partial.as_ref());
                }
                let slot = slots;
                slots += 1;
                let delta = tracker.finalize(slot, command);

                if !ctx.allows(&command.name) {
                    warn!(command = %command.name, "skipping command outside the allow-list");
                    continue;
                }
                if command.args.is_blank() {
                    debug!(command = %command.name, "skipping command with blank arguments");
                    continue;
                }

                // Final partial announcement: observers see the full
                // arguments of what is about to run.
                self.observer
                    .on_partial_command(&command.name, &delta, &command.args)
                    .await;
                self.dispatch(ctx, command).await;
                dispatched += 1;
                if command.name != self.reasoning_command {
                    actionable += 1;
                }
            }

            if ctx.is_finished() {
                break self.interrupt(ctx, &mut chunks, last_partial.as_ref());
            }

            if let Some(partial) = &batch.partial {
                if let Some(delta) = tracker.update(slots, partial) {
                    debug!(command = %partial.name, "partial command progressed");
                    self.observer
                        .on_partial_command(&partial.name, &delta, &partial.args)
                        .await;
                }
            }
        };

        if outcome == TurnOutcome::Done && last_partial.is_some() {
            debug!("stream ended with an unfinished trailing command, dropping it");
        }

        let transcript_delta = lock_transcript(ctx).delta(&checkpoint);
        info!(
            outcome = outcome.as_str(),
            dispatched, actionable, "turn finished"
        );
        TurnReport {
            outcome,
            commands_dispatched: dispatched,
            actionable_dispatched: actionable,
            transcript_delta,
            failure,
        }
    }

    /// Run one allowed, non-blank command: echo, execute, record the result.
    async fn dispatch(&self, ctx: &TurnContext, command: &Command) {
        lock_transcript(ctx).append(Role::Assistant, command_echo(command));
        self.observer
            .on_running_command(&command.name, &command.args)
            .await;

        let result = match self
            .registry
            .execute(&command.name, command.args.clone(), ctx)
            .await
        {
            Ok(value) => value,
            Err(error) => {
                warn!(command = %command.name, %error, "command failed");
                json!({ "error": error.to_string() })
            }
        };

        self.observer
            .on_command_result(&command.name, &result)
            .await;
        // Null means "no result, continue silently": no transcript echo.
        if !result.is_null() {
            lock_transcript(ctx).append(Role::User, result_echo(&command.name, &result));
        }
    }

    /// Stop the turn after a cooperative finish signal: close the upstream,
    /// mark the still-open trailing command as interrupted.
    fn interrupt(
        &self,
        ctx: &TurnContext,
        chunks: &mut mpsc::Receiver<String>,
        outstanding: Option<&Command>,
    ) -> TurnOutcome {
        chunks.close();
        if let Some(partial) = outstanding {
            debug!(command = %partial.name, "marking interrupted partial command");
            let mut transcript = lock_transcript(ctx);
            transcript.append(Role::Assistant, command_echo(partial));
            transcript.append(
                Role::User,
                result_echo(&partial.name, &json!("(Interrupted)")),
            );
        }
        info!("turn interrupted");
        TurnOutcome::Interrupted
    }
}

fn lock_transcript(ctx: &TurnContext) -> MutexGuard<'_, Transcript> {
    ctx.transcript.lock().unwrap_or_else(|e| e.into_inner())
}

/// One command as a single-element JSON array, so consecutive assistant
/// echoes merge into one growing array in the transcript.
fn command_echo(command: &Command) -> String {
    Value::Array(vec![command.to_element()]).to_string()
}

fn result_echo(name: &str, result: &Value) -> String {
    json!([{ "command": name, "result": result }]).to_string()
}

/// Model-facing feedback for a turn that executed nothing.
fn synthesize_feedback(buffer: &str) -> String {
    let mut message =
        String::from("Protocol error: no commands could be executed from this response.");
    if let Some(reason) = diagnose(buffer) {
        message.push_str("\nParser: ");
        message.push_str(&reason);
    }
    let tail = buffer_tail(buffer.trim(), FAILURE_TAIL_CHARS);
    if !tail.is_empty() {
        message.push_str("\nUnparsed tail:\n");
        message.push_str(tail);
    }
    message.push_str(
        "\nRespond with exactly one JSON array of command objects, for example \
         [{\"say\": {\"text\": \"...\"}}]. Common mistakes: a fenced code block \
         around the array, unescaped control characters inside a string value \
         (put literal text between START_RAW and END_RAW lines instead), prose \
         before the array, or several command arrays in one response.",
    );
    message
}

/// The last `limit` characters of `text`, on a char boundary.
fn buffer_tail(text: &str, limit: usize) -> &str {
    match text.char_indices().rev().nth(limit.saturating_sub(1)) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
