//! # Switchyard Parser
//!
//! Incremental, fault-tolerant parsing of a growing text buffer into command
//! batches. The model's output is JSON-like but not reliably JSON: it arrives
//! in chunks, carries raw-literal blocks, and breaks in recurring ways. The
//! parser runs a ladder of recovery strategies over the whole buffer on every
//! call and guarantees monotonic progress: an element reported `complete`
//! once is never reported again on a longer buffer.

pub mod raw;
pub mod strategy;

mod lenient;

use serde_json::Value;
use tracing::{debug, warn};

use switchyard_core::command::{Command, ParsedBatch};
use switchyard_core::error::ParseError;

pub use raw::rewrite_raw_blocks;
pub use strategy::{RawBatch, Strategy, STRATEGIES};

/// Per-turn streaming parser.
///
/// Holds the high-water mark of wire elements already handed out as
/// `complete`, so repeated calls over a growing buffer only ever surface new
/// work. One instance serves exactly one turn.
#[derive(Debug, Default)]
pub struct StreamingCommandParser {
    emitted: usize,
}

impl StreamingCommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the buffer accumulated so far.
    ///
    /// Returns the batch of newly completed commands plus the current open
    /// partial, or `Err` for the one terminal condition: a first visible
    /// character that rules out a command list entirely. An empty (or
    /// all-whitespace) buffer is a stall, not an error.
    pub fn parse(&mut self, buffer: &str) -> Result<ParsedBatch, ParseError> {
        let trimmed = buffer.trim_start();
        let Some(first) = trimmed.chars().next() else {
            return Ok(ParsedBatch::default());
        };
        if first != '[' && first != '{' {
            return Err(ParseError::InvalidStart { found: first });
        }

        let text = raw::rewrite_raw_blocks(buffer);
        let Some((name, batch)) = STRATEGIES
            .iter()
            .find_map(|(name, run)| run(&text).map(|batch| (*name, batch)))
        else {
            return Ok(ParsedBatch::default());
        };
        debug!(
            strategy = name,
            elements = batch.elements.len(),
            partial = batch.partial.is_some(),
            "parse strategy succeeded"
        );

        let mut complete = Vec::new();
        for (index, element) in batch.elements.iter().enumerate() {
            match Command::from_element(element) {
                Some(command) => {
                    if index >= self.emitted {
                        complete.push(command);
                    }
                }
                None => {
                    if index >= self.emitted {
                        warn!(index, "dropping element not shaped like a command");
                    }
                }
            }
        }
        self.emitted = self.emitted.max(batch.elements.len());

        // A partial that is not command-shaped is not worth surfacing.
        let partial = batch.partial.as_ref().and_then(Command::from_element);

        Ok(ParsedBatch { complete, partial })
    }

    /// Wire elements consumed so far (dropped ones included).
    pub fn elements_emitted(&self) -> usize {
        self.emitted
    }
}

/// Explain why the buffer does not strict-parse, for failure reports.
///
/// Runs the raw-block rewrite and a strict JSON parse, and returns the parse
/// error's own message. `None` when the buffer is fine (the failure was
/// elsewhere).
pub fn diagnose(buffer: &str) -> Option<String> {
    let text = raw::rewrite_raw_blocks(buffer);
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(_)) | Ok(Value::Object(_)) => None,
        Ok(other) => Some(format!(
            "expected an array of commands, found a bare {}",
            value_kind(&other)
        )),
        Err(e) => Some(e.to_string()),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
