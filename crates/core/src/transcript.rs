//! Transcript: the append-only conversation log.
//!
//! Every command echo, result record, and synthesized feedback message lands
//! here. Appending merges aggressively: consecutive same-role messages whose
//! contents are both JSON arrays become one growing array, so a burst of
//! command batches reads back as a single assistant message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The role of a transcript message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user, and the runtime speaking back to the model
    /// (command results are presented as user input).
    User,
    /// The model's own output: command echoes.
    Assistant,
    /// Runtime feedback (parse failure reports).
    System,
}

/// A single message in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    /// Unique message ID
    pub id: String,

    /// Who authored this message
    pub role: Role,

    /// The text content (often a serialized JSON array)
    pub content: String,

    /// Timestamp of the last append into this message
    pub timestamp: DateTime<Utc>,
}

impl TranscriptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What `Transcript::append` did with the incoming content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A new message object was pushed.
    Pushed,
    /// Content was merged into the previous message's JSON array.
    MergedArray,
    /// Content was newline-joined onto the previous message's text.
    MergedText,
}

/// Marks a position in the transcript so a turn's additions can be read back.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    index: usize,
    last_len: Option<usize>,
}

/// An ordered, append-only sequence of messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub messages: Vec<TranscriptMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append content under a role, merging with the previous message when
    /// the roles match.
    ///
    /// Merge rule: same role and both contents parse as JSON arrays, the new
    /// elements are appended to the existing array in place. Same role
    /// otherwise, the text is joined with a newline. A role change always
    /// pushes a fresh message.
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> AppendOutcome {
        let content = content.into();

        if let Some(last) = self.messages.last_mut() {
            if last.role == role {
                if let (Some(mut prev), Some(next)) =
                    (parse_json_array(&last.content), parse_json_array(&content))
                {
                    prev.extend(next);
                    last.content = Value::Array(prev).to_string();
                    last.timestamp = Utc::now();
                    return AppendOutcome::MergedArray;
                }

                last.content.push('\n');
                last.content.push_str(&content);
                last.timestamp = Utc::now();
                return AppendOutcome::MergedText;
            }
        }

        self.messages.push(TranscriptMessage::new(role, content));
        AppendOutcome::Pushed
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Record the current position for a later `delta` call.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            index: self.messages.len(),
            last_len: self.messages.last().map(|m| m.content.len()),
        }
    }

    /// The messages added or grown since `checkpoint` was taken.
    ///
    /// When the first append of a turn merged into the message that was
    /// already last at checkpoint time, that message is included in its
    /// merged form: the caller sees everything the turn touched.
    pub fn delta(&self, checkpoint: &Checkpoint) -> Vec<TranscriptMessage> {
        let mut out = Vec::new();

        if checkpoint.index > 0 {
            if let (Some(message), Some(recorded)) =
                (self.messages.get(checkpoint.index - 1), checkpoint.last_len)
            {
                if message.content.len() != recorded {
                    out.push(message.clone());
                }
            }
        }

        out.extend(self.messages.iter().skip(checkpoint.index).cloned());
        out
    }
}

fn parse_json_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}
