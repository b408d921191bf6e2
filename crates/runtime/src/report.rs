//! Turn outcome reporting.

use serde::{Deserialize, Serialize};
use switchyard_core::transcript::TranscriptMessage;

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The stream ended after at least one actionable dispatch.
    Done,

    /// `TurnContext::finish` was set mid-turn and the loop stopped early.
    Interrupted,

    /// The buffer could never parse, or the stream ended with nothing
    /// actionable dispatched. Feedback was appended to the transcript.
    Failed,
}

impl TurnOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }
}

/// Summary of one completed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReport {
    pub outcome: TurnOutcome,

    /// Commands executed this turn, the reasoning command included.
    pub commands_dispatched: usize,

    /// Executed commands other than the designated reasoning command.
    pub actionable_dispatched: usize,

    /// Transcript messages appended or extended during this turn.
    pub transcript_delta: Vec<TranscriptMessage>,

    /// The feedback message synthesized into the transcript, when the
    /// outcome is `Failed`.
    pub failure: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TurnOutcome::Interrupted).unwrap(),
            r#""interrupted""#
        );
        assert_eq!(TurnOutcome::Failed.as_str(), "failed");
    }
}
