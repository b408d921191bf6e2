//! Per-turn shared state.
//!
//! One `TurnContext` is owned by one in-flight turn. Command handlers receive
//! it by reference; the `finished` flag is the only field they flip from
//! inside a dispatch, and it is how a `finish`-style command stops the rest
//! of the turn.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::transcript::Transcript;

/// Shared state for a single turn of execution.
pub struct TurnContext {
    /// Command names the current session may dispatch.
    pub allowed_commands: HashSet<String>,

    /// User preference flags, in priority order.
    pub preference_flags: Vec<String>,

    /// The conversation log, shared with the session that owns it.
    pub transcript: Arc<Mutex<Transcript>>,

    finished: AtomicBool,
    scratch: Mutex<Map<String, Value>>,
}

impl TurnContext {
    pub fn new(
        allowed_commands: impl IntoIterator<Item = String>,
        preference_flags: Vec<String>,
    ) -> Self {
        Self::with_transcript(
            allowed_commands,
            preference_flags,
            Arc::new(Mutex::new(Transcript::new())),
        )
    }

    pub fn with_transcript(
        allowed_commands: impl IntoIterator<Item = String>,
        preference_flags: Vec<String>,
        transcript: Arc<Mutex<Transcript>>,
    ) -> Self {
        Self {
            allowed_commands: allowed_commands.into_iter().collect(),
            preference_flags,
            transcript,
            finished: AtomicBool::new(false),
            scratch: Mutex::new(Map::new()),
        }
    }

    /// Request that the current turn stop after the in-flight command.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn allows(&self, name: &str) -> bool {
        self.allowed_commands.contains(name)
    }

    /// Stash a value for a later command in the same turn.
    pub fn scratch_insert(&self, key: impl Into<String>, value: Value) {
        let mut scratch = self.scratch.lock().unwrap_or_else(|e| e.into_inner());
        scratch.insert(key.into(), value);
    }

    pub fn scratch_get(&self, key: &str) -> Option<Value> {
        let scratch = self.scratch.lock().unwrap_or_else(|e| e.into_inner());
        scratch.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> TurnContext {
        TurnContext::new(
            ["say".to_string(), "finish".to_string()],
            vec!["fast".into()],
        )
    }

    #[test]
    fn finish_flag_starts_clear_and_latches() {
        let ctx = context();
        assert!(!ctx.is_finished());
        ctx.finish();
        assert!(ctx.is_finished());
        ctx.finish();
        assert!(ctx.is_finished());
    }

    #[test]
    fn allowlist_membership() {
        let ctx = context();
        assert!(ctx.allows("say"));
        assert!(!ctx.allows("format_disk"));
    }

    #[test]
    fn scratch_roundtrip() {
        let ctx = context();
        assert!(ctx.scratch_get("cursor").is_none());
        ctx.scratch_insert("cursor", serde_json::json!(42));
        assert_eq!(ctx.scratch_get("cursor"), Some(serde_json::json!(42)));
    }
}
