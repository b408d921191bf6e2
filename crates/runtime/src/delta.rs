//! Incremental diffing for partial-command notifications.
//!
//! While the tail command of the buffer is still open, every chunk may grow
//! its arguments. Re-sending the whole argument set on each keystroke-sized
//! chunk is wasteful for the common case of one long string argument, so the
//! tracker remembers the last announced state and emits just the appended
//! suffix when the growth is a plain string extension.

use switchyard_core::command::{Command, CommandArgs};
use switchyard_core::event::PartialDelta;

/// Remembers the last announced partial command and computes the smallest
/// honest delta for the next announcement.
#[derive(Debug, Default)]
pub struct PartialTracker {
    last: Option<Announced>,
}

#[derive(Debug)]
struct Announced {
    slot: usize,
    name: String,
    args: CommandArgs,
}

impl PartialTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta for announcing the still-open command at element `slot`.
    ///
    /// Returns `None` when nothing changed since the last announcement.
    /// State resets whenever the slot or the command name changes, so a
    /// string argument of a new command is never diffed against the
    /// previous command's.
    pub fn update(&mut self, slot: usize, command: &Command) -> Option<PartialDelta> {
        let delta = match &self.last {
            Some(prev) if prev.slot == slot && prev.name == command.name => {
                if prev.args == command.args {
                    return None;
                }
                match string_suffix(&prev.args, &command.args) {
                    Some(suffix) => PartialDelta::Text { suffix },
                    None => PartialDelta::Full {
                        args: command.args.clone(),
                    },
                }
            }
            _ => PartialDelta::Full {
                args: command.args.clone(),
            },
        };
        self.last = Some(Announced {
            slot,
            name: command.name.clone(),
            args: command.args.clone(),
        });
        Some(delta)
    }

    /// Delta for the final announcement of the command at `slot`, made just
    /// before it executes. Always produces a delta and retires the slot.
    pub fn finalize(&mut self, slot: usize, command: &Command) -> PartialDelta {
        let prev = self.last.take();
        match prev {
            Some(prev) if prev.slot == slot && prev.name == command.name => {
                match string_suffix(&prev.args, &command.args) {
                    Some(suffix) => PartialDelta::Text { suffix },
                    None => PartialDelta::Full {
                        args: command.args.clone(),
                    },
                }
            }
            _ => PartialDelta::Full {
                args: command.args.clone(),
            },
        }
    }
}

/// The appended text when both argument sets are the same lone-string shape
/// and the new value extends the old one. `Some("")` means "unchanged".
fn string_suffix(prev: &CommandArgs, next: &CommandArgs) -> Option<String> {
    let (prev_key, prev_text) = prev.sole_string()?;
    let (next_key, next_text) = next.sole_string()?;
    if prev_key != next_key {
        return None;
    }
    next_text.strip_prefix(prev_text).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn say(text: &str) -> Command {
        Command::new("say", CommandArgs::from(json!({ "text": text })))
    }

    #[test]
    fn first_announcement_is_full() {
        let mut tracker = PartialTracker::new();
        let delta = tracker.update(0, &say("Hel")).unwrap();
        assert!(matches!(delta, PartialDelta::Full { .. }));
    }

    #[test]
    fn string_growth_emits_only_the_suffix() {
        let mut tracker = PartialTracker::new();
        tracker.update(0, &say("Hello"));
        let delta = tracker.update(0, &say("Hello, world")).unwrap();
        assert_eq!(
            delta,
            PartialDelta::Text {
                suffix: ", world".into()
            }
        );
    }

    #[test]
    fn unchanged_partial_is_suppressed() {
        let mut tracker = PartialTracker::new();
        tracker.update(0, &say("Hello"));
        assert!(tracker.update(0, &say("Hello")).is_none());
    }

    #[test]
    fn non_string_change_reemits_full_args() {
        let mut tracker = PartialTracker::new();
        let first = Command::new("move", CommandArgs::from(json!({"x": 1, "y": 2})));
        let second = Command::new("move", CommandArgs::from(json!({"x": 1, "y": 2, "z": 3})));
        tracker.update(0, &first);
        let delta = tracker.update(0, &second).unwrap();
        assert!(matches!(delta, PartialDelta::Full { .. }));
    }

    #[test]
    fn slot_change_resets_the_diff_base() {
        let mut tracker = PartialTracker::new();
        tracker.update(0, &say("Hello"));
        // Same name, compatible prefix, but a different element: no suffix.
        let delta = tracker.update(1, &say("Hello again")).unwrap();
        assert!(matches!(delta, PartialDelta::Full { .. }));
    }

    #[test]
    fn rewritten_string_falls_back_to_full() {
        let mut tracker = PartialTracker::new();
        tracker.update(0, &say("Hello"));
        let delta = tracker.update(0, &say("Goodbye")).unwrap();
        assert!(matches!(delta, PartialDelta::Full { .. }));
    }

    #[test]
    fn finalize_emits_closing_suffix() {
        let mut tracker = PartialTracker::new();
        tracker.update(0, &say("Hel"));
        let delta = tracker.finalize(0, &say("Hello"));
        assert_eq!(delta, PartialDelta::Text { suffix: "lo".into() });
    }

    #[test]
    fn finalize_without_prior_announcement_is_full() {
        let mut tracker = PartialTracker::new();
        let delta = tracker.finalize(0, &say("Hello"));
        assert!(matches!(delta, PartialDelta::Full { .. }));
    }

    #[test]
    fn finalize_retires_the_slot() {
        let mut tracker = PartialTracker::new();
        tracker.update(0, &say("Hel"));
        tracker.finalize(0, &say("Hello"));
        // The next partial starts fresh even on the same slot number.
        let delta = tracker.update(1, &say("Hello there")).unwrap();
        assert!(matches!(delta, PartialDelta::Full { .. }));
    }
}
