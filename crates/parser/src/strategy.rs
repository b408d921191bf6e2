//! Parse recovery strategies.
//!
//! Each strategy is a pure function from (raw-block-rewritten) buffer text to
//! an optional batch of wire elements. They are tried in order and the first
//! success wins; every strategy after the first exists because real model
//! output violates strict JSON in a specific, recurring way.

use serde_json::Value;

use crate::lenient::{self, ScanOutcome};

/// Wire-level result of a strategy: closed elements plus the still-open
/// trailing element, before any command-shape filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatch {
    pub elements: Vec<Value>,
    pub partial: Option<Value>,
}

pub type Strategy = fn(&str) -> Option<RawBatch>;

/// The recovery ladder, in attempt order.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("strict", strict),
    ("merge_arrays", merge_arrays),
    ("escape_repair", escape_repair),
    ("lenient", lenient_prefix),
];

/// Strict JSON parse. A single top-level object is accepted as a
/// one-element batch.
pub fn strict(text: &str) -> Option<RawBatch> {
    parse_closed(text)
}

/// Models sometimes emit two command lists back to back: `[...] [...]`.
/// Join them into one array (outside string literals only) and retry.
pub fn merge_arrays(text: &str) -> Option<RawBatch> {
    let joined = join_adjacent_arrays(text)?;
    parse_closed(&joined)
}

/// Escape raw control characters and stray interior quotes inside string
/// literals, then retry. A quote is stray when the next non-whitespace
/// character could not legally follow a closed string.
pub fn escape_repair(text: &str) -> Option<RawBatch> {
    let repaired = escape_stray_characters(text)?;
    parse_closed(&repaired)
}

/// Last resort: keep the unambiguous structured prefix. Whatever element the
/// scan ends inside of (or, when truncated between elements, the last element
/// it yielded) is reported as the open partial.
pub fn lenient_prefix(text: &str) -> Option<RawBatch> {
    match lenient::scan(text) {
        ScanOutcome::Closed { elements } => Some(RawBatch {
            elements,
            partial: None,
        }),
        ScanOutcome::Truncated { mut elements, tail } => {
            let partial = tail.or_else(|| elements.pop());
            Some(RawBatch { elements, partial })
        }
        ScanOutcome::Invalid { elements } => Some(RawBatch {
            elements,
            partial: None,
        }),
    }
}

fn parse_closed(text: &str) -> Option<RawBatch> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(elements)) => Some(RawBatch {
            elements,
            partial: None,
        }),
        Ok(Value::Object(map)) => Some(RawBatch {
            elements: vec![Value::Object(map)],
            partial: None,
        }),
        _ => None,
    }
}

/// Rewrite `] ws [` at the top level into `,`, fusing adjacent arrays.
/// Returns `None` when there was nothing to fuse.
fn join_adjacent_arrays(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut joined = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '[' | '{' => {
                depth += 1;
                out.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                out.push(c);
            }
            ']' => {
                if depth == 1 {
                    // Closing the top array: fuse if another one opens next.
                    let mut lookahead = chars.clone();
                    let mut skipped = 0;
                    let mut fuse = false;
                    while let Some(&next) = lookahead.peek() {
                        if next.is_whitespace() {
                            lookahead.next();
                            skipped += 1;
                        } else {
                            fuse = next == '[';
                            break;
                        }
                    }
                    if fuse {
                        for _ in 0..=skipped {
                            chars.next();
                        }
                        out.push(',');
                        joined = true;
                        continue;
                    }
                }
                depth = depth.saturating_sub(1);
                out.push(c);
            }
            other => out.push(other),
        }
    }

    joined.then_some(out)
}

/// Escape bare control characters and stray quotes inside string literals.
/// Returns `None` when the text needed no repair.
fn escape_stray_characters(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut changed = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '\\' => {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            '"' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let closes = j >= chars.len() || matches!(chars[j], ',' | '}' | ']' | ':');
                if closes {
                    in_string = false;
                    out.push(c);
                } else {
                    out.push_str("\\\"");
                    changed = true;
                }
                i += 1;
            }
            '\n' => {
                out.push_str("\\n");
                changed = true;
                i += 1;
            }
            '\r' => {
                out.push_str("\\r");
                changed = true;
                i += 1;
            }
            '\t' => {
                out.push_str("\\t");
                changed = true;
                i += 1;
            }
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
                changed = true;
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    changed.then_some(out)
}
