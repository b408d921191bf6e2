//! Command and argument value objects.
//!
//! A command is the unit of action in a turn. On the wire it is a single-key
//! JSON object inside the model's command array: the key names the operation,
//! the value carries the arguments. Arguments arrive in one of three shapes
//! and every dispatch site pattern-matches exactly once.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a command's arguments arrived on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandArgs {
    /// A JSON array of positional values.
    Positional(Vec<Value>),

    /// A JSON object of named values. Insertion order is preserved so echoes
    /// reproduce what the model wrote.
    Named(Map<String, Value>),

    /// A bare scalar (string, number, bool, null).
    Single(Value),
}

impl CommandArgs {
    /// True when there is nothing of substance to pass to a handler:
    /// a null or whitespace-only scalar, an empty collection, or a
    /// collection whose every value is itself blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Positional(items) => items.iter().all(value_is_blank),
            Self::Named(map) => map.values().all(value_is_blank),
            Self::Single(value) => value_is_blank(value),
        }
    }

    /// The arguments back in plain JSON form.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Positional(items) => Value::Array(items.clone()),
            Self::Named(map) => Value::Object(map.clone()),
            Self::Single(value) => value.clone(),
        }
    }

    /// Borrow the single named string argument, if that is the exact shape.
    ///
    /// Used by the partial-delta tracker to detect append-only growth of a
    /// streamed string argument.
    pub fn sole_string(&self) -> Option<(Option<&str>, &str)> {
        match self {
            Self::Named(map) if map.len() == 1 => {
                let (key, value) = map.iter().next()?;
                Some((Some(key.as_str()), value.as_str()?))
            }
            Self::Single(Value::String(s)) => Some((None, s.as_str())),
            Self::Positional(items) if items.len() == 1 => {
                Some((None, items.first()?.as_str()?))
            }
            _ => None,
        }
    }
}

impl From<Value> for CommandArgs {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Positional(items),
            Value::Object(map) => Self::Named(map),
            other => Self::Single(other),
        }
    }
}

fn value_is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(value_is_blank),
        Value::Object(map) => map.values().all(value_is_blank),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// A single parsed command: operation name plus arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub args: CommandArgs,
}

impl Command {
    pub fn new(name: impl Into<String>, args: CommandArgs) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Interpret one element of the wire array as a command.
    ///
    /// Returns `None` unless the element is an object with exactly one key.
    /// Anything else (a bare string, a multi-key object) is not a command
    /// and callers drop it rather than guess.
    pub fn from_element(element: &Value) -> Option<Self> {
        let obj = element.as_object()?;
        if obj.len() != 1 {
            return None;
        }
        let (name, args) = obj.iter().next()?;
        Some(Self {
            name: name.clone(),
            args: CommandArgs::from(args.clone()),
        })
    }

    /// Re-serialize into the wire shape: `{"name": args}`.
    pub fn to_element(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(self.name.clone(), self.args.to_value());
        Value::Object(obj)
    }
}

/// The result of one parse pass over the turn buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBatch {
    /// Commands whose closing brace has been seen. Safe to execute.
    pub complete: Vec<Command>,

    /// The trailing, still-open command, if the buffer ends mid-element.
    /// Never executed, only surfaced for live progress display.
    pub partial: Option<Command>,
}

impl ParsedBatch {
    pub fn is_empty(&self) -> bool {
        self.complete.is_empty() && self.partial.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn element_with_one_key_is_a_command() {
        let cmd = Command::from_element(&json!({"say": {"text": "hi"}})).unwrap();
        assert_eq!(cmd.name, "say");
        assert!(matches!(cmd.args, CommandArgs::Named(_)));
    }

    #[test]
    fn element_with_two_keys_is_rejected() {
        assert!(Command::from_element(&json!({"say": "hi", "also": "no"})).is_none());
        assert!(Command::from_element(&json!("just a string")).is_none());
        assert!(Command::from_element(&json!({})).is_none());
    }

    #[test]
    fn args_shapes_deserialize_untagged() {
        let named: CommandArgs = serde_json::from_value(json!({"a": 1})).unwrap();
        assert!(matches!(named, CommandArgs::Named(_)));

        let positional: CommandArgs = serde_json::from_value(json!([1, 2])).unwrap();
        assert!(matches!(positional, CommandArgs::Positional(_)));

        let single: CommandArgs = serde_json::from_value(json!("scalar")).unwrap();
        assert!(matches!(single, CommandArgs::Single(_)));
    }

    #[test]
    fn blankness_covers_all_shapes() {
        assert!(CommandArgs::Single(Value::Null).is_blank());
        assert!(CommandArgs::Single(json!("   ")).is_blank());
        assert!(CommandArgs::Positional(vec![]).is_blank());
        assert!(CommandArgs::Named(Map::new()).is_blank());
        assert!(CommandArgs::from(json!({"text": ""})).is_blank());
        assert!(CommandArgs::from(json!(["", null])).is_blank());

        assert!(!CommandArgs::Single(json!(0)).is_blank());
        assert!(!CommandArgs::Single(json!(false)).is_blank());
        assert!(!CommandArgs::from(json!({"text": "hi"})).is_blank());
        assert!(!CommandArgs::from(json!(["", "x"])).is_blank());
    }

    #[test]
    fn sole_string_matches_only_single_string_shapes() {
        let named = CommandArgs::from(json!({"text": "hello"}));
        assert_eq!(named.sole_string(), Some((Some("text"), "hello")));

        let single = CommandArgs::from(json!("hello"));
        assert_eq!(single.sole_string(), Some((None, "hello")));

        let positional = CommandArgs::from(json!(["hello"]));
        assert_eq!(positional.sole_string(), Some((None, "hello")));

        assert!(CommandArgs::from(json!({"a": "x", "b": "y"})).sole_string().is_none());
        assert!(CommandArgs::from(json!({"n": 4})).sole_string().is_none());
    }

    #[test]
    fn wire_roundtrip_preserves_key_order() {
        let cmd = Command::from_element(&json!({"edit": {"path": "a.txt", "content": "x"}})).unwrap();
        let element = cmd.to_element();
        assert_eq!(
            serde_json::to_string(&element).unwrap(),
            r#"{"edit":{"path":"a.txt","content":"x"}}"#
        );
    }
}
