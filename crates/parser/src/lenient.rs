//! Lenient prefix scanning.
//!
//! The last-resort parse strategy: walk the buffer as JSON, keep every value
//! that closed cleanly, and reconstruct a best-effort value for the element
//! the stream ended inside of. Truncation (the buffer just stops) is
//! distinguished from invalidity (a character no amount of further input can
//! make legal); only the former carries a tail value.

use serde_json::{Map, Number, Value};

/// Outcome of scanning a whole buffer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScanOutcome {
    /// The top-level structure closed; every element is final.
    Closed { elements: Vec<Value> },

    /// Input ran out mid-structure. `tail` is the reconstructed open
    /// element, when one was far enough along to reconstruct.
    Truncated {
        elements: Vec<Value>,
        tail: Option<Value>,
    },

    /// A syntax error that more input cannot repair. Elements that closed
    /// cleanly before the error are retained.
    Invalid { elements: Vec<Value> },
}

/// Outcome of scanning a single value.
enum ValueOutcome {
    Complete(Value),
    /// Input ran out inside the value. Carries what could be salvaged:
    /// strings keep their decoded prefix, containers keep their closed
    /// entries, half keywords and broken numbers salvage nothing.
    Truncated(Option<Value>),
    Error,
}

enum StringOutcome {
    Complete(String),
    Truncated(String),
}

/// Scan `text` as a command array (or a single top-level object).
pub(crate) fn scan(text: &str) -> ScanOutcome {
    let mut scanner = Scanner::new(text);
    scanner.skip_whitespace();

    match scanner.peek() {
        Some('[') => scanner.scan_top_array(),
        Some('{') => match scanner.scan_value() {
            ValueOutcome::Complete(value) => {
                scanner.skip_whitespace();
                if scanner.at_end() {
                    ScanOutcome::Closed {
                        elements: vec![value],
                    }
                } else {
                    ScanOutcome::Invalid {
                        elements: vec![value],
                    }
                }
            }
            ValueOutcome::Truncated(tail) => ScanOutcome::Truncated {
                elements: Vec::new(),
                tail,
            },
            ValueOutcome::Error => ScanOutcome::Invalid {
                elements: Vec::new(),
            },
        },
        _ => ScanOutcome::Invalid {
            elements: Vec::new(),
        },
    }
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn scan_top_array(&mut self) -> ScanOutcome {
        self.pos += 1; // consume '['
        let mut elements = Vec::new();

        loop {
            self.skip_whitespace();
            if self.at_end() {
                return ScanOutcome::Truncated {
                    elements,
                    tail: None,
                };
            }
            if self.peek() == Some(']') {
                self.pos += 1;
                return ScanOutcome::Closed { elements };
            }

            match self.scan_value() {
                ValueOutcome::Complete(value) => elements.push(value),
                ValueOutcome::Truncated(tail) => {
                    return ScanOutcome::Truncated { elements, tail };
                }
                ValueOutcome::Error => return ScanOutcome::Invalid { elements },
            }

            self.skip_whitespace();
            match self.peek() {
                None => {
                    return ScanOutcome::Truncated {
                        elements,
                        tail: None,
                    };
                }
                Some(',') => {
                    self.pos += 1;
                }
                Some(']') => {
                    self.pos += 1;
                    return ScanOutcome::Closed { elements };
                }
                Some(_) => return ScanOutcome::Invalid { elements },
            }
        }
    }

    fn scan_value(&mut self) -> ValueOutcome {
        self.skip_whitespace();
        match self.peek() {
            None => ValueOutcome::Truncated(None),
            Some('{') => self.scan_object(),
            Some('[') => self.scan_array(),
            Some('"') => match self.scan_string() {
                StringOutcome::Complete(s) => ValueOutcome::Complete(Value::String(s)),
                StringOutcome::Truncated(s) => ValueOutcome::Truncated(Some(Value::String(s))),
            },
            Some('t') | Some('f') | Some('n') => self.scan_keyword(),
            Some('-') | Some('0'..='9') => self.scan_number(),
            Some(_) => ValueOutcome::Error,
        }
    }

    fn scan_object(&mut self) -> ValueOutcome {
        self.pos += 1; // consume '{'
        let mut map = Map::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return ValueOutcome::Truncated(Some(Value::Object(map))),
                Some('}') => {
                    self.pos += 1;
                    return ValueOutcome::Complete(Value::Object(map));
                }
                Some('"') => {}
                Some(_) => return ValueOutcome::Error,
            }

            let key = match self.scan_string() {
                StringOutcome::Complete(key) => key,
                // A half-streamed key is unusable; keep the entries so far.
                StringOutcome::Truncated(_) => {
                    return ValueOutcome::Truncated(Some(Value::Object(map)));
                }
            };

            self.skip_whitespace();
            match self.peek() {
                None => return ValueOutcome::Truncated(Some(Value::Object(map))),
                Some(':') => self.pos += 1,
                Some(_) => return ValueOutcome::Error,
            }

            match self.scan_value() {
                ValueOutcome::Complete(value) => {
                    map.insert(key, value);
                }
                ValueOutcome::Truncated(Some(value)) => {
                    map.insert(key, value);
                    return ValueOutcome::Truncated(Some(Value::Object(map)));
                }
                ValueOutcome::Truncated(None) => {
                    return ValueOutcome::Truncated(Some(Value::Object(map)));
                }
                ValueOutcome::Error => return ValueOutcome::Error,
            }

            self.skip_whitespace();
            match self.peek() {
                None => return ValueOutcome::Truncated(Some(Value::Object(map))),
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return ValueOutcome::Complete(Value::Object(map));
                }
                Some(_) => return ValueOutcome::Error,
            }
        }
    }

    fn scan_array(&mut self) -> ValueOutcome {
        self.pos += 1; // consume '['
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return ValueOutcome::Truncated(Some(Value::Array(items))),
                Some(']') => {
                    self.pos += 1;
                    return ValueOutcome::Complete(Value::Array(items));
                }
                Some(_) => {}
            }

            match self.scan_value() {
                ValueOutcome::Complete(value) => items.push(value),
                ValueOutcome::Truncated(Some(value)) => {
                    items.push(value);
                    return ValueOutcome::Truncated(Some(Value::Array(items)));
                }
                ValueOutcome::Truncated(None) => {
                    return ValueOutcome::Truncated(Some(Value::Array(items)));
                }
                ValueOutcome::Error => return ValueOutcome::Error,
            }

            self.skip_whitespace();
            match self.peek() {
                None => return ValueOutcome::Truncated(Some(Value::Array(items))),
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return ValueOutcome::Complete(Value::Array(items));
                }
                Some(_) => return ValueOutcome::Error,
            }
        }
    }

    /// Decode a string literal, tolerating truncation anywhere: mid-escape,
    /// mid-unicode, or before the closing quote. Raw control characters are
    /// accepted as content.
    fn scan_string(&mut self) -> StringOutcome {
        self.pos += 1; // consume '"'
        let mut out = String::new();

        loop {
            let Some(c) = self.next() else {
                return StringOutcome::Truncated(out);
            };
            match c {
                '"' => return StringOutcome::Complete(out),
                '\\' => {
                    let Some(esc) = self.next() else {
                        return StringOutcome::Truncated(out);
                    };
                    match esc {
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'b' => out.push('\u{0008}'),
                        'f' => out.push('\u{000c}'),
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        '/' => out.push('/'),
                        'u' => {
                            let mut hex = String::new();
                            for _ in 0..4 {
                                let Some(h) = self.next() else {
                                    return StringOutcome::Truncated(out);
                                };
                                hex.push(h);
                            }
                            if let Ok(code) = u32::from_str_radix(&hex, 16) {
                                if let Some(decoded) = char::from_u32(code) {
                                    out.push(decoded);
                                }
                            }
                        }
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn scan_keyword(&mut self) -> ValueOutcome {
        for (keyword, value) in [
            ("true", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("null", Value::Null),
        ] {
            let mut matched = 0;
            for (offset, expected) in keyword.chars().enumerate() {
                match self.chars.get(self.pos + offset) {
                    Some(&c) if c == expected => matched += 1,
                    Some(_) => break,
                    None => {
                        // Buffer ends inside the keyword.
                        if matched > 0 {
                            self.pos = self.chars.len();
                            return ValueOutcome::Truncated(None);
                        }
                        break;
                    }
                }
            }
            if matched == keyword.len() {
                self.pos += matched;
                return ValueOutcome::Complete(value);
            }
        }
        ValueOutcome::Error
    }

    fn scan_number(&mut self) -> ValueOutcome {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some('0'..='9') | Some('-') | Some('+') | Some('.') | Some('e') | Some('E')
        ) {
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();

        if self.at_end() {
            // Might still be growing; salvage it only if it already parses.
            return ValueOutcome::Truncated(parse_number_token(&token));
        }
        match parse_number_token(&token) {
            Some(value) => ValueOutcome::Complete(value),
            None => ValueOutcome::Error,
        }
    }
}

fn parse_number_token(token: &str) -> Option<Value> {
    if let Ok(n) = token.parse::<i64>() {
        return Some(Value::Number(n.into()));
    }
    token
        .parse::<f64>()
        .ok()
        .and_then(|n| Number::from_f64(n).map(Value::Number))
}
