//! Raw-block preprocessing.
//!
//! Models emit multi-line string arguments between `START_RAW` and `END_RAW`
//! sentinels so they never have to escape code. This pass rewrites each
//! sentinel-delimited region into a proper JSON string literal before any
//! parse strategy runs. An open block whose end sentinel has not arrived yet
//! is rewritten into an *unterminated* string literal: strict parsing keeps
//! failing on it while the lenient pass can still surface the text typed so
//! far.

use serde_json::Value;

const START: &str = "START_RAW";
const END: &str = "\nEND_RAW";

/// Rewrite every raw block in `input` into a JSON string literal.
///
/// Blocks are rewritten left to right and never nest: the first `END_RAW`
/// after a start sentinel closes it. A `START_RAW` token not followed by a
/// newline is ordinary text and is left alone.
pub fn rewrite_raw_blocks(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    loop {
        let Some(at) = rest.find(START) else {
            out.push_str(rest);
            break;
        };

        out.push_str(&rest[..at]);
        let after = &rest[at + START.len()..];

        if after.is_empty() {
            // The opening sentinel is the last thing in the buffer: the
            // block has begun but holds no content yet.
            out.push('"');
            break;
        }

        if !after.starts_with('\n') {
            // Not a sentinel, just text that happens to contain the token.
            out.push_str(START);
            rest = after;
            continue;
        }

        let content_and_more = &after[1..];
        match content_and_more.find(END) {
            Some(end_at) => {
                out.push_str(&escape(&content_and_more[..end_at]));
                rest = &content_and_more[end_at + END.len()..];
            }
            None => {
                // Unterminated: everything that remains is block content,
                // minus any tail that could still grow into the end
                // sentinel.
                let content = trim_partial_end_sentinel(content_and_more);
                out.push_str(&escape_unterminated(content));
                break;
            }
        }
    }

    out
}

/// Drop a trailing fragment that is a prefix of `\nEND_RAW`, so a half
/// streamed end sentinel never flashes up as literal content.
fn trim_partial_end_sentinel(content: &str) -> &str {
    for keep in (1..=END.len().min(content.len())).rev() {
        let split = content.len() - keep;
        if content.is_char_boundary(split) && END.starts_with(&content[split..]) {
            return &content[..split];
        }
    }
    content
}

fn escape(content: &str) -> String {
    Value::String(content.to_string()).to_string()
}

fn escape_unterminated(content: &str) -> String {
    let mut quoted = escape(content);
    quoted.pop();
    quoted
}
