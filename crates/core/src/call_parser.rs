//! Extracts tool invocations embedded in model output.
//!
//! A call marker looks like `/tool:<name>{<key>: <value>, <key>: <value>}`.
//! The name consists of ASCII letters, digits and underscores, and the body
//! cannot contain a closing brace. Values may contain commas and colons: the
//! body is only split at commas that are followed by `<identifier>:`, and
//! each pair is split at its first colon.
//!
//! Markers without any `key: value` pair are not calls and are skipped
//! silently.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::tool::ToolArgs;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/tool:([A-Za-z0-9_]+)\{([^}]*)\}").unwrap());

static PAIR_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*[A-Za-z0-9_]+\s*:").unwrap());

/// A tool invocation found in a text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCall {
    /// Name of the tool.
    pub name: String,
    /// Arguments of the call.
    pub args: ToolArgs,
    /// Byte range of the whole marker in the parsed text.
    pub span: Range<usize>,
}

/// Returns all tool calls in `text`, in the order they appear.
pub fn parse_tool_calls(text: &str) -> Vec<ToolCall> {
    MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let (Some(whole), Some(name), Some(body)) =
                (caps.get(0), caps.get(1), caps.get(2))
            else {
                return None;
            };
            let args = parse_args(body.as_str());
            if args.is_empty() {
                trace!("skipping marker without arguments: {}", whole.as_str());
                return None;
            }
            Some(ToolCall {
                name: name.as_str().to_owned(),
                args,
                span: whole.range(),
            })
        })
        .collect()
}

fn parse_args(body: &str) -> ToolArgs {
    let mut args = ToolArgs::new();
    if body.trim().is_empty() {
        return args;
    }

    let mut pairs = Vec::new();
    let mut start = 0;
    for sep in PAIR_SEPARATOR.find_iter(body) {
        pairs.push(&body[start..sep.start()]);
        // Skip the comma itself, the key belongs to the next pair.
        start = sep.start() + 1;
    }
    pairs.push(&body[start..]);

    for pair in pairs {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        args.insert(key.to_owned(), value.trim().to_owned());
    }
    args
}

/// Replaces the byte ranges of `text` with the paired strings.
///
/// Ranges must not overlap, they may be given in any order.
pub fn replace_spans(
    text: &str,
    mut replacements: Vec<(Range<usize>, String)>,
) -> String {
    replacements.sort_by_key(|(span, _)| span.start);

    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    for (span, replacement) in replacements {
        result.push_str(&text[cursor..span.start]);
        result.push_str(&replacement);
        cursor = span.end;
    }
    result.push_str(&text[cursor..]);
    result
}
