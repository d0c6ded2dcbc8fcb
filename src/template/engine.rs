//! Directive expansion engine.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::dataset::{Dataset, Namespace};

lazy_static! {
    static ref COUNT_RE: Regex = Regex::new(r"\{count(\d+)?\}").unwrap();
    static ref EMOJI_RE: Regex = Regex::new(r"\{emoji:([\w.]+)\}").unwrap();
    static ref DATA_RE: Regex = Regex::new(r"\{data:([\w.]+)\}").unwrap();
}

/// Stand-in for an escaped closing brace (`\}`) while directives are scanned.
///
/// A private-use scalar keeps escaped braces from terminating a repeat body;
/// it is restored to a literal `}` as the very last step.
const BRACE_SENTINEL: &str = "\u{e000}";

/// Expands directives in textual assets against a loaded [`Dataset`].
///
/// `expand` is total: it never fails and never mutates its input. Directives
/// that cannot be parsed or resolved are emitted verbatim.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    dataset: Arc<Dataset>,
}

impl TemplateEngine {
    /// Create an engine over the given dataset.
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    /// The dataset this engine resolves variable directives against.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Expand all directives in `text`.
    ///
    /// Stages run in a fixed order: escaped braces are protected, repeat
    /// directives are unrolled (innermost first), variable directives are
    /// resolved, and escaped braces are restored.
    pub fn expand(&self, text: &str) -> String {
        let protected = text.replace("\\}", BRACE_SENTINEL);
        let unrolled = expand_repeats(&protected);
        let substituted = self.substitute_variables(&unrolled);
        substituted.replace(BRACE_SENTINEL, "}")
    }

    /// Resolve `{emoji:...}` and `{data:...}` directives.
    ///
    /// Unresolvable directives are kept verbatim so authors can spot them.
    fn substitute_variables(&self, text: &str) -> String {
        let with_emoji = EMOJI_RE.replace_all(text, |caps: &Captures<'_>| {
            self.dataset
                .resolve(Namespace::Emoji, &caps[1])
                .unwrap_or_else(|| caps[0].to_string())
        });
        DATA_RE
            .replace_all(&with_emoji, |caps: &Captures<'_>| {
                self.dataset
                    .resolve(Namespace::Data, &caps[1])
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Body scope being unrolled; parent state is restored when it closes.
struct Frame {
    times: usize,
    /// Cursor position in the input after the directive's closing brace
    resume: usize,
    /// Scan bound of the enclosing scope
    parent_limit: usize,
    /// Output accumulated by the enclosing scope
    out: String,
}

/// Unroll `{repeatN:body}` directives.
///
/// Scans iteratively with an explicit frame stack so adversarial nesting
/// depth cannot exhaust the call stack. Inner repeats are fully expanded
/// before the enclosing body is unrolled, and `{count}` substitution runs on
/// each unrolled copy independently; `{count}` outside a repeat body is left
/// alone.
fn expand_repeats(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut pos = 0;
    let mut limit = bytes.len();

    loop {
        if pos >= limit {
            // Current scope is exhausted: unroll it into the parent, or stop
            // when the top-level scope closes.
            match stack.pop() {
                Some(frame) => {
                    let body = std::mem::replace(&mut out, frame.out);
                    for index in 0..frame.times {
                        out.push_str(&apply_count(&body, index));
                    }
                    pos = frame.resume;
                    limit = frame.parent_limit;
                }
                None => break,
            }
            continue;
        }

        if bytes[pos] != b'{' {
            // Copy the literal run up to the next opening brace.
            let next = text[pos..limit]
                .find('{')
                .map_or(limit, |offset| pos + offset);
            out.push_str(&text[pos..next]);
            pos = next;
            continue;
        }

        if let Some((times, body_start, end)) = parse_repeat(text, pos, limit) {
            stack.push(Frame {
                times,
                resume: end + 1,
                parent_limit: limit,
                out: std::mem::take(&mut out),
            });
            pos = body_start;
            limit = end;
            continue;
        }

        // Not a well-formed repeat opener: the brace is literal text and
        // scanning resumes one character later.
        out.push('{');
        pos += 1;
    }

    out
}

/// Parse a `{repeatN:` opener at `start`, returning `(N, body_start, end)`
/// where `end` is the matching closing brace.
///
/// `None` means the brace is literal: the keyword does not match, the digit
/// run is not followed by `:`, the count does not fit, or no closing brace
/// exists. An empty digit run is a valid count of zero.
fn parse_repeat(text: &str, start: usize, limit: usize) -> Option<(usize, usize, usize)> {
    const OPENER: &str = "{repeat";

    if !text[start..limit].starts_with(OPENER) {
        return None;
    }

    let bytes = text.as_bytes();
    let digits_start = start + OPENER.len();
    let mut cursor = digits_start;
    while cursor < limit && bytes[cursor].is_ascii_digit() {
        cursor += 1;
    }
    if cursor >= limit || bytes[cursor] != b':' {
        return None;
    }

    let digits = &text[digits_start..cursor];
    let times = if digits.is_empty() {
        0
    } else {
        digits.parse::<usize>().ok()?
    };

    let end = find_closing_brace(bytes, start, limit)?;
    Some((times, cursor + 1, end))
}

/// Find the brace closing the directive opened at `start`, counting nesting
/// depth so braces inside the body do not terminate it early.
fn find_closing_brace(bytes: &[u8], start: usize, limit: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (index, byte) in bytes.iter().enumerate().take(limit).skip(start) {
        match *byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Replace `{count}` / `{countS}` in one unrolled copy with `S + index`.
fn apply_count(text: &str, index: usize) -> String {
    COUNT_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let start = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .unwrap_or(0);
            start.saturating_add(index).to_string()
        })
        .into_owned()
}
