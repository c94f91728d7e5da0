//! Text normalization: canonical line endings, collapsed blank-line runs, and
//! soft-wrap continuation merging.
//!
//! The three passes run in a fixed order (`canonicalize_newlines` ->
//! `collapse_blank_runs` -> `merge_continuations`) because continuation
//! detection looks at adjacent lines and is only meaningful once line endings
//! are uniform.

use regex::Regex;
use std::sync::LazyLock;

/// Anchored, case-insensitive matcher for a line that starts a new logical
/// block and therefore can never be a continuation of the previous line.
static BLOCK_STARTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:row\b|rnd\b|round\b|next\s+(?:row|rnd|round)\b|co\b|cast\s*on\b|sizes?\s*:|gauge\s*:|materials?\s*:|finished\s+measurements?\s*:|abbreviations?\s*:|notes?\s*:|\d+\.|[#=])",
    )
    .expect("block starter regex is valid")
});

/// Replace CRLF and bare CR with LF.
pub fn canonicalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Collapse runs of 3 or more newlines down to exactly 2 (one blank line).
pub fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newline_run = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(ch);
            }
        } else {
            newline_run = 0;
            out.push(ch);
        }
    }
    out
}

fn ends_with_terminal_punctuation(line: &str) -> bool {
    matches!(line.trim_end().chars().last(), Some('.') | Some('?') | Some('!') | Some(':'))
}

fn starts_new_block(line: &str) -> bool {
    BLOCK_STARTER.is_match(line.trim_start())
}

/// A line is a continuation of the previous one iff: the previous line does
/// not end in `.`, `?`, `!`, or `:`; the next line is not blank; and the next
/// line does not begin with a recognized block starter.
fn is_continuation(prev: &str, next: &str) -> bool {
    let prev_trimmed = prev.trim_end();
    if prev_trimmed.is_empty() || next.trim().is_empty() {
        return false;
    }
    if ends_with_terminal_punctuation(prev_trimmed) {
        return false;
    }
    !starts_new_block(next)
}

/// Merge soft-wrapped continuation lines in a single left-to-right,
/// greedy-joining pass.
pub fn merge_continuations(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in text.split('\n') {
        let merged = out
            .last()
            .is_some_and(|last| is_continuation(last, line));
        if merged {
            let last = out.last_mut().expect("checked above");
            last.push(' ');
            last.push_str(line.trim_start());
        } else {
            out.push(line.to_string());
        }
    }
    out.join("\n")
}

/// Run the full normalizer pipeline: canonicalize newlines, collapse blank
/// runs, then merge continuations.
pub fn normalize(text: &str) -> String {
    let text = canonicalize_newlines(text);
    let text = collapse_blank_runs(&text);
    merge_continuations(&text)
}
