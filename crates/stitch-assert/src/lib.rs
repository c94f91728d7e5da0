//! Independent, permissive scan over the full raw document text that finds
//! every stitch-count assertion that may appear in prose anywhere in the
//! file -- not only at end-of-row. Kept deliberately separate from the
//! strict end-of-row extractor in `stitch-parse`: this pass deduplicates and
//! excludes `increased`/`decreased` phrasing instead of rejecting on
//! `remain` context alone.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// One stitch-count assertion found anywhere in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub line_number: usize,
    pub counts: Vec<i64>,
    pub raw_text: String,
}

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\b").expect("digit run regex is valid"));

fn parse_counts(fragment: &str) -> Vec<i64> {
    let cleaned = fragment.replace('(', " ").replace(')', " ");
    let cleaned = cleaned.replace([',', ';'], " ");
    DIGIT_RUN
        .captures_iter(&cleaned)
        .filter_map(|c| c[1].parse::<i64>().ok())
        .collect()
}

static BRACKETED_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*([\d\s,()]+)\s*\]\s*sts?\b").expect("bracketed list regex is valid")
});

static BRACKETED_FOR_EACH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*([\d\s,()]+)\s*sts?\s+for\s+each[^\]]*\]")
        .expect("bracketed for-each regex is valid")
});

static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(\s*([\d\s,]+?)\s*sts?\s*\)").expect("parenthetical regex is valid")
});

static DASH_TERMINATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[-\x{2013}\x{2014}]\s*([\d\s,()]+)\s*sts?\s*$")
        .expect("dash terminated regex is valid")
});

fn line_excludes_assertion(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("increased") || lower.contains("decreased") || lower.contains("sts remain") || lower.contains("remain on")
}

/// Find every stitch-count assertion in the raw document text, in line
/// order, deduplicated by (line, raw fragment).
pub fn extract_all_stitch_assertions(text: &str) -> Vec<Assertion> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for (idx, line) in text.split('\n').enumerate() {
        if line_excludes_assertion(line) {
            continue;
        }
        let line_number = idx + 1;

        for m in BRACKETED_FOR_EACH.find_iter(line) {
            push_if_new(&mut seen, &mut out, line_number, m.as_str());
        }
        for caps in BRACKETED_LIST.captures_iter(line) {
            let whole = caps.get(0).expect("group 0 always matches");
            push_if_new(&mut seen, &mut out, line_number, whole.as_str());
        }
        for caps in PARENTHETICAL.captures_iter(line) {
            let whole = caps.get(0).expect("group 0 always matches");
            push_if_new(&mut seen, &mut out, line_number, whole.as_str());
        }
        if let Some(m) = DASH_TERMINATED.find(line) {
            push_if_new(&mut seen, &mut out, line_number, m.as_str());
        }
    }

    out
}

fn push_if_new(
    seen: &mut HashSet<(usize, String)>,
    out: &mut Vec<Assertion>,
    line_number: usize,
    raw: &str,
) {
    let key = (line_number, raw.to_string());
    if !seen.insert(key) {
        return;
    }
    out.push(Assertion {
        line_number,
        counts: parse_counts(raw),
        raw_text: raw.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_bracketed_list() {
        let assertions = extract_all_stitch_assertions("After shaping: [56, 60, 66] sts remain on needle for sleeves");
        // excluded: line also contains "remain on"
        assert!(assertions.is_empty());
    }

    #[test]
    fn finds_bracketed_list_without_remain_context() {
        let assertions = extract_all_stitch_assertions("At this point you should have [56, 60, 66] sts.");
        assert_eq!(assertions.len(), 1);
        assert_eq!(assertions[0].counts, vec![56, 60, 66]);
    }

    #[test]
    fn finds_parenthetical() {
        let assertions = extract_all_stitch_assertions("Work across body (108 sts) then begin sleeves.");
        assert_eq!(assertions.len(), 1);
        assert_eq!(assertions[0].counts, vec![108]);
    }

    #[test]
    fn finds_dash_terminated_at_line_end() {
        let assertions = extract_all_stitch_assertions("Continue shaping as established - 108 sts");
        assert_eq!(assertions.len(), 1);
        assert_eq!(assertions[0].counts, vec![108]);
    }

    #[test]
    fn excludes_increased_decreased_phrasing() {
        let assertions = extract_all_stitch_assertions("Stitch count increased to (64) sts over the last 4 rows.");
        assert!(assertions.is_empty());
    }

    #[test]
    fn deduplicates_same_line_same_fragment() {
        let assertions = extract_all_stitch_assertions("At this point you should have [56, 60, 66] sts.\nAt this point you should have [56, 60, 66] sts.");
        assert_eq!(assertions.len(), 2);
        assert_ne!(assertions[0].line_number, assertions[1].line_number);
    }

    #[test]
    fn tracks_line_numbers() {
        let assertions = extract_all_stitch_assertions("line one\nline two\nWork across body (42 sts) here");
        assert_eq!(assertions[0].line_number, 3);
    }
}
