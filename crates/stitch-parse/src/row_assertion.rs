//! The strict end-of-row stitch-count extractor. Kept deliberately separate
//! from the document-wide extractor in `stitch-assert`: this one only looks
//! at a single row's own instruction text and rejects anything describing a
//! pre-row count rather than the row's result.

use crate::sizes::parse_multi_size_values;
use regex::Regex;
use std::sync::LazyLock;

static DASH_TRAILING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[-\x{2013}\x{2014}]\s*([\d\s,()]+)\s*sts?\.?\s*$")
        .expect("dash assertion regex is valid")
});

static PAREN_TRAILING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(\s*([\d\s,]+)\s*sts?\s*\)\s*$").expect("paren assertion regex is valid")
});

/// Extract the stated ending stitch count(s) from one row's instruction text,
/// or `None` if no trailing assertion is present (or it's disqualified).
pub fn extract_end_of_row_count(instruction_text: &str) -> Option<Vec<i64>> {
    let lower = instruction_text.to_lowercase();
    if lower.contains("sts remain") || lower.contains("remain on") {
        return None;
    }

    if let Some(caps) = DASH_TRAILING.captures(instruction_text) {
        return Some(parse_multi_size_values(&caps[1]));
    }

    if let Some(m) = PAREN_TRAILING.find(instruction_text) {
        let cutoff = instruction_text.len().saturating_sub(55);
        if m.start() >= cutoff {
            let caps = PAREN_TRAILING
                .captures(instruction_text)
                .expect("find succeeded above");
            return Some(parse_multi_size_values(&caps[1]));
        }
    }

    None
}
