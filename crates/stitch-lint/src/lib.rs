//! Grammar and format linting: two independent, pure-text passes over
//! `Pattern::raw_text`. Neither pass touches `errors`/`warnings` (those are
//! reserved for the stitch-count evaluator) or influences stitch-count
//! arithmetic -- they populate `Pattern::format_issues`/`grammar_issues` only.

use regex::Regex;
use std::sync::LazyLock;
use stitch_model::{Issue, IssueKind, Pattern, Severity};

struct RequiredSection {
    pattern: &'static str,
    label: &'static str,
}

static REQUIRED_SECTIONS: &[RequiredSection] = &[
    RequiredSection { pattern: r"(?i)materials?\s*:", label: "Materials section" },
    RequiredSection { pattern: r"(?i)gauge|tension", label: "Gauge section" },
    RequiredSection {
        pattern: r"(?i)finished\s+measurements?|dimensions?",
        label: "Finished measurements",
    },
    RequiredSection { pattern: r"(?i)abbreviations?", label: "Abbreviations section" },
    RequiredSection {
        pattern: r"(?i)(?:row|rnd|round)\s+\d+",
        label: "Pattern instructions",
    },
];

static REQUIRED_SECTION_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    REQUIRED_SECTIONS
        .iter()
        .map(|s| Regex::new(s.pattern).expect("required section regex is valid"))
        .collect()
});

/// Scans for five required sections and emits a `format`/`warning` issue per
/// missing one.
pub fn check_format(pattern: &Pattern) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (section, regex) in REQUIRED_SECTIONS.iter().zip(REQUIRED_SECTION_REGEXES.iter()) {
        if !regex.is_match(&pattern.raw_text) {
            issues.push(
                Issue::new(IssueKind::Format, format!("Missing: {}", section.label))
                    .with_severity(Severity::Warning),
            );
        }
    }
    issues
}

const COMMON_TYPOS: &[(&str, &str)] = &[
    ("knt", "knit"),
    ("prrl", "purl"),
    ("slp", "slip"),
    ("caston", "cast on"),
    ("bindoff", "bind off"),
    ("yran over", "yarn over"),
    ("k2tg", "k2tog"),
    ("k2 tg", "k2tog"),
    ("yoknit", "yo, knit"),
    ("stiches", "stitches"),
    ("guage", "gauge"),
    ("stockingette", "stockinette"),
    ("gague", "gauge"),
    ("incease", "increase"),
    ("decease", "decrease"),
    ("repeatfrom", "repeat from"),
];

const US_UK_TERMS: &[(&str, &str)] = &[
    ("tension", "gauge"),
    ("moss stitch", "seed stitch"),
    ("stocking stitch", "stockinette"),
    ("colour", "color"),
    ("cast off", "bind off"),
];

fn word_boundary_regex(word: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).expect("typo regex is valid")
}

static TYPO_REGEXES: LazyLock<Vec<(Regex, &'static str, &'static str)>> = LazyLock::new(|| {
    COMMON_TYPOS
        .iter()
        .map(|(typo, correction)| (word_boundary_regex(typo), *typo, *correction))
        .collect()
});

static KNIT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bknit\b").expect("knit word regex is valid"));
static KNIT_ABBR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bk\d").expect("knit abbr regex is valid"));
static PURL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpurl\b").expect("purl word regex is valid"));
static PURL_ABBR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bp\d").expect("purl abbr regex is valid"));

fn check_bracket_balance(line: &str, line_number: usize, issues: &mut Vec<Issue>) {
    for (open, close, name) in [('(', ')', "parentheses"), ('[', ']', "brackets"), ('{', '}', "braces")] {
        let opens = line.matches(open).count();
        let closes = line.matches(close).count();
        if opens != closes {
            issues.push(
                Issue::new(IssueKind::Grammar, format!("Unbalanced {name}"))
                    .with_severity(Severity::Warning)
                    .with_line(line_number)
                    .with_raw_text(line.trim().to_string()),
            );
        }
    }
}

fn check_abbreviation_consistency(line: &str, line_number: usize, issues: &mut Vec<Issue>) {
    if KNIT_WORD.is_match(line) && KNIT_ABBR.is_match(line) {
        issues.push(
            Issue::new(IssueKind::Terminology, "Mixed use of \"knit\" and \"k\" abbreviation in same line")
                .with_severity(Severity::Info)
                .with_line(line_number)
                .with_raw_text(line.trim().to_string()),
        );
    }
    if PURL_WORD.is_match(line) && PURL_ABBR.is_match(line) {
        issues.push(
            Issue::new(IssueKind::Terminology, "Mixed use of \"purl\" and \"p\" abbreviation in same line")
                .with_severity(Severity::Info)
                .with_line(line_number)
                .with_raw_text(line.trim().to_string()),
        );
    }
}

/// Scans line by line for typos, US/UK terminology, unbalanced brackets, and
/// mixed full-word/abbreviation usage. Returns `(grammar_issues,
/// terminology_issues)`.
pub fn check_grammar(pattern: &Pattern) -> (Vec<Issue>, Vec<Issue>) {
    let mut grammar = Vec::new();
    let mut terminology = Vec::new();

    for (idx, line) in pattern.raw_text.split('\n').enumerate() {
        let line_number = idx + 1;

        for (regex, typo, correction) in TYPO_REGEXES.iter() {
            if regex.is_match(line) {
                grammar.push(
                    Issue::new(
                        IssueKind::Grammar,
                        format!("Possible typo: \"{typo}\" \u{2192} did you mean \"{correction}\"?"),
                    )
                    .with_severity(Severity::Warning)
                    .with_line(line_number)
                    .with_raw_text(line.trim().to_string()),
                );
            }
        }

        for (uk_term, us_term) in US_UK_TERMS {
            if line.to_lowercase().contains(uk_term) {
                terminology.push(
                    Issue::new(
                        IssueKind::Terminology,
                        format!("UK term \"{uk_term}\" found \u{2014} US equivalent is \"{us_term}\""),
                    )
                    .with_severity(Severity::Info)
                    .with_line(line_number)
                    .with_raw_text(line.trim().to_string()),
                );
            }
        }

        check_bracket_balance(line, line_number, &mut grammar);
        check_abbreviation_consistency(line, line_number, &mut terminology);
    }

    (grammar, terminology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_all_missing_required_sections() {
        let pattern = Pattern::new("Row 1: k2, p2");
        let issues = check_format(&pattern);
        assert_eq!(issues.len(), 4);
        assert!(issues.iter().all(|i| i.kind == IssueKind::Format));
    }

    #[test]
    fn complete_pattern_has_no_format_issues() {
        let text = "Materials: worsted yarn\nGauge: 20 sts = 4 in\nFinished measurements: 36 in\nAbbreviations: k, p\nRow 1: k2, p2";
        let pattern = Pattern::new(text);
        assert!(check_format(&pattern).is_empty());
    }

    #[test]
    fn detects_common_typos() {
        let pattern = Pattern::new("Row 1: knt2, prrl2");
        let (grammar, _) = check_grammar(&pattern);
        assert!(grammar.iter().any(|i| i.message.contains("knt")));
        assert!(grammar.iter().any(|i| i.message.contains("prrl")));
    }

    #[test]
    fn detects_uk_terminology() {
        let pattern = Pattern::new("Tension: 20 sts = 4 in");
        let (_, terminology) = check_grammar(&pattern);
        assert!(terminology.iter().any(|i| i.message.contains("tension")));
    }

    #[test]
    fn detects_unbalanced_brackets() {
        let pattern = Pattern::new("Row 1: (k2, p2");
        let (grammar, _) = check_grammar(&pattern);
        assert!(grammar.iter().any(|i| i.message.contains("Unbalanced parentheses")));
    }

    #[test]
    fn detects_mixed_knit_abbreviation() {
        let pattern = Pattern::new("Row 1: knit across, k2tog");
        let (_, terminology) = check_grammar(&pattern);
        assert!(terminology.iter().any(|i| i.message.contains("knit")));
    }

    #[test]
    fn balanced_brackets_emit_nothing() {
        let pattern = Pattern::new("Row 1: (k2, p2)");
        let (grammar, _) = check_grammar(&pattern);
        assert!(grammar.is_empty());
    }
}
