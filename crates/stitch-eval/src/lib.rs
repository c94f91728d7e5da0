//! Simulates a `Pattern` arithmetically across every declared size, filling
//! `calculated_sts` on every row and appending structured `Issue`s for
//! mismatches, undivisible repeats, and cross-row/document-wide
//! inconsistencies.

mod repeat;

use std::collections::BTreeMap;
use stitch_model::{Issue, IssueKind, OpKind, Pattern, Row, Section, Severity};
use tracing::{debug, warn};

fn is_divide_or_leftover_message(message: &str) -> bool {
    message.contains("does not divide evenly") || message.contains("leftover")
}

/// Result of evaluating one row for one size.
struct RowOutcome {
    ending: i64,
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn evaluate_row(row: &Row, starting: i64, size: &str) -> RowOutcome {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if row.is_repeat_ref {
        return RowOutcome { ending: starting, errors, warnings };
    }
    if let Some(extra) = row.cast_on_extra {
        return RowOutcome { ending: starting + extra, errors, warnings };
    }
    if row.operations.iter().any(|op| op.kind == OpKind::WorkEven) {
        return RowOutcome { ending: starting, errors, warnings };
    }

    let mut net_change: i64 = row.operations.iter().map(|op| op.total_effect()).sum();
    let sts_accounted: i64 = row.operations.iter().map(|op| op.total_consumed()).sum();
    let mut remaining = starting - sts_accounted;

    for block in &row.repeat_blocks {
        let outcome = repeat::evaluate_repeat_block(block, remaining);
        net_change += outcome.net_change;
        remaining = repeat::remaining_after(block, remaining);

        if let Some(message) = outcome.message {
            if is_divide_or_leftover_message(&message) {
                warnings.push(message);
            } else {
                errors.push(message);
            }
        }
    }

    let mut ending = starting + net_change;

    if row.number == Some(0) {
        if let Some(expected) = row.expected_sts.as_ref().and_then(|m| m.get(size)) {
            ending = *expected;
        }
        return RowOutcome { ending: ending.max(0), errors, warnings };
    }

    if let Some(expected) = row.expected_sts.as_ref().and_then(|m| m.get(size)).copied() {
        if expected == starting && net_change != 0 {
            // Stated count is the pre-row count, not the result.
        } else if net_change == 0 && expected < ending {
            // Stale assertion from before a prior increase round.
        } else if ending != expected {
            let message = match net_change.cmp(&0) {
                std::cmp::Ordering::Greater => format!(
                    "Stitch count mismatch: calculated {ending} sts (includes +{net_change} from increases in this row), pattern states {expected} sts — pattern may need updating."
                ),
                std::cmp::Ordering::Less => format!(
                    "Stitch count mismatch: calculated {ending} sts (includes {net_change} from decreases in this row), pattern states {expected} sts"
                ),
                std::cmp::Ordering::Equal => format!(
                    "Stitch count mismatch: calculated {ending} sts, pattern states {expected} sts"
                ),
            };
            errors.push(message);
        }
    }

    RowOutcome { ending: ending.max(0), errors, warnings }
}

fn row_label(row: &Row) -> String {
    match row.number {
        Some(n) => format!("Row {n}"),
        None => "Instruction".to_string(),
    }
}

fn evaluate_sections_for_size(sections: &mut [Section], size: &str, start: i64, errors: &mut Vec<Issue>, warnings: &mut Vec<Issue>) {
    let mut current = start;
    for section in sections.iter_mut() {
        for row in section.rows.iter_mut() {
            let outcome = evaluate_row(row, current, size);

            row.calculated_sts
                .get_or_insert_with(BTreeMap::new)
                .insert(size.to_string(), outcome.ending);

            debug!(target: "stitch_eval", row = ?row.number, size, ending = outcome.ending, "eval.row");

            if row.number == Some(0) {
                if let Some(expected) = row.expected_sts.as_ref().and_then(|m| m.get(size)).copied() {
                    row.calculated_sts.as_mut().expect("just inserted").insert(size.to_string(), expected);
                    current = expected;
                    continue;
                }
            }

            let label = row_label(row);
            for err in &outcome.errors {
                warn!(target: "stitch_eval", row = ?row.number, size, message = %err, "eval.issue");
                errors.push(
                    Issue::new(IssueKind::StitchCount, err.clone())
                        .with_severity(Severity::Error)
                        .with_size(size)
                        .with_row_label(label.clone())
                        .with_raw_text(row.raw_text.clone())
                        .maybe_row(row.number),
                );
                row.errors.push(format!("[{size}] {err}"));
            }
            for w in &outcome.warnings {
                warnings.push(
                    Issue::new(IssueKind::StitchCountWarning, w.clone())
                        .with_severity(Severity::Warning)
                        .with_size(size)
                        .with_row_label(label.clone())
                        .with_raw_text(row.raw_text.clone())
                        .maybe_row(row.number),
                );
                row.warnings.push(format!("[{size}] {w}"));
            }

            current = outcome.ending;
        }
    }
}

fn check_cross_row_consistency(sections: &[Section], sizes: &[String], warnings: &mut Vec<Issue>) {
    for size in sizes {
        let mut prev: Option<&Row> = None;
        for section in sections {
            for row in &section.rows {
                if row.is_repeat_ref {
                    continue;
                }
                if let Some(prev_row) = prev {
                    if let (Some(prev_sts), Some(curr_sts)) = (&prev_row.calculated_sts, &row.calculated_sts) {
                        let prev_end = prev_sts.get(size).copied().unwrap_or(0);
                        let curr_end = curr_sts.get(size).copied().unwrap_or(0);
                        let has_expected = row.expected_sts.as_ref().is_some_and(|m| m.contains_key(size));
                        if !has_expected
                            && row.operations.is_empty()
                            && row.repeat_blocks.is_empty()
                            && curr_end != prev_end
                        {
                            warnings.push(
                                Issue::new(
                                    IssueKind::Consistency,
                                    format!(
                                        "{} has no parsed operations but stitch count changed from {prev_end} to {curr_end}",
                                        row_label(row)
                                    ),
                                )
                                .with_severity(Severity::Warning)
                                .with_size(size)
                                .with_raw_text(row.raw_text.clone())
                                .maybe_row(row.number),
                            );
                        }
                    }
                }
                prev = Some(row);
            }
        }
    }
}

fn check_document_assertions(sections: &[Section], sizes: &[String], raw_text: &str, errors: &mut Vec<Issue>) {
    if sizes.is_empty() {
        return;
    }

    let mut by_line: Vec<(usize, &Row, &BTreeMap<String, i64>)> = Vec::new();
    for section in sections {
        for row in &section.rows {
            if let (Some(line), Some(sts)) = (row.line_number, row.calculated_sts.as_ref()) {
                by_line.push((line, row, sts));
            }
        }
    }
    by_line.sort_by_key(|(line, _, _)| *line);

    for assertion in stitch_assert::extract_all_stitch_assertions(raw_text) {
        let mut applied: Option<(&Row, &BTreeMap<String, i64>)> = None;
        for (line, row, sts) in &by_line {
            if *line <= assertion.line_number {
                applied = Some((row, sts));
            } else {
                break;
            }
        }
        let Some((applied_row, applied_sts)) = applied else {
            continue;
        };
        if applied_row.line_number == Some(assertion.line_number) {
            continue;
        }

        let stated: BTreeMap<&str, i64> = if assertion.counts.len() == sizes.len() {
            sizes.iter().map(String::as_str).zip(assertion.counts.iter().copied()).collect()
        } else if assertion.counts.len() == 1 {
            sizes.iter().map(|s| (s.as_str(), assertion.counts[0])).collect()
        } else {
            continue;
        };

        for size in sizes {
            let calc = applied_sts.get(size);
            let exp = stated.get(size.as_str());
            if let (Some(calc), Some(exp)) = (calc, exp) {
                if calc != exp {
                    let label = match applied_row.number {
                        Some(n) => format!("Row {n} (pattern states count at line {})", assertion.line_number),
                        None => format!("Line {}", assertion.line_number),
                    };
                    errors.push(
                        Issue::new(
                            IssueKind::StitchCount,
                            format!(
                                "Stated count in pattern ({}) is {exp} sts but computed count at this point is {calc} sts",
                                assertion.raw_text
                            ),
                        )
                        .with_severity(Severity::Error)
                        .with_size(size.clone())
                        .with_row_label(label)
                        .with_raw_text(assertion.raw_text.clone())
                        .with_line(assertion.line_number)
                        .maybe_row(applied_row.number),
                    );
                }
            }
        }
    }
}

/// Run stitch-count validation across every declared size, mutating
/// `pattern` in place: fills `calculated_sts` on every row and appends
/// structured issues to `pattern.errors`/`pattern.warnings`.
pub fn evaluate_pattern(pattern: &mut Pattern) {
    if pattern.sizes.is_empty() {
        pattern.sizes = vec!["Size1".to_string()];
    }
    if pattern.cast_on_counts.is_empty() {
        pattern.cast_on_counts = pattern.sizes.iter().map(|s| (s.clone(), 0)).collect();
    }

    let sizes = pattern.sizes.clone();
    for size in &sizes {
        let start = pattern.cast_on_counts.get(size).copied().unwrap_or(0);
        evaluate_sections_for_size(&mut pattern.sections, size, start, &mut pattern.errors, &mut pattern.warnings);
    }

    check_cross_row_consistency(&pattern.sections, &sizes, &mut pattern.warnings);
    check_document_assertions(&pattern.sections, &sizes, &pattern.raw_text, &mut pattern.errors);
}

trait IssueRowExt {
    fn maybe_row(self, row: Option<u32>) -> Self;
}

impl IssueRowExt for Issue {
    fn maybe_row(self, row: Option<u32>) -> Self {
        match row {
            Some(n) => self.with_row(n),
            None => self,
        }
    }
}
