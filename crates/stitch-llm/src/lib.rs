//! Merges an already-obtained `LlmResult` into a `Pattern` the deterministic
//! pipeline already produced. The network call that obtains the
//! `LlmResult` is the out-of-scope `stitch_extern::LlmAugmenter` trait; this
//! crate only implements the merge *rule*. Runs strictly before
//! `stitch_eval::evaluate_pattern`.

use stitch_extern::{LlmBetweenStep, LlmOperation, LlmRepeatBlock, LlmResult, LlmRow};
use stitch_model::{Issue, IssueKind, OpKind, Operation, Pattern, RepeatBlock, RepeatMode, Row, Severity, Side};
use std::collections::BTreeMap;
use tracing::debug;

fn effect_and_consumed(op: &str) -> (OpKind, i64, i64) {
    match op {
        "k" => (OpKind::Knit, 0, 1),
        "p" => (OpKind::Purl, 0, 1),
        "sl" => (OpKind::Slip, 0, 1),
        "sm" => (OpKind::SlipMarker, 0, 0),
        "pm" => (OpKind::PlaceMarker, 0, 0),
        "k2tog" => (OpKind::K2Tog, -1, 2),
        "ssk" => (OpKind::Ssk, -1, 2),
        "p2tog" => (OpKind::P2Tog, -1, 2),
        "ssp" => (OpKind::Ssp, -1, 2),
        "sk2p" => (OpKind::Sk2p, -2, 3),
        "s2kp" => (OpKind::S2kp, -2, 3),
        "k3tog" => (OpKind::K3Tog, -2, 3),
        "p3tog" => (OpKind::P3Tog, -2, 3),
        "cdd" => (OpKind::Sk2p, -2, 3),
        "yo" => (OpKind::Yo, 1, 0),
        "m1" | "m1p" => (OpKind::M1, 1, 0),
        "m1l" => (OpKind::M1l, 1, 0),
        "m1r" => (OpKind::M1r, 1, 0),
        "kfb" => (OpKind::Kfb, 1, 1),
        "pfb" => (OpKind::Pfb, 1, 1),
        "bo" => (OpKind::BindOff, -1, 1),
        "co" => (OpKind::CastOn, 1, 0),
        _ => (OpKind::Unknown, 0, 1),
    }
}

fn build_operation(llm_op: &LlmOperation) -> Option<Operation> {
    let op_str = llm_op.op.to_lowercase();
    if op_str.is_empty() {
        return None;
    }
    let count = llm_op.count.unwrap_or(1).max(1);
    let (kind, effect, consumed) = effect_and_consumed(&op_str);
    let raw = if count > 1 {
        format!("{op_str}{count}")
    } else {
        op_str
    };
    Some(Operation::new(raw, kind, count, effect, consumed))
}

fn build_repeat_block(llm_block: &LlmRepeatBlock) -> Option<RepeatBlock> {
    let ops: Vec<Operation> = llm_block.operations.iter().filter_map(build_operation).collect();
    if ops.is_empty() {
        return None;
    }
    let mode = if let Some(n) = llm_block.repeat_count {
        RepeatMode::Fixed(n)
    } else if let Some(k) = llm_block.until_sts_remain {
        RepeatMode::UntilRemain(k)
    } else {
        RepeatMode::ToEnd
    };
    Some(RepeatBlock::new(ops, mode, "llm-supplied"))
}

fn map_positionally(sizes: &[String], counts: &[i64]) -> BTreeMap<String, i64> {
    sizes.iter().cloned().zip(counts.iter().copied()).collect()
}

fn merge_row(row: &mut Row, llm_row: &LlmRow, sizes: &[String]) {
    let has_det_ops = !row.operations.is_empty() || !row.repeat_blocks.is_empty();
    let already_work_even = row.operations.iter().any(|op| op.kind == OpKind::WorkEven);

    if llm_row.is_work_even == Some(true) && !already_work_even {
        row.operations = vec![Operation::work_even()];
        row.repeat_blocks.clear();
    } else {
        let has_llm_ops = llm_row
            .operations
            .as_ref()
            .is_some_and(|ops| !ops.is_empty())
            || llm_row
                .repeat_blocks
                .as_ref()
                .is_some_and(|blocks| !blocks.is_empty());

        if !has_det_ops && has_llm_ops {
            row.operations = llm_row
                .operations
                .as_ref()
                .map(|ops| ops.iter().filter_map(build_operation).collect())
                .unwrap_or_default();
            row.repeat_blocks = llm_row
                .repeat_blocks
                .as_ref()
                .map(|blocks| blocks.iter().filter_map(build_repeat_block).collect())
                .unwrap_or_default();
        }
    }

    if row.expected_sts.is_none() {
        if let Some(sts) = llm_row.expected_sts.as_ref() {
            if !sts.is_empty() && !sizes.is_empty() {
                row.expected_sts = Some(map_positionally(sizes, sts));
            }
        }
    }

    if row.side.is_none() {
        row.side = match llm_row.side.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("rs") => Some(Side::Rs),
            Some(s) if s.eq_ignore_ascii_case("ws") => Some(Side::Ws),
            _ => None,
        };
    }
}

fn insert_between_steps(pattern: &mut Pattern, between_steps: &[LlmBetweenStep]) {
    let mut steps_by_after: BTreeMap<u32, Vec<&LlmBetweenStep>> = BTreeMap::new();
    for step in between_steps {
        if step.cast_on_extra.is_some_and(|extra| extra > 0) {
            steps_by_after.entry(step.after_row).or_default().push(step);
        }
    }
    if steps_by_after.is_empty() {
        return;
    }

    for section in pattern.sections.iter_mut() {
        let mut new_rows = Vec::with_capacity(section.rows.len());
        for row in section.rows.drain(..) {
            let row_number = row.number;
            new_rows.push(row);
            if let Some(number) = row_number {
                if let Some(steps) = steps_by_after.get(&number) {
                    for step in steps {
                        let extra = step.cast_on_extra.expect("filtered above");
                        let text = step
                            .description
                            .clone()
                            .unwrap_or_else(|| format!("Cast on {extra} more sts"));
                        let mut extra_row = Row::new(text);
                        extra_row.cast_on_extra = Some(extra);
                        new_rows.push(extra_row);
                    }
                }
            }
        }
        section.rows = new_rows;
    }
}

/// Merge `llm` into `pattern`. Must run before `stitch_eval::evaluate_pattern`.
pub fn merge(pattern: &mut Pattern, llm: LlmResult) {
    if pattern.sizes.is_empty() {
        if let Some(sizes) = llm.sizes.filter(|s| !s.is_empty()) {
            pattern.sizes = sizes;
        }
    }

    if pattern.cast_on_counts.is_empty() {
        if let Some(counts) = llm.cast_on.filter(|c| !c.is_empty()) {
            pattern.cast_on_counts = map_positionally(&pattern.sizes, &counts);
        }
    }

    if let Some(llm_rows) = llm.rows {
        let sizes = pattern.sizes.clone();
        let by_number: BTreeMap<u32, &LlmRow> = llm_rows.iter().map(|r| (r.number, r)).collect();
        for row in pattern.rows_mut() {
            if let Some(number) = row.number {
                if let Some(llm_row) = by_number.get(&number) {
                    merge_row(row, llm_row, &sizes);
                }
            }
        }
    }

    if let Some(sections) = llm.sections {
        let existing: std::collections::HashSet<String> =
            pattern.sections.iter().map(|s| s.name.to_lowercase()).collect();
        for name in sections {
            if !existing.contains(&name.to_lowercase()) {
                debug!(target: "stitch_llm", section = %name, "llm_insight");
                pattern.warnings.push(
                    Issue::new(IssueKind::LlmInsight, format!("LLM detected section: {name}"))
                        .with_severity(Severity::Info),
                );
            }
        }
    }

    if let Some(between_steps) = llm.between_steps {
        insert_between_steps(pattern, &between_steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_extern::LlmOperation;
    use pretty_assertions::assert_eq;

    #[test]
    fn fills_sizes_and_cast_on_only_when_absent() {
        let mut pattern = Pattern::new("");
        let llm = LlmResult {
            sizes: Some(vec!["S".to_string(), "M".to_string()]),
            cast_on: Some(vec![60, 64]),
            ..Default::default()
        };
        merge(&mut pattern, llm);
        assert_eq!(pattern.sizes, vec!["S", "M"]);
        assert_eq!(pattern.cast_on_counts.get("S"), Some(&60));
    }

    #[test]
    fn does_not_overwrite_existing_sizes() {
        let mut pattern = Pattern::new("");
        pattern.sizes = vec!["XS".to_string()];
        let llm = LlmResult {
            sizes: Some(vec!["S".to_string()]),
            ..Default::default()
        };
        merge(&mut pattern, llm);
        assert_eq!(pattern.sizes, vec!["XS"]);
    }

    #[test]
    fn replaces_row_operations_only_when_deterministic_parse_was_empty() {
        let mut pattern = Pattern::new("");
        pattern.sizes = vec!["S".to_string()];
        let mut row = Row::new("Row 1: something the tokenizer missed");
        row.number = Some(1);
        pattern.sections[0].rows.push(row);

        let llm = LlmResult {
            rows: Some(vec![LlmRow {
                number: 1,
                side: None,
                is_round: None,
                is_work_even: None,
                operations: Some(vec![LlmOperation { op: "k".to_string(), count: Some(10) }]),
                repeat_blocks: None,
                expected_sts: None,
            }]),
            ..Default::default()
        };
        merge(&mut pattern, llm);
        assert_eq!(pattern.sections[0].rows[0].operations.len(), 1);
        assert_eq!(pattern.sections[0].rows[0].operations[0].count, 10);
    }

    #[test]
    fn does_not_overwrite_row_with_deterministic_operations() {
        let mut pattern = Pattern::new("");
        let mut row = Row::new("Row 1: k10");
        row.number = Some(1);
        row.operations = vec![Operation::new("k10", OpKind::Knit, 10, 0, 1)];
        pattern.sections[0].rows.push(row);

        let llm = LlmResult {
            rows: Some(vec![LlmRow {
                number: 1,
                side: None,
                is_round: None,
                is_work_even: None,
                operations: Some(vec![LlmOperation { op: "p".to_string(), count: Some(5) }]),
                repeat_blocks: None,
                expected_sts: None,
            }]),
            ..Default::default()
        };
        merge(&mut pattern, llm);
        assert_eq!(pattern.sections[0].rows[0].operations[0].kind, OpKind::Knit);
    }

    #[test]
    fn work_even_flag_takes_priority_over_operations_replacement() {
        let mut pattern = Pattern::new("");
        let mut row = Row::new("Row 1: prose the tokenizer missed");
        row.number = Some(1);
        pattern.sections[0].rows.push(row);

        let llm = LlmResult {
            rows: Some(vec![LlmRow {
                number: 1,
                side: None,
                is_round: None,
                is_work_even: Some(true),
                operations: Some(vec![LlmOperation { op: "k".to_string(), count: Some(10) }]),
                repeat_blocks: None,
                expected_sts: None,
            }]),
            ..Default::default()
        };
        merge(&mut pattern, llm);
        assert_eq!(pattern.sections[0].rows[0].operations.len(), 1);
        assert_eq!(pattern.sections[0].rows[0].operations[0].kind, OpKind::WorkEven);
    }

    #[test]
    fn unrecognized_sections_are_flagged_not_fabricated() {
        let mut pattern = Pattern::new("");
        let llm = LlmResult {
            sections: Some(vec!["Sleeve Cuff".to_string()]),
            ..Default::default()
        };
        merge(&mut pattern, llm);
        assert_eq!(pattern.sections.len(), 1);
        assert_eq!(pattern.sections[0].name, "Main");
        assert_eq!(pattern.warnings.len(), 1);
        assert_eq!(pattern.warnings[0].kind, IssueKind::LlmInsight);
    }

    #[test]
    fn between_steps_insert_synthetic_row_after_target() {
        let mut pattern = Pattern::new("");
        let mut row1 = Row::new("Row 1: knit across");
        row1.number = Some(1);
        let mut row2 = Row::new("Row 2: knit across");
        row2.number = Some(2);
        pattern.sections[0].rows = vec![row1, row2];

        let llm = LlmResult {
            between_steps: Some(vec![LlmBetweenStep {
                after_row: 1,
                description: Some("Cast on 8 sts at underarm".to_string()),
                cast_on_extra: Some(8),
            }]),
            ..Default::default()
        };
        merge(&mut pattern, llm);
        let rows = &pattern.sections[0].rows;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].cast_on_extra, Some(8));
        assert_eq!(rows[2].number, Some(2));
    }
}
