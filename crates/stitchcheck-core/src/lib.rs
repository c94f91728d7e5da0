//! Composes the five pipeline components into the single entry point
//! external collaborators call into: `analyze(text) -> Pattern`. The HTTP
//! surface and LLM network call are explicitly out of scope (see the
//! project specification); this crate exposes them as trait seams only
//! (`stitch_extern::LlmAugmenter`) rather than bundling an implementation.

use stitch_config::Config;
use stitch_extern::{LlmAugmenter, LlmError};
use stitch_model::{IssueKind, Pattern};
use tracing::debug;

/// Run the deterministic pipeline only: normalize, parse, evaluate. No
/// lint, no LLM merge.
pub fn analyze(text: &str) -> Pattern {
    let mut pattern = parse(text);
    stitch_eval::evaluate_pattern(&mut pattern);
    pattern
}

/// Normalize and parse `text` into a `Pattern`, without running the
/// evaluator. Exposed so callers that need an LLM merge pass can run it
/// between parsing and evaluation.
pub fn parse(text: &str) -> Pattern {
    let normalized = stitch_text::normalize(text);
    stitch_parse::parse_pattern(&normalized)
}

fn apply_lint(pattern: &mut Pattern) {
    pattern.format_issues = stitch_lint::check_format(pattern);
    let (grammar, terminology) = stitch_lint::check_grammar(pattern);
    pattern.grammar_issues = grammar;
    pattern.grammar_issues.extend(terminology);
}

fn suppress_consistency_warnings(pattern: &mut Pattern) {
    pattern.warnings.retain(|issue| issue.kind != IssueKind::Consistency);
}

/// Run the full pipeline honoring `config`: deterministic parse, evaluate,
/// then (if `config.lint.enabled`) lint, then (if configured) suppress the
/// cross-row consistency warning. No LLM merge -- use [`analyze_with_llm`]
/// when an augmenter is available.
pub fn analyze_with_config(text: &str, config: &Config) -> Pattern {
    let mut pattern = parse(text);
    stitch_eval::evaluate_pattern(&mut pattern);

    if config.file.evaluator.suppress_consistency_warnings {
        suppress_consistency_warnings(&mut pattern);
    }
    if config.file.lint.enabled {
        apply_lint(&mut pattern);
    }
    pattern
}

/// Run the full pipeline with an LLM augmentation pass between parsing and
/// evaluation. Runs the augmenter only when `config.llm.enabled`; a
/// transport/decode failure falls back to deterministic-only output
/// (matching the original service's "falls back gracefully" policy) rather
/// than propagating.
pub fn analyze_with_llm(text: &str, config: &Config, augmenter: &dyn LlmAugmenter) -> Pattern {
    let mut pattern = parse(text);

    if config.file.llm.enabled {
        match augmenter.augment(&pattern.raw_text) {
            Ok(Some(result)) => stitch_llm::merge(&mut pattern, result),
            Ok(None) => debug!(target: "stitchcheck_core", "llm_parsing_unavailable"),
            Err(err) => log_llm_error(&err),
        }
    }

    stitch_eval::evaluate_pattern(&mut pattern);

    if config.file.evaluator.suppress_consistency_warnings {
        suppress_consistency_warnings(&mut pattern);
    }
    if config.file.lint.enabled {
        apply_lint(&mut pattern);
    }
    pattern
}

fn log_llm_error(err: &LlmError) {
    debug!(target: "stitchcheck_core", error = %err, "llm_augment_failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stitch_extern::LlmResult;

    #[test]
    fn simple_ribbing_scenario_analyzes_cleanly() {
        let text = "Sizes: XS, S\nCO 60, 64 sts\nRow 1 (WS): *k2, p2; rep from * to end (60, 64 sts)\nRow 2 (RS): work even";
        let pattern = analyze(text);
        assert_eq!(pattern.sizes, vec!["XS", "S"]);
        assert!(pattern.errors.is_empty());
        assert_eq!(pattern.rows().count(), 3);
    }

    #[test]
    fn empty_text_has_no_rows_or_errors() {
        let pattern = analyze("");
        assert_eq!(pattern.sections.len(), 1);
        assert!(pattern.sections[0].rows.is_empty());
        assert!(pattern.errors.is_empty());
    }

    #[test]
    fn config_controls_lint_execution() {
        let text = "Row 1: k2, p2";
        let mut config = Config::default();
        config.file.lint.enabled = false;
        let pattern = analyze_with_config(text, &config);
        assert!(pattern.format_issues.is_empty());

        config.file.lint.enabled = true;
        let pattern = analyze_with_config(text, &config);
        assert!(!pattern.format_issues.is_empty());
    }

    #[test]
    fn config_suppresses_consistency_warnings() {
        let text = "CO 40 sts\nRow 1: knit across\nCast on 2 sts at underarm\nRow 2: knit across";
        let mut config = Config::default();
        config.file.lint.enabled = false;

        let pattern = analyze_with_config(text, &config);
        assert!(pattern.warnings.iter().any(|i| i.kind == IssueKind::Consistency));

        config.file.evaluator.suppress_consistency_warnings = true;
        let suppressed = analyze_with_config(text, &config);
        assert!(!suppressed.warnings.iter().any(|i| i.kind == IssueKind::Consistency));
    }

    struct StubAugmenter(LlmResult);
    impl LlmAugmenter for StubAugmenter {
        fn augment(&self, _raw_text: &str) -> Result<Option<LlmResult>, LlmError> {
            Ok(Some(self.0.clone()))
        }
    }

    #[test]
    fn llm_merge_runs_before_evaluation_when_enabled() {
        let text = "Sizes: S\nCO 10 sts\nRow 1: some unrecognized prose";
        let mut config = Config::default();
        config.file.lint.enabled = false;
        config.file.llm.enabled = true;

        let augmenter = StubAugmenter(LlmResult {
            rows: Some(vec![stitch_extern::LlmRow {
                number: 1,
                side: None,
                is_round: None,
                is_work_even: Some(true),
                operations: None,
                repeat_blocks: None,
                expected_sts: None,
            }]),
            ..Default::default()
        });

        let pattern = analyze_with_llm(text, &config, &augmenter);
        let row1 = pattern.rows().find(|r| r.number == Some(1)).unwrap();
        assert_eq!(row1.calculated_sts.as_ref().unwrap().get("S"), Some(&10));
    }

    struct FailingAugmenter;
    impl LlmAugmenter for FailingAugmenter {
        fn augment(&self, _raw_text: &str) -> Result<Option<LlmResult>, LlmError> {
            Err(LlmError::Transport("connection refused".to_string()))
        }
    }

    #[test]
    fn llm_failure_falls_back_to_deterministic_output() {
        let text = "Sizes: S\nCO 10 sts\nRow 1: k10";
        let mut config = Config::default();
        config.file.lint.enabled = false;
        config.file.llm.enabled = true;

        let pattern = analyze_with_llm(text, &config, &FailingAugmenter);
        assert!(pattern.errors.is_empty());
        assert_eq!(pattern.rows().count(), 2);
    }
}
