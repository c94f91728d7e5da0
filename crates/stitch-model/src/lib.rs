//! Data model for a parsed, evaluated knitting pattern.
//!
//! Mirrors the shapes in the project's specification: `Operation` and
//! `RepeatBlock` are built once by the tokenizer and never mutated after
//! construction (the one exception, marker-hint reinterpretation, rewrites
//! the `Operation` before the tokenizer considers it finished — see
//! `stitch-lex`). `Pattern` is assembled by the parser and then mutated only
//! by the evaluator, which fills `calculated_sts` and appends `Issue`s.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The closed set of recognized knitting operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Knit,
    Purl,
    Slip,
    SlipMarker,
    PlaceMarker,
    K2Tog,
    Ssk,
    P2Tog,
    Ssp,
    Sk2p,
    S2kp,
    K3Tog,
    P3Tog,
    Yo,
    M1,
    M1l,
    M1r,
    Kfb,
    Pfb,
    WorkEven,
    BindOff,
    CastOn,
    Unknown,
}

/// One atomic knitting action, already resolved to its net stitch effect and
/// stitches-consumed count. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub raw: String,
    pub kind: OpKind,
    pub count: i64,
    /// Net stitch-count effect of a single instance (before multiplying by `count`).
    pub effect_per_instance: i64,
    /// Stitches consumed from the working row by a single instance.
    pub consumed_per_instance: i64,
}

impl Operation {
    pub fn new(raw: impl Into<String>, kind: OpKind, count: i64, effect: i64, consumed: i64) -> Self {
        Self {
            raw: raw.into(),
            kind,
            count,
            effect_per_instance: effect,
            consumed_per_instance: consumed,
        }
    }

    pub fn work_even() -> Self {
        Self::new("work even", OpKind::WorkEven, 1, 0, 0)
    }

    /// Total signed stitch-count effect of this operation (effect × count).
    pub fn total_effect(&self) -> i64 {
        self.effect_per_instance * self.count
    }

    /// Total stitches consumed by this operation (consumed × count).
    pub fn total_consumed(&self) -> i64 {
        self.consumed_per_instance * self.count
    }
}

/// How a `RepeatBlock` determines the number of times it executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "value")]
pub enum RepeatMode {
    Fixed(i64),
    ToEnd,
    UntilRemain(i64),
}

/// A bracketed/starred sub-sequence with a repetition policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatBlock {
    pub operations: Vec<Operation>,
    pub mode: RepeatMode,
    pub raw: String,
}

impl RepeatBlock {
    pub fn new(operations: Vec<Operation>, mode: RepeatMode, raw: impl Into<String>) -> Self {
        Self {
            operations,
            mode,
            raw: raw.into(),
        }
    }

    /// Sum of operations' total effects for one pass through the block.
    pub fn net_per_repeat(&self) -> i64 {
        self.operations.iter().map(Operation::total_effect).sum()
    }

    /// Sum of operations' total consumed counts for one pass through the block.
    pub fn consumed_per_repeat(&self) -> i64 {
        self.operations.iter().map(Operation::total_consumed).sum()
    }
}

/// RS (right side) or WS (wrong side) of the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Rs,
    Ws,
}

/// A single numbered instruction, in source order within its `Section`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Row {
    /// `0` is reserved for the synthesized cast-on row.
    pub number: Option<u32>,
    pub raw_text: String,
    pub line_number: Option<usize>,
    pub side: Option<Side>,
    pub is_round: bool,
    pub operations: Vec<Operation>,
    pub repeat_blocks: Vec<RepeatBlock>,
    pub expected_sts: Option<BTreeMap<String, i64>>,
    pub calculated_sts: Option<BTreeMap<String, i64>>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub is_repeat_ref: bool,
    pub cast_on_extra: Option<i64>,
}

impl Row {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Default::default()
        }
    }
}

/// A named group of `Row`s in source order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub rows: Vec<Row>,
    pub notes: Option<String>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            notes: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.notes.is_none()
    }
}

/// Severity of an `Issue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// The kind of structured `Issue`, matching the stable schema in the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    StitchCount,
    StitchCountWarning,
    Consistency,
    Grammar,
    Terminology,
    Format,
    LlmInsight,
}

/// A single structured issue surfaced on the `Pattern`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Option<Severity>,
    pub size: Option<String>,
    pub row: Option<u32>,
    pub row_label: Option<String>,
    pub message: String,
    pub raw_text: Option<String>,
    pub line: Option<usize>,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: None,
            size: None,
            row: None,
            row_label: None,
            message: message.into(),
            raw_text: None,
            line: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_row(mut self, row: u32) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_row_label(mut self, label: impl Into<String>) -> Self {
        self.row_label = Some(label.into());
        self
    }

    pub fn with_raw_text(mut self, raw: impl Into<String>) -> Self {
        self.raw_text = Some(raw.into());
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Root aggregate produced by the parser and filled in by the evaluator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pattern {
    pub raw_text: String,
    pub sizes: Vec<String>,
    pub cast_on_counts: BTreeMap<String, i64>,
    pub sections: Vec<Section>,
    pub materials: Option<String>,
    pub gauge: Option<String>,
    pub finished_measurements: Option<String>,
    pub abbreviations: Option<String>,
    pub notes: Option<String>,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub grammar_issues: Vec<Issue>,
    pub format_issues: Vec<Issue>,
}

impl Pattern {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            sections: vec![Section::new("Main")],
            ..Default::default()
        }
    }

    /// Iterate every row across every section in source order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.sections.iter().flat_map(|s| s.rows.iter())
    }

    /// Iterate every row across every section, mutably, in source order.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.sections.iter_mut().flat_map(|s| s.rows.iter_mut())
    }
}
