//! Line-oriented scanner that classifies each line of a normalized pattern
//! text and builds the `Pattern` tree, delegating instruction text to
//! `stitch_lex::tokenize`.

mod row_assertion;
mod sizes;

use regex::Regex;
use std::sync::LazyLock;
use stitch_model::{Pattern, Row, Section, Side};
use tracing::trace;

static SIZES_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sizes?\s*:").expect("sizes line regex is valid"));
static GAUGE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)gauge\s*:").expect("gauge line regex is valid"));
static MATERIALS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)materials?\s*:").expect("materials line regex is valid"));
static MEASUREMENTS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)finished\s+measurements?\s*:").expect("measurements line regex is valid")
});
static ABBREVIATIONS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)abbreviations?\s*:").expect("abbreviations line regex is valid")
});
static NOTES_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)notes?\s*:").expect("notes line regex is valid"));

static CO_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:CO|Cast\s*on)\s+").expect("co line regex is valid"));

static SECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:#{1,3}\s+|=+\s*)?([A-Z][A-Za-z\s]+)(?:\s*=+)?\s*$")
        .expect("section heading regex is valid")
});

static REPEAT_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)work\s+(?:as\s+above|as\s+established|even)\s+until")
        .expect("repeat ref regex is valid")
});

static ROW_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<kw>next\s+(?:row|rnd|round)|row|rnd|round)\s*\.?\s*(?P<num>\d+)\s*(?:\((?P<side>[RW]S)\))?\s*[:\x{2013}\x{2014}-]?\s*(?P<rest>.*)$",
    )
    .expect("row line regex is valid")
});

fn is_section_heading(line: &str) -> Option<String> {
    if ROW_LINE.is_match(line) {
        return None;
    }
    let caps = SECTION_HEADING.captures(line)?;
    let name = caps[1].trim().to_string();
    if name.len() <= 3 {
        return None;
    }
    let lower = name.to_lowercase();
    if ["row", "rnd", "round", "repeat", "next"]
        .iter()
        .any(|kw| lower.contains(kw))
    {
        return None;
    }
    Some(name)
}

fn handle_cast_on_line(pattern: &mut Pattern, section: &mut Section, line: &str, line_number: usize) {
    let counts = sizes::parse_cast_on_line(line);
    if counts.is_empty() {
        return;
    }

    if !pattern.cast_on_counts.is_empty() && counts.len() == 1 {
        let mut row = Row::new(line);
        row.line_number = Some(line_number);
        row.cast_on_extra = Some(counts[0]);
        section.rows.push(row);
        return;
    }

    let mut counts = counts;
    if counts.len() > 1 && counts[0] < 20 && counts[1..].iter().all(|&c| c >= 20) {
        counts.remove(0);
    }

    if pattern.sizes.is_empty() {
        pattern.sizes = (1..=counts.len()).map(|i| format!("Size{i}")).collect();
    }

    if counts.len() > pattern.sizes.len() {
        let start = counts.len() - pattern.sizes.len();
        counts = counts[start..].to_vec();
    }

    let mapped = sizes::map_positionally(&pattern.sizes, &counts);
    pattern.cast_on_counts = mapped.clone();

    let mut row = Row::new(line);
    row.number = Some(0);
    row.line_number = Some(line_number);
    row.expected_sts = Some(mapped.clone());
    row.calculated_sts = Some(mapped);
    section.rows.push(row);
}

fn handle_row_line(pattern: &Pattern, line: &str, line_number: usize) -> Option<Row> {
    let caps = ROW_LINE.captures(line)?;
    let number: u32 = caps["num"].parse().ok()?;
    let side = caps.name("side").map(|m| {
        if m.as_str().eq_ignore_ascii_case("rs") {
            Side::Rs
        } else {
            Side::Ws
        }
    });
    let kw_lower = caps["kw"].to_lowercase();
    let is_round = kw_lower.contains("rnd") || kw_lower.contains("round");
    let instruction_text = caps["rest"].trim();

    let stated = row_assertion::extract_end_of_row_count(instruction_text);
    let expected_sts = stated.map(|counts| {
        if !pattern.sizes.is_empty() {
            sizes::map_positionally(&pattern.sizes, &counts)
        } else {
            counts
                .iter()
                .enumerate()
                .map(|(i, c)| (format!("Size{}", i + 1), *c))
                .collect()
        }
    });

    let (operations, repeat_blocks) = stitch_lex::tokenize(instruction_text);

    trace!(target: "stitch_parse", line_number, number, "parse.line");

    let mut row = Row::new(line);
    row.number = Some(number);
    row.line_number = Some(line_number);
    row.side = side;
    row.is_round = is_round;
    row.operations = operations;
    row.repeat_blocks = repeat_blocks;
    row.expected_sts = expected_sts;
    Some(row)
}

/// Parse normalized pattern text into a `Pattern` tree. Every non-blank line
/// is tried against the classifiers in a fixed order; the first match
/// consumes the line. Lines matching nothing are ignored.
pub fn parse_pattern(text: &str) -> Pattern {
    let mut pattern = Pattern::new(text);
    pattern.sections.clear();
    let mut current = Section::new("Main");

    for (idx, raw_line) in text.split('\n').enumerate() {
        let line_number = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if SIZES_LINE.is_match(line) {
            pattern.sizes = sizes::parse_size_definitions(line);
            continue;
        }

        if GAUGE_LINE.is_match(line) {
            pattern.gauge = Some(line.to_string());
            continue;
        }
        if MATERIALS_LINE.is_match(line) {
            pattern.materials = Some(line.to_string());
            continue;
        }
        if MEASUREMENTS_LINE.is_match(line) {
            pattern.finished_measurements = Some(line.to_string());
            continue;
        }
        if ABBREVIATIONS_LINE.is_match(line) {
            pattern.abbreviations = Some(line.to_string());
            continue;
        }
        if NOTES_LINE.is_match(line) && current.rows.is_empty() {
            pattern.notes = Some(line.to_string());
            continue;
        }

        if CO_LINE.is_match(line) {
            handle_cast_on_line(&mut pattern, &mut current, line, line_number);
            continue;
        }

        if let Some(name) = is_section_heading(line) {
            if !current.is_empty() {
                pattern
                    .sections
                    .push(std::mem::replace(&mut current, Section::new(name)));
            } else {
                current = Section::new(name);
            }
            continue;
        }

        if REPEAT_REF.is_match(line) {
            let mut row = Row::new(line);
            row.line_number = Some(line_number);
            row.is_repeat_ref = true;
            current.rows.push(row);
            continue;
        }

        if let Some(row) = handle_row_line(&pattern, line, line_number) {
            current.rows.push(row);
            continue;
        }
    }

    pattern.sections.push(current);
    pattern.sections.retain(|s| !s.rows.is_empty() || s.notes.is_some());
    if pattern.sections.is_empty() {
        pattern.sections.push(Section::new("Main"));
    }

    pattern
}
