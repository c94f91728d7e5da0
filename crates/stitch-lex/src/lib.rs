//! Converts one instruction-text fragment into a flat sequence of
//! `Operation`s plus zero or more `RepeatBlock`s, per the tokenizer design in
//! the project specification.

mod alias;
mod effects;

use regex::Regex;
use stitch_model::{Operation, OpKind, RepeatBlock, RepeatMode};
use std::sync::LazyLock;

static WORK_EVEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)work\s+even").expect("work-even regex is valid"));

static SPLIT_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").expect("split regex is valid"));

/// One bracketed/starred run, captured with its optional closing clause.
static REPEAT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\*([^*]+)\*\s*(?:,?\s*repeat\s+)?(?:(?P<times>\d+)\s*times|to\s*end|across|until\s*(?P<remain>\d+)\s*sts?\s*remain)?",
    )
    .expect("repeat block regex is valid")
});

/// Extracts an op prefix from the closed set plus an optional trailing
/// integer. Intentionally a prefix match (no end anchor): trailing
/// punctuation left on a token (e.g. `yo;`) must not prevent a match.
static OP_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<op>k3tog|p3tog|k2tog|p2tog|ssk|ssp|sk2p|s2kp|cdd|kfb|pfb|m1l|m1r|m1p|m1|yo|sl1|sl|wyif|wyib|sm|pm|bo|co|k|p)(?P<count>\d+)?",
    )
    .expect("op token regex is valid")
});

fn strip_trailing_punct(token: &str) -> &str {
    token.trim_end_matches([',', '.', ';', ':', ')', ']', '!', '?'])
}

fn parse_op_token(canon: &str) -> Option<Operation> {
    let caps = OP_TOKEN.captures(canon)?;
    let op_str = caps.name("op")?.as_str().to_lowercase();
    let (kind, effect, consumed) = effects::EFFECT_TABLE.get(op_str.as_str()).copied()?;
    let count = caps
        .name("count")
        .map(|m| m.as_str().parse::<i64>().unwrap_or(1))
        .unwrap_or(1);
    let raw = if caps.name("count").is_some() {
        format!("{op_str}{count}")
    } else {
        op_str.clone()
    };
    Some(Operation::new(raw, kind, count, effect, consumed))
}

/// Split on commas/whitespace, canonicalize aliases, extract operations,
/// apply adjacent-number merging and the marker hint. Tokens matching
/// nothing are silently dropped.
fn tokenize_flat(text: &str) -> Vec<Operation> {
    let phrased = alias::canonicalize_phrases(text);
    let raw_tokens: Vec<&str> = SPLIT_TOKENS
        .split(phrased.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let mut ops: Vec<Operation> = Vec::new();
    let mut i = 0usize;
    while i < raw_tokens.len() {
        let stripped = strip_trailing_punct(raw_tokens[i]);
        if stripped.is_empty() {
            i += 1;
            continue;
        }
        let canon = alias::canonicalize_token(stripped);

        if let Some(mut op) = parse_op_token(&canon) {
            if matches!(op.kind, OpKind::Knit | OpKind::Purl) && op.count == 1 {
                if let Some(next_raw) = raw_tokens.get(i + 1) {
                    let next_stripped = strip_trailing_punct(next_raw);
                    if let Ok(n) = next_stripped.parse::<i64>() {
                        if n >= 1 {
                            let base = op.raw.clone();
                            op.count = n;
                            op.raw = format!("{base}{n}");
                            i += 1;
                        }
                    }
                }
            }
            ops.push(op);
        } else if canon.eq_ignore_ascii_case("marker") {
            if let Some(last) = ops.last_mut() {
                if last.kind == OpKind::Slip && matches!(last.raw.as_str(), "sl" | "slip") {
                    last.raw = "sm".to_string();
                    last.kind = OpKind::SlipMarker;
                    last.consumed_per_instance = 0;
                }
            }
        }
        i += 1;
    }
    ops
}

const SENTINEL: &str = "\u{0}REPEAT\u{0}";

fn repeat_mode_from_captures(caps: &regex::Captures) -> RepeatMode {
    if let Some(times) = caps.name("times") {
        if let Ok(n) = times.as_str().parse::<i64>() {
            return RepeatMode::Fixed(n);
        }
    }
    if let Some(remain) = caps.name("remain") {
        if let Ok(k) = remain.as_str().parse::<i64>() {
            return RepeatMode::UntilRemain(k);
        }
    }
    RepeatMode::ToEnd
}

/// Tokenize one instruction-text fragment (already stripped of any row-header
/// prefix) into flat operations outside any repeat block, plus the ordered
/// repeat blocks found in the text.
pub fn tokenize(text: &str) -> (Vec<Operation>, Vec<RepeatBlock>) {
    let text = text.trim();

    if WORK_EVEN.is_match(text) {
        return (vec![Operation::work_even()], Vec::new());
    }

    let phrased = alias::canonicalize_phrases(text);

    let mut blocks = Vec::new();
    let mut remaining = String::with_capacity(phrased.len());
    let mut last_end = 0usize;
    for caps in REPEAT_BLOCK.captures_iter(&phrased) {
        let whole = caps.get(0).expect("group 0 always matches");
        let inner = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let inner_ops = tokenize_flat(inner);
        if inner_ops.is_empty() {
            continue;
        }
        let mode = repeat_mode_from_captures(&caps);
        blocks.push(RepeatBlock::new(inner_ops, mode, whole.as_str().to_string()));

        remaining.push_str(&phrased[last_end..whole.start()]);
        remaining.push_str(SENTINEL);
        last_end = whole.end();
    }
    remaining.push_str(&phrased[last_end..]);

    let mut flat_ops = Vec::new();
    for part in remaining.split(SENTINEL) {
        flat_ops.extend(tokenize_flat(part));
    }

    (flat_ops, blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn work_even_shortcut() {
        let (ops, blocks) = tokenize("work even");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OpKind::WorkEven);
        assert!(blocks.is_empty());
    }

    #[test]
    fn flat_knit_purl_sequence() {
        let (ops, blocks) = tokenize("k2, p1");
        assert!(blocks.is_empty());
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind, OpKind::Knit);
        assert_eq!(ops[0].count, 2);
        assert_eq!(ops[1].kind, OpKind::Purl);
        assert_eq!(ops[1].count, 1);
    }

    #[test]
    fn knit_with_spelled_count_merges_adjacent_number() {
        let (ops, _) = tokenize("Knit 4, 4, 4, 6, 6, 6 st");
        // "Knit 4" merges into one op with count 4; the bare trailing numbers
        // are each their own unmergeable "k"-less tokens and are dropped
        // since they don't follow a k/p op anymore after the first merge.
        assert_eq!(ops[0].kind, OpKind::Knit);
        assert_eq!(ops[0].count, 4);
    }

    #[test]
    fn repeat_block_to_end_default() {
        let (ops, blocks) = tokenize("k1, *k2tog, yo; rep from * to end");
        assert_eq!(ops.len(), 1);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].mode, RepeatMode::ToEnd);
        assert_eq!(blocks[0].operations.len(), 2);
        assert_eq!(blocks[0].operations[0].kind, OpKind::K2Tog);
        assert_eq!(blocks[0].operations[1].kind, OpKind::Yo);
    }

    #[test]
    fn repeat_block_fixed_count() {
        let (_, blocks) = tokenize("*k2, p2*, repeat 3 times");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].mode, RepeatMode::Fixed(3));
    }

    #[test]
    fn repeat_block_until_remain() {
        let (_, blocks) = tokenize("*k1, k2tog*; rep from * until 4 sts remain");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].mode, RepeatMode::UntilRemain(4));
    }

    #[test]
    fn repeat_block_with_no_closing_clause_defaults_to_end() {
        let (_, blocks) = tokenize("*k2, p2*");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].mode, RepeatMode::ToEnd);
    }

    #[test]
    fn slip_marker_alias() {
        let (ops, _) = tokenize("sl1, k1, psso, slip marker");
        let sm = ops.iter().find(|o| o.raw == "sm");
        assert!(sm.is_some());
        assert_eq!(sm.unwrap().consumed_per_instance, 0);
    }

    #[test]
    fn marker_hint_reinterprets_preceding_slip() {
        let (ops, _) = tokenize("sl, marker, k1");
        let sm = &ops[0];
        assert_eq!(sm.raw, "sm");
        assert_eq!(sm.consumed_per_instance, 0);
    }

    #[test]
    fn unknown_tokens_are_dropped_silently() {
        let (ops, _) = tokenize("work the next 2 sts in pattern as established");
        // "work", "the", "in", "pattern", "as", "established" all drop.
        // "next" drops. Only digit-adjacent-to-op tokens are ever retained,
        // and there is no k/p immediately before the bare "2" here.
        assert!(ops.iter().all(|o| o.kind != OpKind::Unknown));
    }

    #[test]
    fn fillers_and_sts_suffix_are_dropped() {
        let (ops, _) = tokenize("k2tog, yo, k2 sts");
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[2].kind, OpKind::Knit);
        assert_eq!(ops[2].count, 2);
    }
}
