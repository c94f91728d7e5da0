//! Size-label parsing and the multi-size value parser shared by the cast-on
//! line handler and the end-of-row assertion extractor.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static SIZES_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sizes?\s*:\s*(.+)").expect("sizes regex is valid"));

static SPLIT_SIZE_LABELS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,/]+").expect("size split regex is valid"));

static FILLER_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:sts?|stitches?|co|cast\s*on)\b").expect("filler words regex is valid")
});

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\b").expect("digit run regex is valid"));

/// Extract size labels from a line like `Sizes: XS (S, M, L, XL, 2XL, 3XL)`.
pub fn parse_size_definitions(line: &str) -> Vec<String> {
    let Some(caps) = SIZES_PREFIX.captures(line) else {
        return Vec::new();
    };
    let raw = caps[1].trim().replace('(', ",").replace(')', ",");
    SPLIT_SIZE_LABELS
        .split(&raw)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a multi-size value fragment (e.g. `57, (57), 61, (69), 69, (77), 77`)
/// into the integers it contains, stripping parens, commas, and filler words.
pub fn parse_multi_size_values(text: &str) -> Vec<i64> {
    let cleaned = text.replace('(', " ").replace(')', " ");
    let cleaned = cleaned.replace([',', ';'], " ");
    let cleaned = FILLER_WORDS.replace_all(&cleaned, " ");
    DIGIT_RUN
        .captures_iter(&cleaned)
        .filter_map(|c| c[1].parse::<i64>().ok())
        .collect()
}

static CO_REMAINDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:CO|cast\s*on)\s+(.+?)(?:\bsts?\b|$)").expect("co remainder regex is valid")
});

/// Extract the stitch counts from a cast-on line.
pub fn parse_cast_on_line(line: &str) -> Vec<i64> {
    if let Some(caps) = CO_REMAINDER.captures(line) {
        return parse_multi_size_values(&caps[1]);
    }
    parse_multi_size_values(line)
}

/// Map size labels to counts positionally, in declaration order.
pub fn map_positionally(sizes: &[String], counts: &[i64]) -> BTreeMap<String, i64> {
    sizes
        .iter()
        .zip(counts.iter())
        .map(|(s, c)| (s.clone(), *c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_size_list() {
        assert_eq!(
            parse_size_definitions("Sizes: XS, S, M"),
            vec!["XS", "S", "M"]
        );
    }

    #[test]
    fn parses_parenthesized_size_list() {
        assert_eq!(
            parse_size_definitions("Sizes: XS (S, M, L, XL, 2XL, 3XL)"),
            vec!["XS", "S", "M", "L", "XL", "2XL", "3XL"]
        );
    }

    #[test]
    fn multi_size_values_strip_parens_and_filler_words() {
        assert_eq!(
            parse_multi_size_values("57 (57, 61, 69, 69, 77, 77) sts"),
            vec![57, 57, 61, 69, 69, 77, 77]
        );
    }

    #[test]
    fn cast_on_line_extracts_counts() {
        assert_eq!(parse_cast_on_line("CO 60, 64 sts"), vec![60, 64]);
    }

    #[test]
    fn maps_sizes_to_counts_positionally() {
        let sizes = vec!["XS".to_string(), "S".to_string()];
        let mapped = map_positionally(&sizes, &[60, 64]);
        assert_eq!(mapped.get("XS"), Some(&60));
        assert_eq!(mapped.get("S"), Some(&64));
    }
}
