//! Surface-form aliasing: full-word and multi-word phrases that canonicalize
//! to the short tokens the effect table and op-prefix regex recognize.

use regex::Regex;
use std::sync::LazyLock;

/// Multi-word phrases, replaced at the whole-text level (word-boundary,
/// case-insensitive) before the text is split into tokens. Longer / more
/// specific phrases are listed first so overlapping shorter phrases never
/// shadow them.
const MULTI_WORD_ALIASES: &[(&str, &str)] = &[
    (r"slip\s+marker", "sm"),
    (r"place\s+marker", "pm"),
    (r"yarn\s+over", "yo"),
    (r"bind\s+off", "bo"),
    (r"cast\s+on", "co"),
    (r"slip\s+1\b", "sl1"),
    (r"make\s+1\s+left", "m1l"),
    (r"make\s+1\s+right", "m1r"),
    (r"k\s*2\s*tog", "k2tog"),
    (r"p\s*2\s*tog", "p2tog"),
    (r"k\s*3\s*tog", "k3tog"),
    (r"p\s*3\s*tog", "p3tog"),
    (r"m\s*1\s*l\b", "m1l"),
    (r"m\s*1\s*r\b", "m1r"),
    (r"m\s*1\b", "m1"),
];

static MULTI_WORD_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    MULTI_WORD_ALIASES
        .iter()
        .map(|(pat, repl)| {
            let anchored = format!(r"(?i)\b{pat}");
            (Regex::new(&anchored).expect("alias regex is valid"), *repl)
        })
        .collect()
});

/// Single-word aliases, applied per-token after the text is split.
const SINGLE_WORD_ALIASES: &[(&str, &str)] = &[
    ("knit", "k"),
    ("purl", "p"),
    ("slip", "sl"),
    ("kfab", "kfb"),
];

/// Replace every recognized multi-word phrase in `text` with its canonical
/// short form. Applied once, before whitespace/comma splitting.
pub fn canonicalize_phrases(text: &str) -> String {
    let mut out = text.to_string();
    for (re, repl) in MULTI_WORD_PATTERNS.iter() {
        out = re.replace_all(&out, *repl).into_owned();
    }
    out
}

/// Replace a single token with its canonical form if it exactly matches a
/// known single-word alias (case-insensitive); otherwise return it unchanged.
pub fn canonicalize_token(token: &str) -> String {
    let lower = token.to_lowercase();
    for (alias, canonical) in SINGLE_WORD_ALIASES {
        if lower == *alias {
            return (*canonical).to_string();
        }
    }
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_word_phrases_canonicalize() {
        assert_eq!(canonicalize_phrases("yarn over"), "yo");
        assert_eq!(canonicalize_phrases("slip marker"), "sm");
        assert_eq!(canonicalize_phrases("place marker"), "pm");
        assert_eq!(canonicalize_phrases("k2 tog"), "k2tog");
    }

    #[test]
    fn single_word_aliases_canonicalize() {
        assert_eq!(canonicalize_token("Knit"), "k");
        assert_eq!(canonicalize_token("purl"), "p");
        assert_eq!(canonicalize_token("unknown"), "unknown");
    }
}
