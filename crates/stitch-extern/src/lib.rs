//! Narrow interfaces to the two external collaborators named in the project
//! specification: binary-to-text extraction from document containers, and
//! optional LLM augmentation of rows the deterministic parser didn't
//! recognize. Neither collaborator's network/IO machinery lives here -- only
//! the trait seams and the wire shapes a caller hands across them.

use serde::Deserialize;
use thiserror::Error;

/// Fatal boundary error: the core pipeline never runs when this occurs.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Converts a document container's bytes to a plain-text string. Supported
/// set: `.docx` / `.pdf` / `.txt`.
pub trait TextExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractError>;
}

fn extension_of(filename: &str) -> Option<&str> {
    filename.rsplit('.').next()
}

/// The only bundled extractor: `.txt`, decoded as UTF-8 with lossy
/// replacement (matching `errors="replace"` in the original extractor).
/// `.docx`/`.pdf` are represented by the trait only -- a narrow interface
/// with no bundled implementation, since those formats need a real document
/// parser the core crate has no business depending on.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
        match extension_of(filename).map(|ext| ext.to_lowercase()) {
            Some(ext) if ext == "txt" => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Some(ext) => Err(ExtractError::Unsupported(ext)),
            None => Err(ExtractError::Unsupported(String::new())),
        }
    }
}

/// Error surfaced by an `LlmAugmenter`. Distinct from `ExtractError`: a
/// failure here is never fatal to the pipeline, just a reason to fall back
/// to deterministic-only output.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

/// One operation as the LLM reports it: a short op string plus a count.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmOperation {
    pub op: String,
    #[serde(default)]
    pub count: Option<i64>,
}

/// One repeat block as the LLM reports it. At most one of `repeat_count`,
/// `repeat_to_end`, `until_sts_remain` should be set; the merge layer in
/// `stitch-llm` resolves ambiguity by preferring `repeat_count`, then
/// `until_sts_remain`, defaulting to repeat-to-end.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmRepeatBlock {
    #[serde(default)]
    pub operations: Vec<LlmOperation>,
    #[serde(default)]
    pub repeat_count: Option<i64>,
    #[serde(default)]
    pub repeat_to_end: Option<bool>,
    #[serde(default)]
    pub until_sts_remain: Option<i64>,
}

/// One row's LLM-supplied structured data, keyed to a deterministic row by
/// `number`.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmRow {
    pub number: u32,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub is_round: Option<bool>,
    #[serde(default)]
    pub is_work_even: Option<bool>,
    #[serde(default)]
    pub operations: Option<Vec<LlmOperation>>,
    #[serde(default)]
    pub repeat_blocks: Option<Vec<LlmRepeatBlock>>,
    #[serde(default)]
    pub expected_sts: Option<Vec<i64>>,
}

/// A mid-pattern prose step the LLM noticed between two numbered rows.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmBetweenStep {
    pub after_row: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cast_on_extra: Option<i64>,
}

/// The full structured result an LLM augmenter returns for one document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmResult {
    #[serde(default)]
    pub sizes: Option<Vec<String>>,
    #[serde(default)]
    pub cast_on: Option<Vec<i64>>,
    #[serde(default)]
    pub sections: Option<Vec<String>>,
    #[serde(default)]
    pub rows: Option<Vec<LlmRow>>,
    #[serde(default)]
    pub between_steps: Option<Vec<LlmBetweenStep>>,
}

/// Supplies structured row data for instructions the deterministic parser
/// did not recognize. The network call itself is out of scope here; this
/// trait is only the seam a caller plugs a real implementation into.
pub trait LlmAugmenter {
    fn augment(&self, raw_text: &str) -> Result<Option<LlmResult>, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_extractor_decodes_txt() {
        let extractor = PlainTextExtractor;
        let result = extractor.extract("pattern.txt", b"Row 1: k2, p2").unwrap();
        assert_eq!(result, "Row 1: k2, p2");
    }

    #[test]
    fn plain_text_extractor_rejects_other_extensions() {
        let extractor = PlainTextExtractor;
        let err = extractor.extract("pattern.docx", b"").unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(ext) if ext == "docx"));
    }

    #[test]
    fn plain_text_extractor_replaces_invalid_utf8() {
        let extractor = PlainTextExtractor;
        let bytes = b"valid \xff\xfe bytes";
        let result = extractor.extract("pattern.txt", bytes).unwrap();
        assert!(result.contains('\u{FFFD}'));
    }

    #[test]
    fn llm_result_deserializes_from_json() {
        let json = r#"{
            "sizes": ["S", "M"],
            "cast_on": [60, 64],
            "rows": [{"number": 1, "is_work_even": true}],
            "between_steps": [{"after_row": 3, "cast_on_extra": 8}]
        }"#;
        let result: LlmResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.sizes, Some(vec!["S".to_string(), "M".to_string()]));
        assert_eq!(result.rows.unwrap()[0].is_work_even, Some(true));
        assert_eq!(result.between_steps.unwrap()[0].cast_on_extra, Some(8));
    }
}
