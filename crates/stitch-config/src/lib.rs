//! Configuration loading for the pattern-analysis pipeline.
//!
//! `stitchcheck.toml` is optional; discovery prefers a file in the current
//! working directory, falls back to `dirs::config_dir()`, and finally falls
//! back to an in-memory default -- the pipeline always runs even when no
//! config file is present or the one present fails to parse. This crate has
//! no influence on the deterministic stitch-count arithmetic; it only
//! toggles which ambient passes run (lint, LLM merge) and which warnings are
//! suppressed at the report layer.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Suppress the cross-row consistency warning entirely (some patterns
    /// are intentionally terse between assertions).
    #[serde(default)]
    pub suppress_consistency_warnings: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            suppress_consistency_warnings: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct LintConfig {
    #[serde(default = "LintConfig::default_enabled")]
    pub enabled: bool,
}

impl LintConfig {
    const fn default_enabled() -> bool {
        true
    }
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct LlmConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: ConfigFile,
}

/// Best-effort config path: a local `stitchcheck.toml` takes priority over
/// the platform config directory.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("stitchcheck.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("stitchcheck").join("stitchcheck.toml");
    }
    PathBuf::from("stitchcheck.toml")
}

/// Load config from `path` (or the discovered default location). Falls back
/// to `Config::default()` on a missing file or a parse failure -- never
/// propagates a parse error, matching the teacher's tolerance policy.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => Ok(Config { file }),
        Err(err) => {
            warn!(target: "stitch_config", path = %path.display(), error = %err, "config_parse_failed");
            Ok(Config::default())
        }
    }
}
