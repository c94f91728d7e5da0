//! `stitchcheck` -- read a pattern file, run it through the analysis
//! pipeline, and print either a human-readable summary or the full
//! `Pattern` as JSON.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process;
use stitch_extern::{PlainTextExtractor, TextExtractor};
use stitch_model::Pattern;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Analyze a knitting pattern and report per-size stitch-count discrepancies.
#[derive(Parser, Debug)]
#[command(name = "stitchcheck", version, about = "Knitting pattern stitch-count checker")]
struct Args {
    /// Path to the pattern file (.txt; .docx/.pdf are accepted by the
    /// extractor trait but have no bundled implementation here).
    path: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Optional path to `stitchcheck.toml` (overrides discovery).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable grammar/format linting even if the config enables it.
    #[arg(long)]
    no_lint: bool,

    /// Suppress log file output.
    #[arg(long)]
    quiet: bool,
}

fn configure_logging(quiet: bool) -> Option<WorkerGuard> {
    if quiet {
        return None;
    }
    let log_path = PathBuf::from("stitchcheck.log");
    if log_path.exists() {
        let _ = fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(".", "stitchcheck.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init();
    Some(guard)
}

fn print_text_report(pattern: &Pattern) {
    println!("Sizes: {}", pattern.sizes.join(", "));
    for size in &pattern.sizes {
        let count = pattern.cast_on_counts.get(size).copied().unwrap_or(0);
        println!("  Cast on ({size}): {count} sts");
    }
    println!();

    for section in &pattern.sections {
        println!("== {} ==", section.name);
        for row in &section.rows {
            let label = match row.number {
                Some(n) => format!("Row {n}"),
                None => "Instruction".to_string(),
            };
            let ending = row
                .calculated_sts
                .as_ref()
                .map(|m| {
                    m.iter()
                        .map(|(size, count)| format!("{size}={count}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            println!("  {label}: {ending}");
        }
    }

    if !pattern.errors.is_empty() {
        println!("\nErrors:");
        for issue in &pattern.errors {
            println!("  [{}] {}", issue.row_label.as_deref().unwrap_or("?"), issue.message);
        }
    }
    if !pattern.warnings.is_empty() {
        println!("\nWarnings:");
        for issue in &pattern.warnings {
            println!("  [{}] {}", issue.row_label.as_deref().unwrap_or("?"), issue.message);
        }
    }
    if !pattern.format_issues.is_empty() || !pattern.grammar_issues.is_empty() {
        println!("\nLint:");
        for issue in pattern.format_issues.iter().chain(pattern.grammar_issues.iter()) {
            println!("  {}", issue.message);
        }
    }
}

fn run(args: &Args) -> Result<Pattern> {
    let bytes = fs::read(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;

    let filename = args
        .path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();
    let text = match PlainTextExtractor.extract(&filename, &bytes) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };

    let mut config = stitch_config::load_from(args.config.clone())?;
    if args.no_lint {
        config.file.lint.enabled = false;
    }

    info!(target: "stitch_cli", path = %args.path.display(), "analyze_start");
    Ok(stitchcheck_core::analyze_with_config(&text, &config))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = configure_logging(args.quiet);

    let pattern = run(&args)?;
    match args.format {
        OutputFormat::Text => print_text_report(&pattern),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), &pattern)?;
            println!();
        }
    }
    Ok(())
}
