//! mapdiff CLI
//!
//! Command-line interface for comparing two JSON documents key by key
//! and reporting every mismatching path.

mod io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use mapdiff_core::prelude::*;
use mapdiff_core::{JsonReporter, LogSink};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mapdiff")]
#[command(about = "Structural comparison of two JSON documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Report layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Bordered plain-text section
    Text,
    /// Pretty-printed diff tree
    Json,
    /// Labeled blocks through the logger
    Log,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a source document against a target document
    Compare {
        /// Path to the source (expected) JSON document
        #[arg(short, long, env = "MAPDIFF_SOURCE")]
        source: PathBuf,

        /// Path to the target (actual) JSON document
        #[arg(short, long, env = "MAPDIFF_TARGET")]
        target: PathBuf,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Also list nested keys that carry no error
        #[arg(long)]
        all_keys: bool,
    },

    /// Generate a sample pair of documents
    Sample {
        /// Directory to save `source.json` and `target.json` in
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    debug!("mapdiff-core v{}", mapdiff_core::VERSION);

    match cli.command {
        Commands::Compare {
            source,
            target,
            output,
            format,
            all_keys,
        } => cmd_compare(&source, &target, output.as_deref(), format, all_keys),
        Commands::Sample { output } => {
            cmd_sample(&output)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_compare(
    source_path: &Path,
    target_path: &Path,
    output: Option<&Path>,
    format: Format,
    all_keys: bool,
) -> Result<ExitCode> {
    let source = io::load_document(source_path)?;
    let target = io::load_document(target_path)?;
    info!("Comparing {:?} against {:?}", source_path, target_path);

    let result = compare_maps(source.as_ref(), target.as_ref())
        .context("Failed to compare documents")?;

    match format {
        Format::Text => {
            let sink = io::open_output(output)?;
            WriterReporter::new(sink)
                .include_matching(all_keys)
                .generate_report(&result)?;
        }
        Format::Json => {
            let sink = io::open_output(output)?;
            JsonReporter::new(sink).generate_report(&result)?;
        }
        Format::Log => {
            if output.is_some() {
                warn!("--output is ignored with --format log");
            }
            TestReporter::new(LogSink::default()).generate_report(&result)?;
        }
    }

    if result.is_empty() {
        info!("Documents match");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("{} top-level keys mismatch", result.len());
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_sample(output_dir: &Path) -> Result<()> {
    info!("Generating sample documents...");

    let source = json!({
        "blockNumber": 1,
        "status": "0x1",
        "gasUsed": 21000,
        "logs": [],
        "counters": {"steps": 120, "keccakHashes": 3, "memAligns": 0},
        "input": "0xa9059cbb",
    });
    let target = json!({
        "blockNumber": 1,
        "status": "0x0",
        "gasUsed": 21000,
        "logs": [],
        "counters": {"steps": 120, "keccakHashes": 4, "binaries": 1},
        "error": "not enough keccak counters to continue the execution",
    });

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {:?}", output_dir))?;
    let source_path = output_dir.join("source.json");
    let target_path = output_dir.join("target.json");
    io::save_json(&source, &source_path)?;
    io::save_json(&target, &target_path)?;

    println!("Sample documents saved:");
    println!("  Source: {:?}", source_path);
    println!("  Target: {:?}", target_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_pair(source: serde_json::Value, target: serde_json::Value) -> (TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("source.json");
        let target_path = dir.path().join("target.json");
        io::save_json(&source, &source_path).unwrap();
        io::save_json(&target, &target_path).unwrap();
        (dir, source_path, target_path)
    }

    #[test]
    fn test_compare_equal_documents() {
        let doc = json!({"a": 1, "b": {"c": [1, 2]}});
        let (dir, source, target) = write_pair(doc.clone(), doc);
        let report = dir.path().join("report.txt");

        let code = cmd_compare(&source, &target, Some(&report), Format::Text, false).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(
            fs::read_to_string(&report).unwrap(),
            "-------------------------\nMISMATCHING KEYS\n-------------------------\n"
        );
    }

    #[test]
    fn test_compare_mismatch_fails_with_text_report() {
        let (dir, source, target) = write_pair(
            json!({"a": 1, "b": {"c": 2}}),
            json!({"a": 2, "b": {"c": 2}, "d": true}),
        );
        let report = dir.path().join("report.txt");

        let code = cmd_compare(&source, &target, Some(&report), Format::Text, false).unwrap();
        assert_eq!(code, ExitCode::FAILURE);

        let text = fs::read_to_string(&report).unwrap();
        assert!(text.contains("- key: a, error: value mismatch, expected: 1, found: 2"));
        assert!(text.contains("- key: d, error: this key doesn't exist"));
        assert!(!text.contains("key: b"));
    }

    #[test]
    fn test_all_keys_lists_clean_nested_keys() {
        let (dir, source, target) = write_pair(
            json!({"m": {"x": [1, 2]}}),
            json!({"m": {"x": [1, 3]}}),
        );
        let report = dir.path().join("report.txt");

        cmd_compare(&source, &target, Some(&report), Format::Text, true).unwrap();
        let text = fs::read_to_string(&report).unwrap();
        assert!(text.contains("- key: m, error: inner key mismatch"));
        assert!(text.contains("- key: m.x.1, error: value mismatch, expected: 2, found: 3"));
    }

    #[test]
    fn test_json_format_writes_diff_tree() {
        let (dir, source, target) = write_pair(json!({"a": "x"}), json!({}));
        let report = dir.path().join("report.json");

        let code = cmd_compare(&source, &target, Some(&report), Format::Json, false).unwrap();
        assert_eq!(code, ExitCode::FAILURE);

        let tree: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(tree["mismatching_keys"][0]["key"], "a");
        assert_eq!(
            tree["mismatching_keys"][0]["error"]["kind"],
            "this key is missing in the target map"
        );
    }

    #[test]
    fn test_log_format_still_sets_exit_code() {
        let (_dir, source, target) = write_pair(json!({"a": 1}), json!({"a": "1"}));
        let code = cmd_compare(&source, &target, None, Format::Log, false).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn test_one_sided_null_document_is_an_error() {
        let (_dir, source, target) = write_pair(json!(null), json!({"a": 1}));
        let err = cmd_compare(&source, &target, None, Format::Log, false).unwrap_err();
        assert!(format!("{err:#}").contains("source map is nil"));
    }

    #[test]
    fn test_sample_documents_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        cmd_sample(dir.path()).unwrap();
        let report = dir.path().join("report.txt");

        let code = cmd_compare(
            &dir.path().join("source.json"),
            &dir.path().join("target.json"),
            Some(&report),
            Format::Text,
            false,
        )
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert!(fs::read_to_string(&report)
            .unwrap()
            .contains("- key: status, error: value mismatch"));
    }
}
