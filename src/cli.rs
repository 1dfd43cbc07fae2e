//! Command-line interface for cnpjcheck.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::backend;
use crate::config::{BackendConfig, BackendOverrides};
use crate::report;
use crate::scan::stats;
use crate::scan::ScanSession;

/// Exit codes.
pub const EXIT_CLEAN: i32 = 0;
pub const EXIT_FINDINGS: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// CNPJ alphanumeric migration impact scanner.
///
/// Brazil's CNPJ registration numbers become alphanumeric in 2026, and
/// code that stores, validates, or masks them as plain numbers will
/// break. Cnpjcheck walks a polyglot source tree, extracts the method
/// bodies that touch CNPJ values, and asks an AI backend to classify
/// each one and estimate the migration effort.
#[derive(Parser)]
#[command(name = "cnpjcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a source tree and estimate CNPJ migration impact
    Scan(ScanArgs),
    /// Count CNPJ references in a source tree without calling a backend
    Stats(StatsArgs),
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Directory to scan
    pub path: PathBuf,

    /// AI backend to use: anthropic, ollama or mistral
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Model name override for backends that accept one
    #[arg(short, long)]
    pub model: Option<String>,

    /// Base URL override for the Ollama backend
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the JSON report to a timestamped file in the current directory
    #[arg(long)]
    pub save: bool,

    /// Glob pattern to exclude, relative to the scan root (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,
}

/// Arguments for the stats command.
#[derive(Parser)]
pub struct StatsArgs {
    /// Directory to summarize
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    // Reject a missing directory before touching backend credentials
    if !args.path.is_dir() {
        eprintln!("Error: directory not found: {}", args.path.display());
        return Ok(EXIT_ERROR);
    }

    // Resolve the backend from flags and environment
    let overrides = BackendOverrides {
        kind: args.backend.clone(),
        model: args.model.clone(),
        url: args.backend_url.clone(),
    };
    let config = match BackendConfig::from_env(&overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    let backend = backend::build_backend(&config)?;

    let outcome = ScanSession::new(&args.path, backend.as_ref())
        .exclude(args.exclude.clone())
        .show_progress(args.format == "pretty")
        .run()?;

    // Output results
    let scanned_path = args.path.to_string_lossy().into_owned();
    let report = report::build_report(&scanned_path, backend.name(), outcome);

    match args.format.as_str() {
        "json" => report::write_json(&report)?,
        _ => report::write_pretty(&report),
    }

    // Persist the JSON report if asked; the note goes to stderr so that
    // --format json stdout stays machine-readable
    if let Some(output) = &args.output {
        report::save_report(&report, output)?;
        eprintln!("Report written to {}", output.display());
    } else if args.save {
        let output = report::default_report_path();
        report::save_report(&report, &output)?;
        eprintln!("Report written to {}", output.display());
    }

    // Return appropriate exit code
    if report.findings.is_empty() {
        Ok(EXIT_CLEAN)
    } else {
        Ok(EXIT_FINDINGS)
    }
}

/// Run the stats command.
pub fn run_stats(args: &StatsArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    if !args.path.is_dir() {
        eprintln!("Error: directory not found: {}", args.path.display());
        return Ok(EXIT_ERROR);
    }

    let stats = stats::collect_stats(&args.path)?;

    match args.format.as_str() {
        "json" => report::write_stats_json(&stats)?,
        _ => report::write_stats_pretty(&args.path.to_string_lossy(), &stats),
    }

    Ok(EXIT_CLEAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_scan_rejects_unknown_format() {
        let args = ScanArgs {
            path: PathBuf::from("."),
            backend: None,
            model: None,
            backend_url: None,
            format: "xml".to_string(),
            output: None,
            save: false,
            exclude: vec![],
        };
        assert_eq!(run_scan(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_run_scan_rejects_missing_directory() {
        let args = ScanArgs {
            path: PathBuf::from("/nonexistent/cnpjcheck-test"),
            backend: None,
            model: None,
            backend_url: None,
            format: "pretty".to_string(),
            output: None,
            save: false,
            exclude: vec![],
        };
        assert_eq!(run_scan(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_run_stats_rejects_unknown_format() {
        let args = StatsArgs {
            path: PathBuf::from("."),
            format: "csv".to_string(),
        };
        assert_eq!(run_stats(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_cli_parses_scan_with_flags() {
        let cli = Cli::try_parse_from([
            "cnpjcheck",
            "scan",
            "src",
            "--backend",
            "ollama",
            "--format",
            "json",
            "--exclude",
            "vendor/**",
            "--exclude",
            "**/*.sql",
        ])
        .unwrap();
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.path, PathBuf::from("src"));
                assert_eq!(args.backend.as_deref(), Some("ollama"));
                assert_eq!(args.format, "json");
                assert_eq!(args.exclude, vec!["vendor/**", "**/*.sql"]);
            }
            _ => panic!("expected scan command"),
        }
    }

    #[test]
    fn test_cli_parses_stats_defaults() {
        let cli = Cli::try_parse_from(["cnpjcheck", "stats", "."]).unwrap();
        match cli.command {
            Commands::Stats(args) => {
                assert_eq!(args.path, PathBuf::from("."));
                assert_eq!(args.format, "pretty");
            }
            _ => panic!("expected stats command"),
        }
    }
}
