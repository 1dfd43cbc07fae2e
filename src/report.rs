//! Output formatting for scan results.
//!
//! Two formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::*;
use serde::{Deserialize, Serialize};

use crate::findings::Finding;
use crate::scan::session::ScanOutcome;
use crate::scan::stats::ScanStats;

/// JSON report envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub backend: String,
    pub files_scanned: usize,
    pub findings: Vec<Finding>,
    pub total_dev_hours: u32,
    pub total_test_hours: u32,
    pub total_hours: u32,
}

/// Assemble the report envelope from a finished scan.
pub fn build_report(path: &str, backend: &str, outcome: ScanOutcome) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        backend: backend.to_string(),
        files_scanned: outcome.files_scanned,
        total_dev_hours: outcome.total_dev_hours(),
        total_test_hours: outcome.total_test_hours(),
        total_hours: outcome.total_hours(),
        findings: outcome.findings,
    }
}

/// Print the report as pretty-printed JSON on stdout.
pub fn write_json(report: &JsonReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Write the report to a file as pretty-printed JSON.
pub fn save_report(report: &JsonReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json + "\n")
        .with_context(|| format!("failed to write report to {}", path.display()))
}

/// Timestamped default location for `--save`.
pub fn default_report_path() -> PathBuf {
    PathBuf::from(format!(
        "cnpj_impact_{}.json",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Human-readable report.
pub fn write_pretty(report: &JsonReport) {
    // Header
    println!();
    print!("  ");
    print!("{}", "cnpjcheck".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // Scan info
    print!("  {}", "Scanning: ".dimmed());
    println!("{}", report.path);
    print!("  {}", "Backend:  ".dimmed());
    println!("{}", report.backend);
    println!();

    write_result_summary(report);
    println!();

    if !report.findings.is_empty() {
        write_findings(&report.findings);
        write_severity_breakdown(&report.findings);
        println!();
    }
}

fn write_result_summary(report: &JsonReport) {
    if report.findings.is_empty() {
        print!("  {}", "✓ CLEAN".green());
        println!(
            "  {} files scanned, no CNPJ handling found",
            report.files_scanned
        );
        return;
    }

    print!("  {}", "✗ IMPACT".red());
    print!(
        "  {} findings across {} files",
        report.findings.len(),
        report.files_scanned
    );
    print!(
        "  Effort: {}h dev + {}h test = {}h",
        report.total_dev_hours, report.total_test_hours, report.total_hours
    );

    let failed = report.findings.iter().filter(|f| f.is_error()).count();
    if failed > 0 {
        print!("  {}", format!("({} failed analyses)", failed).dimmed());
    }
    println!();
}

fn write_findings(findings: &[Finding]) {
    println!("  {} ({}):", "Findings".bold(), findings.len());
    println!();

    for finding in findings {
        write_severity_tag(&finding.severity);
        print!("   ");
        print!("{}", format!("{:<9}", finding.usage_type).dimmed());
        print!("{}", finding.file.blue());
        if finding.line > 0 {
            print!("{}", format!(":{}", finding.line).dimmed());
        }
        println!();

        println!(
            "            {} {} ({}h dev + {}h test = {}h)",
            "method".dimmed(),
            finding.method,
            finding.dev_hours,
            finding.test_hours,
            finding.total_hours
        );
        write_block("operations", &finding.numeric_operations);
        write_block("impacts", &finding.impacts);
        write_block("risks", &finding.risks);
        write_block("modifications", &finding.modifications);
        write_block("dependencies", &finding.dependencies);
        write_block("impacted systems", &finding.impacted_systems);
        println!();
    }
}

fn write_severity_tag(severity: &str) {
    let tag = format!("{:<6}", severity);
    match severity {
        "HIGH" => print!("    {} ", tag.red()),
        "MEDIUM" => print!("    {} ", tag.yellow()),
        "LOW" => print!("    {} ", tag.green()),
        "N/A" => print!("    {} ", tag.dimmed()),
        _ => print!("    {} ", tag.normal()),
    }
}

fn write_block(label: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    println!("            {}", format!("{}:", label).dimmed());
    for line in text.lines() {
        println!("              - {}", line);
    }
}

fn write_severity_breakdown(findings: &[Finding]) {
    println!("  {}:", "By severity".bold());
    for tag in ["HIGH", "MEDIUM", "LOW", "N/A"] {
        let count = findings.iter().filter(|f| f.severity == tag).count();
        if count > 0 {
            println!("    {:<8} {}", tag, count);
        }
    }
}

/// Print statistics as pretty-printed JSON on stdout.
pub fn write_stats_json(stats: &ScanStats) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

/// Human-readable statistics.
pub fn write_stats_pretty(path: &str, stats: &ScanStats) {
    println!();
    print!("  ");
    print!("{}", "cnpjcheck".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Pre-scan: ".dimmed());
    println!("{}", path);
    println!();

    println!("  {:<22} {}", "Files".dimmed(), stats.files);
    println!("  {:<22} {}", "Lines".dimmed(), stats.lines);
    println!("  {:<22} {}", "Methods with CNPJ".dimmed(), stats.methods);
    println!("  {:<22} {}", "Subdirectories".dimmed(), stats.subdirs);
    println!();

    let touched: Vec<(&String, &usize)> =
        stats.by_language.iter().filter(|(_, &n)| n > 0).collect();
    if !touched.is_empty() {
        println!("  {}:", "Files with CNPJ references".bold());
        for (language, count) in touched {
            println!("    {:<12} {}", language, count);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_finding() -> Finding {
        Finding {
            file: "src/Empresa.java".to_string(),
            language: crate::lang::Language::Java,
            method: "validaCnpj".to_string(),
            line: 12,
            usage_type: "NUMERIC".to_string(),
            numeric_operations: "modulo".to_string(),
            impacts: "validation".to_string(),
            risks: "rejection".to_string(),
            modifications: "use string".to_string(),
            severity: "HIGH".to_string(),
            dev_hours: 8,
            test_hours: 4,
            total_hours: 12,
            dependencies: "No dependencies found".to_string(),
            impacted_systems: String::new(),
        }
    }

    fn sample_report() -> JsonReport {
        build_report(
            "demo",
            "anthropic",
            ScanOutcome {
                findings: vec![sample_finding()],
                files_scanned: 5,
            },
        )
    }

    #[test]
    fn test_build_report_totals() {
        let report = sample_report();
        assert_eq!(report.total_dev_hours, 8);
        assert_eq!(report.total_test_hours, 4);
        assert_eq!(report.total_hours, 12);
        assert_eq!(report.files_scanned, 5);
        assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_report_json_shape() {
        let report = sample_report();
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();

        for key in [
            "version",
            "path",
            "backend",
            "files_scanned",
            "findings",
            "total_dev_hours",
            "total_test_hours",
            "total_hours",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(value["findings"][0]["language"], "java");
        assert_eq!(value["findings"][0]["total_hours"], 12);
    }

    #[test]
    fn test_finding_json_carries_all_record_keys() {
        let value = serde_json::to_value(sample_finding()).unwrap();
        for key in [
            "file",
            "language",
            "method",
            "line",
            "usage_type",
            "numeric_operations",
            "impacts",
            "risks",
            "modifications",
            "severity",
            "dev_hours",
            "test_hours",
            "total_hours",
            "dependencies",
            "impacted_systems",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_default_report_path_is_timestamped() {
        let path = default_report_path();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("cnpj_impact_"));
        assert!(name.ends_with(".json"));
        assert!(name["cnpj_impact_".len()..]
            .chars()
            .take(8)
            .all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_save_report_writes_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        save_report(&sample_report(), &path).unwrap();

        let written: JsonReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.findings.len(), 1);
        assert_eq!(written.backend, "anthropic");
    }
}
