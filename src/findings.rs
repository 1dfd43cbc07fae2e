//! Finding records: one per analyzed snippet, flattened for reporting.

use serde::{Deserialize, Serialize};

use crate::analysis::ImpactAnalysis;
use crate::lang::Language;
use crate::scan::extract::CandidateSnippet;

/// Rendered into the dependencies cell when the resolver found nothing.
pub const NO_DEPENDENCIES: &str = "No dependencies found";

/// Usage type recorded when analysis itself failed.
pub const USAGE_ERROR: &str = "ERROR";

/// Severity recorded when analysis itself failed.
pub const SEVERITY_NOT_AVAILABLE: &str = "N/A";

/// One snippet's impact record.
///
/// List-valued answers are stored newline-joined so every field is a flat
/// string or number; failed analyses still produce a record, keeping the
/// snippet's provenance, with `usage_type` set to `ERROR`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub file: String,
    pub language: Language,
    pub method: String,
    pub line: usize,
    pub usage_type: String,
    pub numeric_operations: String,
    pub impacts: String,
    pub risks: String,
    pub modifications: String,
    pub severity: String,
    pub dev_hours: u32,
    pub test_hours: u32,
    pub total_hours: u32,
    pub dependencies: String,
    pub impacted_systems: String,
}

impl Finding {
    /// Build a finding from a parsed analysis. `total_hours` is always the
    /// sum of the two estimates, never taken from the model.
    pub fn from_analysis(snippet: &CandidateSnippet, analysis: ImpactAnalysis) -> Self {
        Finding {
            file: snippet.file.clone(),
            language: snippet.language,
            method: snippet.method.clone(),
            line: snippet.line,
            usage_type: analysis.usage_type,
            numeric_operations: analysis.numeric_operations.join("\n"),
            impacts: analysis.impacts.join("\n"),
            risks: analysis.risks.join("\n"),
            modifications: analysis.modifications.join("\n"),
            severity: analysis.severity,
            dev_hours: analysis.dev_hours,
            test_hours: analysis.test_hours,
            total_hours: analysis.dev_hours + analysis.test_hours,
            dependencies: render_dependencies(&snippet.dependencies),
            impacted_systems: analysis.impacted_systems.join("\n"),
        }
    }

    /// Build the error record for a snippet whose analysis failed.
    pub fn error(snippet: &CandidateSnippet, reason: &str) -> Self {
        Finding {
            file: snippet.file.clone(),
            language: snippet.language,
            method: snippet.method.clone(),
            line: snippet.line,
            usage_type: USAGE_ERROR.to_string(),
            numeric_operations: format!("analysis failed: {}", reason),
            impacts: "analysis failed".to_string(),
            risks: "analysis failed".to_string(),
            modifications: "analysis failed".to_string(),
            severity: SEVERITY_NOT_AVAILABLE.to_string(),
            dev_hours: 0,
            test_hours: 0,
            total_hours: 0,
            dependencies: render_dependencies(&snippet.dependencies),
            impacted_systems: String::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.usage_type == USAGE_ERROR
    }
}

fn render_dependencies(dependencies: &[String]) -> String {
    if dependencies.is_empty() {
        NO_DEPENDENCIES.to_string()
    } else {
        dependencies.join("\n")
    }
}
