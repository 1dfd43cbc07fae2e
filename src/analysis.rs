//! Analysis orchestration: send snippets to the backend, validate the JSON
//! that comes back, and turn outcomes into findings.

use log::{error, info};
use serde::Deserialize;

use crate::backend::AiBackend;
use crate::findings::Finding;
use crate::scan::extract::CandidateSnippet;

/// Prompt sent for every snippet. The schema below doubles as the required
/// shape of the model's answer.
pub const PROMPT_TEMPLATE: &str = r#"Analyze this {language} code that handles CNPJ values, along with its dependencies:

{code}

Return ONLY valid JSON in the format below, with no additional text.
IMPORTANT:
- Identify calls to other methods and classes
- Consider integrations with other systems
- Follow cascading dependencies
- Consider impacts on APIs and services

{
    "usage_type": "NUMERIC|TEXT|MIXED",
    "numeric_operations": ["list", "of", "operations"],
    "impacts": ["list", "of", "impacts"],
    "risks": ["list", "of", "risks"],
    "modifications": ["list", "of", "modifications"],
    "severity": "HIGH|MEDIUM|LOW",
    "dev_hours": 0,
    "test_hours": 0,
    "dependencies": ["list", "of", "dependencies"],
    "impacted_systems": ["list", "of", "systems"]
}"#;

/// The model's answer, parsed. Estimation and classification fields are
/// mandatory; the two advisory lists may be omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct ImpactAnalysis {
    pub usage_type: String,
    pub numeric_operations: Vec<String>,
    pub impacts: Vec<String>,
    pub risks: Vec<String>,
    pub modifications: Vec<String>,
    pub severity: String,
    pub dev_hours: u32,
    pub test_hours: u32,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub impacted_systems: Vec<String>,
}

/// Terminal state of one snippet's analysis.
#[derive(Debug)]
pub enum SnippetOutcome {
    Parsed(ImpactAnalysis),
    Failed(String),
}

/// Send one snippet to the backend and validate the answer. Never panics
/// and never aborts the scan; failures become `Failed` outcomes.
pub fn analyze_snippet(backend: &dyn AiBackend, snippet: &CandidateSnippet) -> SnippetOutcome {
    info!(
        "analyzing {} code in {}:{}",
        snippet.language, snippet.file, snippet.line
    );
    let extra_context = if snippet.dependencies.is_empty() {
        String::new()
    } else {
        format!("\nDependencies found:\n{}", snippet.dependencies.join("\n"))
    };
    match backend.analyze(
        PROMPT_TEMPLATE,
        snippet.language,
        &snippet.text,
        &extra_context,
    ) {
        Ok(raw) => parse_response(&raw),
        Err(err) => SnippetOutcome::Failed(err.to_string()),
    }
}

/// Validate a raw model answer: pull out the first balanced JSON object and
/// deserialize it into the required schema.
pub fn parse_response(raw: &str) -> SnippetOutcome {
    if raw.trim().is_empty() {
        return SnippetOutcome::Failed("empty response from backend".to_string());
    }
    let region = match extract_json_region(raw) {
        Some(region) => region,
        None => return SnippetOutcome::Failed("no JSON object in response".to_string()),
    };
    match serde_json::from_str::<ImpactAnalysis>(region) {
        Ok(analysis) => SnippetOutcome::Parsed(analysis),
        Err(err) => SnippetOutcome::Failed(format!("invalid analysis payload: {}", err)),
    }
}

/// Turn an outcome into the finding that goes on the report.
pub fn finding_for(snippet: &CandidateSnippet, outcome: SnippetOutcome) -> Finding {
    match outcome {
        SnippetOutcome::Parsed(analysis) => Finding::from_analysis(snippet, analysis),
        SnippetOutcome::Failed(reason) => {
            error!(
                "analysis failed for {}:{}: {}",
                snippet.file, snippet.line, reason
            );
            Finding::error(snippet, &reason)
        }
    }
}

/// First balanced `{...}` region of `text`, if any. Models often wrap their
/// JSON in prose or code fences; this cuts through both.
pub fn extract_json_region(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (idx, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + idx + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
