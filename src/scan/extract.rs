//! Snippet extraction: find the method bodies (or failing that, the
//! surrounding context) where CNPJ values are actually handled.

use std::collections::HashSet;

use log::{debug, warn};

use crate::lang::{self, Language};
use crate::scan::deps;
use crate::scan::methods::{self, MethodRegistry};

/// Context window radius around a raw keyword hit, in bytes.
const CONTEXT_RADIUS: usize = 500;
/// At most this many context windows per file.
const CONTEXT_SECTIONS: usize = 3;
/// Context windows for brace languages only apply to files smaller than this.
const MAX_CONTEXT_FILE_LEN: usize = 5000;

/// A span of source queued for impact analysis.
#[derive(Debug, Clone)]
pub struct CandidateSnippet {
    pub file: String,
    pub language: Language,
    /// 1-based line where the span starts. Context windows report line 1.
    pub line: usize,
    pub method: String,
    pub text: String,
    /// Resolved call references, `name (file:line)` each. Empty for spans
    /// produced by a fallback path.
    pub dependencies: Vec<String>,
}

/// Result of scanning one file.
#[derive(Debug)]
pub struct FileScan {
    /// Whether the cheap keyword gate matched at all.
    pub keyword_found: bool,
    pub snippets: Vec<CandidateSnippet>,
}

impl FileScan {
    fn clean() -> Self {
        FileScan {
            keyword_found: false,
            snippets: Vec::new(),
        }
    }
}

/// Scan one file: gate on the keyword pattern, register its declared
/// methods, then extract candidate snippets. Files that fail the gate
/// contribute nothing to the registry.
pub fn scan_file(
    file: &str,
    language: Language,
    content: &str,
    registry: &mut MethodRegistry,
) -> FileScan {
    if !lang::compiled(language).keyword.is_match(content) {
        return FileScan::clean();
    }
    debug!("CNPJ reference found in {}", file);
    registry.collect_file(file, language, content);

    let mut snippets = if language.uses_indentation() {
        extract_indented(file, language, content, registry)
    } else {
        extract_targeted(file, language, content, registry)
    };
    if snippets.is_empty() {
        snippets = extract_fallback(file, language, content);
        if !snippets.is_empty() {
            debug!("method extraction missed in {}, using fallback", file);
        }
    }
    FileScan {
        keyword_found: true,
        snippets,
    }
}

/// Brace and statement languages: one composed regex per language finds
/// method bodies that mention the keyword. Overloads collapse onto a single
/// `file:name` key.
fn extract_targeted(
    file: &str,
    language: Language,
    content: &str,
    registry: &MethodRegistry,
) -> Vec<CandidateSnippet> {
    let pattern = lang::build_targeted_pattern(language);
    let regex = match lang::compile_scan_pattern(&pattern) {
        Ok(regex) => regex,
        Err(err) => {
            warn!("targeted pattern for {} failed to compile: {}", language, err);
            return Vec::new();
        }
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut snippets = Vec::new();
    for caps in regex.captures_iter(content) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let method = methods::first_identifier_group(&caps)
            .unwrap_or("unknown")
            .to_string();
        if !seen.insert(format!("{}:{}", file, method)) {
            continue;
        }
        let span = whole.as_str();
        snippets.push(CandidateSnippet {
            file: file.to_string(),
            language,
            line: methods::line_at_offset(content, whole.start()),
            method,
            text: span.to_string(),
            dependencies: deps::resolve_dependencies(span, registry),
        });
    }
    snippets
}

/// Indentation-delimited languages: walk line by line, take each declaration
/// plus its indented block, and keep blocks that mention the generic pattern.
fn extract_indented(
    file: &str,
    language: Language,
    content: &str,
    registry: &MethodRegistry,
) -> Vec<CandidateSnippet> {
    let profile = lang::compiled(language);
    let lines: Vec<&str> = content.split('\n').collect();
    let mut snippets = Vec::new();
    let mut idx = 0;
    while idx < lines.len() {
        let caps = match profile.method.captures(lines[idx]) {
            Some(caps) => caps,
            None => {
                idx += 1;
                continue;
            }
        };
        let method = methods::first_group(&caps).unwrap_or("unknown").to_string();
        let (body, next) = indented_block(&lines, idx);
        if lang::GENERIC_CNPJ.is_match(&body) {
            snippets.push(CandidateSnippet {
                file: file.to_string(),
                language,
                line: idx + 1,
                method,
                dependencies: deps::resolve_dependencies(&body, registry),
                text: body,
            });
        }
        idx = next;
    }
    snippets
}

/// Collect an indentation-delimited block: the declaration line at `start`
/// plus every following line that is blank or indented strictly deeper.
/// Returns the block text and the index of the first line after it.
pub fn indented_block(lines: &[&str], start: usize) -> (String, usize) {
    let indent = leading_whitespace(lines[start]);
    let mut end = start + 1;
    while end < lines.len() {
        let line = lines[end];
        if line.trim().is_empty() || leading_whitespace(line) > indent {
            end += 1;
        } else {
            break;
        }
    }
    (lines[start..end].join("\n"), end)
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Last resort when method-level extraction finds nothing: a looser literal
/// pattern for Java and C#, then raw context windows around keyword hits for
/// markup, SQL and small brace files. Fallback spans carry no dependencies.
fn extract_fallback(file: &str, language: Language, content: &str) -> Vec<CandidateSnippet> {
    if let Some(fallback) = &lang::compiled(language).fallback {
        let snippets: Vec<CandidateSnippet> = fallback
            .find_iter(content)
            .map(|m| CandidateSnippet {
                file: file.to_string(),
                language,
                line: methods::line_at_offset(content, m.start()),
                method: methods::extract_method_name(m.as_str(), language),
                text: m.as_str().to_string(),
                dependencies: Vec::new(),
            })
            .collect();
        if !snippets.is_empty() {
            return snippets;
        }
    }

    if !context_window_eligible(language, content.len()) {
        return Vec::new();
    }
    let mut sections: Vec<&str> = Vec::new();
    for m in lang::GENERIC_CNPJ.find_iter(content).take(CONTEXT_SECTIONS) {
        let start = floor_char_boundary(content, m.start().saturating_sub(CONTEXT_RADIUS));
        let end = ceil_char_boundary(content, (m.end() + CONTEXT_RADIUS).min(content.len()));
        sections.push(&content[start..end]);
    }
    if sections.is_empty() {
        return Vec::new();
    }
    let text = sections.join("\n\n[...]\n\n");
    vec![CandidateSnippet {
        file: file.to_string(),
        language,
        line: 1,
        method: methods::extract_method_name(&text, language),
        text,
        dependencies: Vec::new(),
    }]
}

fn context_window_eligible(language: Language, content_len: usize) -> bool {
    match language {
        Language::Html | Language::Sql => true,
        Language::JavaScript | Language::Python | Language::C | Language::Cpp => {
            content_len < MAX_CONTEXT_FILE_LEN
        }
        _ => false,
    }
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
