//! Scan session: drives the walk, extraction and analysis phases for one
//! directory tree.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::bail;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use crate::analysis;
use crate::backend::AiBackend;
use crate::findings::Finding;
use crate::lang::Language;
use crate::scan::extract::{self, CandidateSnippet};
use crate::scan::methods::MethodRegistry;
use crate::scan::walker;

/// What a completed scan produced.
#[derive(Debug)]
pub struct ScanOutcome {
    pub findings: Vec<Finding>,
    pub files_scanned: usize,
}

impl ScanOutcome {
    pub fn total_dev_hours(&self) -> u32 {
        self.findings.iter().map(|f| f.dev_hours).sum()
    }

    pub fn total_test_hours(&self) -> u32 {
        self.findings.iter().map(|f| f.test_hours).sum()
    }

    pub fn total_hours(&self) -> u32 {
        self.findings.iter().map(|f| f.total_hours).sum()
    }
}

/// A configured scan over one directory.
pub struct ScanSession<'a> {
    root: PathBuf,
    backend: &'a dyn AiBackend,
    excludes: Vec<String>,
    show_progress: bool,
}

impl<'a> ScanSession<'a> {
    pub fn new<P: AsRef<Path>>(root: P, backend: &'a dyn AiBackend) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            backend,
            excludes: Vec::new(),
            show_progress: false,
        }
    }

    /// Add exclude globs, matched against paths relative to the root.
    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.excludes = patterns;
        self
    }

    /// Show a progress bar during the analysis phase.
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run the scan: walk, extract, then analyze every candidate snippet
    /// in file order. Files are processed strictly one at a time, so the
    /// findings of two identical runs line up.
    pub fn run(&self) -> anyhow::Result<ScanOutcome> {
        if !self.root.is_dir() {
            bail!("directory not found: {}", self.root.display());
        }

        let exclude_set = walker::build_exclude_set(&self.excludes)?;
        let sources = walker::collect_sources(&self.root, &exclude_set);
        info!(
            "scanning {} ({} source files)",
            self.root.display(),
            sources.len()
        );

        let mut registry = MethodRegistry::new();
        let mut snippets: Vec<CandidateSnippet> = Vec::new();
        let mut processed: HashMap<Language, usize> = HashMap::new();
        let mut matched: HashMap<Language, usize> = HashMap::new();
        let mut files_scanned = 0usize;

        for source in &sources {
            let content = match fs::read(&source.path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(err) => {
                    warn!("failed to read {}: {}", source.path.display(), err);
                    continue;
                }
            };
            files_scanned += 1;
            *processed.entry(source.language).or_insert(0) += 1;

            let file = source.path.to_string_lossy().into_owned();
            let scan = extract::scan_file(&file, source.language, &content, &mut registry);
            if scan.keyword_found {
                *matched.entry(source.language).or_insert(0) += 1;
            }
            snippets.extend(scan.snippets);
        }

        log_language_summary(&processed, &matched);
        info!("{} snippets queued for analysis", snippets.len());

        let bar = self.progress_bar(snippets.len());
        let mut findings = Vec::with_capacity(snippets.len());
        for snippet in &snippets {
            if let Some(bar) = &bar {
                bar.set_message(format!("{}:{}", snippet.file, snippet.line));
            }
            let outcome = analysis::analyze_snippet(self.backend, snippet);
            findings.push(analysis::finding_for(snippet, outcome));
            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }
        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }

        info!("scan finished with {} findings", findings.len());
        Ok(ScanOutcome {
            findings,
            files_scanned,
        })
    }

    fn progress_bar(&self, total: usize) -> Option<ProgressBar> {
        if !self.show_progress || total == 0 {
            return None;
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {pos}/{len}")
                .expect("invalid progress bar template")
                .progress_chars("=> "),
        );
        Some(bar)
    }
}

fn log_language_summary(
    processed: &HashMap<Language, usize>,
    matched: &HashMap<Language, usize>,
) {
    info!("processing statistics:");
    for language in Language::ALL {
        let total = processed.get(language).copied().unwrap_or(0);
        if total == 0 {
            continue;
        }
        let with_refs = matched.get(language).copied().unwrap_or(0);
        info!(
            "  {}: {} of {} files mention CNPJ",
            language, with_refs, total
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use std::fs;
    use tempfile::TempDir;

    struct CannedBackend {
        answer: String,
    }

    impl AiBackend for CannedBackend {
        fn analyze(
            &self,
            _template: &str,
            _language: Language,
            _code: &str,
            _extra_context: &str,
        ) -> Result<String, BackendError> {
            Ok(self.answer.clone())
        }

        fn name(&self) -> &'static str {
            "canned"
        }
    }

    fn valid_answer() -> String {
        r#"{"usage_type": "NUMERIC", "numeric_operations": [], "impacts": ["i"],
            "risks": ["r"], "modifications": ["m"], "severity": "LOW",
            "dev_hours": 2, "test_hours": 1}"#
            .to_string()
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let backend = CannedBackend {
            answer: valid_answer(),
        };
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        let err = ScanSession::new(&missing, &backend).run().unwrap_err();
        assert!(err.to_string().contains("directory not found"));
    }

    #[test]
    fn test_scan_produces_findings_and_counts() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("fiscal.py"),
            "def valida_cnpj(doc):\n    return len(doc) == 14\n",
        )
        .unwrap();
        fs::write(dir.path().join("plain.py"), "def add(a, b):\n    return a + b\n").unwrap();

        let backend = CannedBackend {
            answer: valid_answer(),
        };
        let outcome = ScanSession::new(dir.path(), &backend).run().unwrap();

        assert_eq!(outcome.files_scanned, 2);
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.total_hours(), 3);
        assert!(outcome.findings[0].file.ends_with("fiscal.py"));
    }

    #[test]
    fn test_excludes_remove_files_from_the_scan() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("fiscal.py"),
            "def valida_cnpj(doc):\n    return doc\n",
        )
        .unwrap();

        let backend = CannedBackend {
            answer: valid_answer(),
        };
        let outcome = ScanSession::new(dir.path(), &backend)
            .exclude(vec!["*.py".to_string()])
            .run()
            .unwrap();

        assert_eq!(outcome.files_scanned, 0);
        assert!(outcome.findings.is_empty());
    }
}
