//! Pre-scan statistics: a cheap summary of a tree before committing to a
//! full scan with AI calls.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::bail;
use log::warn;
use serde::Serialize;
use walkdir::WalkDir;

use crate::lang::{self, Language};
use crate::scan::extract;
use crate::scan::methods;
use crate::scan::walker;

/// Aggregate counts over a source tree.
#[derive(Debug, Default, Serialize)]
pub struct ScanStats {
    /// Supported source files seen.
    pub files: usize,
    /// Total lines across those files.
    pub lines: usize,
    /// Method bodies that mention a CNPJ reference.
    pub methods: usize,
    /// Directories below the root, after skip rules.
    pub subdirs: usize,
    /// Files with at least one CNPJ reference, per language.
    pub by_language: BTreeMap<String, usize>,
}

/// Walk `root` once and gather counts. No AI backend is involved.
pub fn collect_stats(root: &Path) -> anyhow::Result<ScanStats> {
    if !root.is_dir() {
        bail!("directory not found: {}", root.display());
    }

    let mut stats = ScanStats::default();
    for language in Language::ALL {
        stats.by_language.insert(language.as_str().to_string(), 0);
    }

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(walker::keep_entry)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry: {}", err);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            if entry.depth() > 0 {
                stats.subdirs += 1;
            }
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = match lang::resolve_language(ext) {
            Some(language) => language,
            None => continue,
        };
        stats.files += 1;

        let content = match fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                warn!("failed to read {}: {}", path.display(), err);
                continue;
            }
        };
        stats.lines += content.lines().count();

        if lang::GENERIC_CNPJ.is_match(&content) {
            if let Some(count) = stats.by_language.get_mut(language.as_str()) {
                *count += 1;
            }
            stats.methods += count_cnpj_methods(language, &content);
        }
    }

    Ok(stats)
}

/// Count method bodies that mention the generic pattern. Brace languages
/// approximate a body as the span from one declaration to the next.
fn count_cnpj_methods(language: Language, content: &str) -> usize {
    let method = &lang::compiled(language).method;
    if language.uses_indentation() {
        let lines: Vec<&str> = content.split('\n').collect();
        method
            .find_iter(content)
            .filter(|m| {
                let line_idx = methods::line_at_offset(content, m.start()) - 1;
                let (body, _) = extract::indented_block(&lines, line_idx);
                lang::GENERIC_CNPJ.is_match(&body)
            })
            .count()
    } else {
        let starts: Vec<usize> = method.find_iter(content).map(|m| m.start()).collect();
        starts
            .iter()
            .enumerate()
            .filter(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(content.len());
                lang::GENERIC_CNPJ.is_match(&content[start..end])
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, content: &str) {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_counts_files_lines_and_subdirs() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.py", "x = 1\ny = 2\n");
        write(&dir, "src/deep/b.java", "int x;\n");
        write(&dir, "README.md", "ignored\n");

        let stats = collect_stats(dir.path()).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.subdirs, 2);
    }

    #[test]
    fn test_by_language_counts_files_with_references() {
        let dir = TempDir::new().unwrap();
        write(&dir, "fiscal.py", "def valida_cnpj(doc):\n    return doc\n");
        write(&dir, "plain.py", "def add(a, b):\n    return a + b\n");
        write(&dir, "schema.sql", "CREATE TABLE t (cnpj VARCHAR(14));\n");

        let stats = collect_stats(dir.path()).unwrap();
        assert_eq!(stats.by_language["python"], 1);
        assert_eq!(stats.by_language["sql"], 1);
        assert_eq!(stats.by_language["java"], 0);
    }

    #[test]
    fn test_methods_counts_cnpj_bodies_only() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "mix.py",
            "def valida_cnpj(doc):\n    return len(doc) == 14\n\ndef add(a, b):\n    return a + b\n",
        );

        let stats = collect_stats(dir.path()).unwrap();
        assert_eq!(stats.methods, 1);
    }

    #[test]
    fn test_brace_language_method_counting() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "Empresa.java",
            "public class Empresa {\n    public boolean validaCnpj(long cnpj) {\n        return cnpj % 97 == 2;\n    }\n\n    public String getNome() {\n        return nome;\n    }\n}\n",
        );

        let stats = collect_stats(dir.path()).unwrap();
        assert_eq!(stats.methods, 1);
        assert_eq!(stats.by_language["java"], 1);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(collect_stats(&missing).is_err());
    }
}
