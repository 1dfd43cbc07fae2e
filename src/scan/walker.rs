//! Source tree walking: enumerate supported files, honoring exclude globs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::warn;
use walkdir::WalkDir;

use crate::lang::{self, Language};

/// A file selected for scanning.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
}

/// Compile user-supplied exclude patterns. Patterns are matched against
/// paths relative to the scan root, so `**/migrations/**` works as expected.
pub fn build_exclude_set(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .with_context(|| format!("invalid exclude pattern '{}'", pattern))?;
        builder.add(glob);
    }
    builder.build().context("failed to build exclude set")
}

/// Directory filter shared by scanning and statistics.
pub(crate) fn keep_entry(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    // Skip hidden directories, but never the root itself
    if entry.file_type().is_dir() && name.starts_with('.') && entry.depth() > 0 {
        return false;
    }
    // Skip dependency and build output directories
    if entry.file_type().is_dir()
        && (name == "node_modules"
            || name == "vendor"
            || name == "target"
            || name == "bin"
            || name == "obj")
    {
        return false;
    }
    true
}

/// Enumerate supported source files under `root`.
pub fn collect_sources(root: &Path, exclude: &GlobSet) -> Vec<SourceFile> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(keep_entry)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = match lang::resolve_language(ext) {
            Some(language) => language,
            None => continue,
        };
        if !exclude.is_empty() {
            let relative = path.strip_prefix(root).unwrap_or(path);
            if exclude.is_match(relative) {
                continue;
            }
        }
        files.push(SourceFile {
            path: path.to_path_buf(),
            language,
        });
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "// cnpj\n").unwrap();
    }

    fn collected_names(root: &Path, excludes: &[String]) -> Vec<String> {
        let set = build_exclude_set(excludes).unwrap();
        let mut names: Vec<String> = collect_sources(root, &set)
            .into_iter()
            .map(|f| {
                f.path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_collects_supported_extensions_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Empresa.java");
        touch(dir.path(), "script.py");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "image.png");

        let names = collected_names(dir.path(), &[]);
        assert_eq!(names, vec!["Empresa.java", "script.py"]);
    }

    #[test]
    fn test_skips_hidden_and_dependency_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/app.js");
        touch(dir.path(), ".git/hooks/sample.js");
        touch(dir.path(), "node_modules/lib/index.js");
        touch(dir.path(), "vendor/dep/dep.go");
        touch(dir.path(), "target/debug/build.c");

        let names = collected_names(dir.path(), &[]);
        assert_eq!(names, vec!["src/app.js"]);
    }

    #[test]
    fn test_exclude_globs_match_relative_paths() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/main.py");
        touch(dir.path(), "migrations/0001_init.sql");
        touch(dir.path(), "legacy/old.java");

        let names = collected_names(
            dir.path(),
            &["migrations/**".to_string(), "**/*.java".to_string()],
        );
        assert_eq!(names, vec!["src/main.py"]);
    }

    #[test]
    fn test_invalid_exclude_pattern_is_an_error() {
        assert!(build_exclude_set(&["a{b".to_string()]).is_err());
    }

    #[test]
    fn test_language_resolution_on_collected_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "native/impl.h");

        let set = build_exclude_set(&[]).unwrap();
        let files = collect_sources(dir.path(), &set);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].language, Language::C);
    }
}
